//! Field-level validation helpers and environment overrides.

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::error::ConfigError;

/// Result type for validation operations.
pub type ValidationResult = Result<(), ConfigError>;

/// Collects validation errors and tracks the dotted path of the section
/// being validated, e.g. `connection.rate_limit`.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    path: Vec<String>,
    errors: Vec<ConfigError>,
}

impl ValidationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a nested section.
    pub fn enter(&mut self, section: impl Into<String>) {
        self.path.push(section.into());
    }

    /// Leaves the current section.
    pub fn exit(&mut self) {
        self.path.pop();
    }

    /// Returns the current section path.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.path.join(".")
    }

    /// Records an error.
    pub fn add_error(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Returns true if no error has been recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns every recorded error.
    #[must_use]
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Consumes the context, yielding the first error if any.
    pub fn into_result(self) -> ValidationResult {
        self.errors.into_iter().next().map_or(Ok(()), Err)
    }

    fn missing_field(&self, field: &str) -> ConfigError {
        ConfigError::MissingField {
            field: field.to_string(),
            section: (!self.path.is_empty()).then(|| self.current_path()),
        }
    }

    fn invalid_value(&self, field: &str, reason: impl Into<String>) -> ConfigError {
        let field = if self.path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{field}", self.current_path())
        };
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Fluent field checks writing into a [`ValidationContext`].
///
/// ```
/// use resolvinator_core::config::{ValidationContext, Validator};
///
/// let mut ctx = ValidationContext::new();
/// ctx.enter("connection");
/// Validator::new(&mut ctx)
///     .require_non_empty("token", "")
///     .positive("reconnect_interval_ms", &5_000u64);
/// let err = ctx.into_result().unwrap_err();
/// assert!(err.to_string().contains("token"));
/// ```
#[derive(Debug)]
pub struct Validator<'a> {
    ctx: &'a mut ValidationContext,
}

impl<'a> Validator<'a> {
    /// Creates a validator writing into `ctx`.
    pub fn new(ctx: &'a mut ValidationContext) -> Self {
        Self { ctx }
    }

    /// The string must not be empty or whitespace.
    pub fn require_non_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            let error = self.ctx.missing_field(field);
            self.ctx.add_error(error);
        }
        self
    }

    /// The value must lie within `min..=max`.
    pub fn in_range<T: PartialOrd + Display>(
        &mut self,
        field: &str,
        value: &T,
        min: &T,
        max: &T,
    ) -> &mut Self {
        if value < min || value > max {
            let error = self
                .ctx
                .invalid_value(field, format!("Value {value} must be between {min} and {max}"));
            self.ctx.add_error(error);
        }
        self
    }

    /// The value must be greater than its type's default (zero).
    pub fn positive<T: PartialOrd + Default + Display>(
        &mut self,
        field: &str,
        value: &T,
    ) -> &mut Self {
        if *value <= T::default() {
            let error = self
                .ctx
                .invalid_value(field, format!("Value {value} must be positive"));
            self.ctx.add_error(error);
        }
        self
    }

    /// The predicate must hold.
    pub fn custom<F>(&mut self, field: &str, predicate: F, error_msg: &str) -> &mut Self
    where
        F: FnOnce() -> bool,
    {
        if !predicate() {
            let error = self.ctx.invalid_value(field, error_msg);
            self.ctx.add_error(error);
        }
        self
    }

    /// The value must be a host, optionally prefixed by `ws://` or `wss://`.
    pub fn websocket_url(&mut self, field: &str, value: &str) -> &mut Self {
        let has_other_scheme = value.contains("://")
            && !value.starts_with("ws://")
            && !value.starts_with("wss://");
        if has_other_scheme {
            let error = self
                .ctx
                .invalid_value(field, "Must be a host or a ws:// or wss:// URL");
            self.ctx.add_error(error);
        }
        self
    }

    /// Returns the first error recorded so far.
    pub fn result(&self) -> ValidationResult {
        self.ctx.errors().first().cloned().map_or(Ok(()), Err)
    }
}

/// Reads overrides from environment variables.
pub struct EnvOverride;

impl EnvOverride {
    /// Replaces `target` if `var_name` is set.
    pub fn apply_string(var_name: &str, target: &mut String) {
        if let Ok(value) = std::env::var(var_name) {
            *target = value;
        }
    }

    /// Replaces `target` if `var_name` is set and parses.
    pub fn apply_number<T: std::str::FromStr>(var_name: &str, target: &mut T) {
        if let Ok(value) = std::env::var(var_name)
            && let Ok(parsed) = value.parse()
        {
            *target = parsed;
        }
    }

    /// Merges `KEY1=VALUE1,KEY2=VALUE2` from `var_name` into `target`.
    pub fn apply_map(var_name: &str, target: &mut BTreeMap<String, String>) {
        if let Ok(value) = std::env::var(var_name) {
            target.extend(parse_pairs(&value));
        }
    }
}

fn parse_pairs(value: &str) -> impl Iterator<Item = (String, String)> + '_ {
    value.split(',').filter_map(|pair| {
        pair.split_once('=')
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_path() {
        let mut ctx = ValidationContext::new();
        ctx.enter("connection");
        ctx.enter("rate_limit");
        assert_eq!(ctx.current_path(), "connection.rate_limit");
        ctx.exit();
        assert_eq!(ctx.current_path(), "connection");
    }

    #[test]
    fn test_missing_field_carries_section() {
        let mut ctx = ValidationContext::new();
        ctx.enter("connection");
        Validator::new(&mut ctx).require_non_empty("token", "  ");
        assert_eq!(
            ctx.into_result(),
            Err(ConfigError::MissingField {
                field: "token".to_string(),
                section: Some("connection".to_string()),
            })
        );
    }

    #[test]
    fn test_in_range_and_positive() {
        let mut ctx = ValidationContext::new();
        let mut validator = Validator::new(&mut ctx);
        validator
            .in_range("max_reconnect_attempts", &5u32, &1, &100)
            .positive("rate_limit_max", &100u32);
        assert!(validator.result().is_ok());

        validator.positive("rate_limit_window_ms", &0u64);
        let err = validator.result().unwrap_err();
        assert!(err.to_string().contains("rate_limit_window_ms"));
    }

    #[test]
    fn test_websocket_url() {
        let mut ctx = ValidationContext::new();
        Validator::new(&mut ctx)
            .websocket_url("base_url", "example.com")
            .websocket_url("base_url", "ws://localhost:4000")
            .websocket_url("base_url", "wss://example.com");
        assert!(ctx.is_valid());

        Validator::new(&mut ctx).websocket_url("base_url", "https://example.com");
        assert_eq!(ctx.errors().len(), 1);
    }

    #[test]
    fn test_parse_pairs() {
        let pairs: Vec<_> = parse_pairs("X-Team = blue, broken ,X-Env=prod").collect();
        assert_eq!(
            pairs,
            vec![
                ("X-Team".to_string(), "blue".to_string()),
                ("X-Env".to_string(), "prod".to_string()),
            ]
        );
    }

    #[test]
    fn test_unset_variable_leaves_target() {
        let mut value = "default".to_string();
        EnvOverride::apply_string("RESOLVINATOR_TEST_UNSET_VARIABLE_7731", &mut value);
        assert_eq!(value, "default");
    }
}
