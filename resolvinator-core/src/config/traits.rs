//! Traits implemented by loadable configuration types.

use crate::error::ConfigError;

/// A configuration that can check its own consistency.
///
/// ```rust
/// use resolvinator_core::config::Validatable;
/// use resolvinator_core::error::ConfigError;
///
/// struct Limits {
///     max_frames: u32,
/// }
///
/// impl Validatable for Limits {
///     fn validate(&self) -> Result<(), ConfigError> {
///         if self.max_frames == 0 {
///             return Err(ConfigError::invalid_value("max_frames", "must be positive"));
///         }
///         Ok(())
///     }
/// }
///
/// assert!(Limits { max_frames: 0 }.validate().is_err());
/// ```
pub trait Validatable {
    /// Validates the configuration, returning the first problem found.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// A configuration whose fields can be overridden from the environment.
///
/// Variable names are `<PREFIX>_<FIELD>` in upper case, e.g.
/// `RESOLVINATOR_TOKEN`.
pub trait Configurable: Sized {
    /// Applies every override found in the environment.
    fn apply_env_overrides(&mut self, prefix: &str);

    /// Lists the variable names consulted by [`Configurable::apply_env_overrides`].
    fn env_var_names(prefix: &str) -> Vec<String>;
}
