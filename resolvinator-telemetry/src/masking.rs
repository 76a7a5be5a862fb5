//! Sensitive data masking for logs.
//!
//! Masks auth tokens, secrets and passwords in log output so that
//! connection URLs and handshake headers can be logged safely.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// Patterns for detecting sensitive data.
static PATTERNS: LazyLock<Vec<SensitivePattern>> = LazyLock::new(|| {
    vec![
        // Credentials in a query string
        SensitivePattern {
            name: "query_token",
            regex: Regex::new(r"(?i)[?&](token|access_token|api_key)=([^&\s#]+)").unwrap(),
            group: 2,
        },
        // Bearer tokens
        SensitivePattern {
            name: "bearer_token",
            regex: Regex::new(r"(?i)bearer\s+([a-zA-Z0-9._~+/=-]{8,})").unwrap(),
            group: 1,
        },
        // JWT tokens
        SensitivePattern {
            name: "jwt",
            regex: Regex::new(r"eyJ[a-zA-Z0-9_-]*\.eyJ[a-zA-Z0-9_-]*\.[a-zA-Z0-9_-]*").unwrap(),
            group: 0,
        },
        // Named secrets in key/value or JSON form
        SensitivePattern {
            name: "secret",
            regex: Regex::new(
                r#"(?i)(token|secret|api[_-]?key)["\s:=]+["']?([a-zA-Z0-9._-]{8,})["']?"#,
            )
            .unwrap(),
            group: 2,
        },
        // Passwords
        SensitivePattern {
            name: "password",
            regex: Regex::new(r#"(?i)(password|passwd|pwd)["\s:=]+["']?([^\s"']{4,})["']?"#)
                .unwrap(),
            group: 2,
        },
    ]
});

struct SensitivePattern {
    name: &'static str,
    regex: Regex,
    group: usize,
}

/// Masks sensitive data in strings.
#[derive(Debug, Clone)]
pub struct SensitiveDataMasker {
    /// Minimum length of string to consider for masking
    min_length: usize,
    /// Characters to show at start of masked value
    show_start: usize,
    /// Characters to show at end of masked value
    show_end: usize,
    /// Mask character
    mask_char: char,
}

impl Default for SensitiveDataMasker {
    fn default() -> Self {
        Self::new()
    }
}

impl SensitiveDataMasker {
    /// Create a new masker with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_length: 8,
            show_start: 3,
            show_end: 3,
            mask_char: '*',
        }
    }

    /// Create a masker with custom settings.
    #[must_use]
    pub fn with_settings(min_length: usize, show_start: usize, show_end: usize) -> Self {
        Self {
            min_length: min_length.max(show_start + show_end + 1),
            show_start,
            show_end,
            mask_char: '*',
        }
    }

    /// Mask a known sensitive value.
    ///
    /// # Example
    ///
    /// ```
    /// use resolvinator_telemetry::masking::SensitiveDataMasker;
    ///
    /// let masker = SensitiveDataMasker::new();
    /// let masked = masker.mask_value("my_secret_token_12345");
    /// assert_eq!(masked, "my_***345");
    /// assert_eq!(masker.mask_value("short"), "*****");
    /// ```
    #[must_use]
    pub fn mask_value(&self, value: &str) -> String {
        let chars: Vec<char> = value.chars().collect();
        if chars.len() < self.min_length {
            return self.mask_char.to_string().repeat(chars.len().max(3));
        }

        let start: String = chars[..self.show_start].iter().collect();
        let end: String = chars[chars.len() - self.show_end..].iter().collect();
        format!("{start}{}{end}", self.mask_char.to_string().repeat(3))
    }

    /// Mask the value of query parameter `param` in `url`.
    ///
    /// Other parameters and the fragment are kept as they are.
    ///
    /// ```
    /// use resolvinator_telemetry::masking::SensitiveDataMasker;
    ///
    /// let masker = SensitiveDataMasker::new();
    /// let url = "wss://host/socket/websocket?token=abcdef123456&vsn=2.0.0";
    /// assert_eq!(
    ///     masker.mask_url_param(url, "token"),
    ///     "wss://host/socket/websocket?token=abc***456&vsn=2.0.0"
    /// );
    /// ```
    #[must_use]
    pub fn mask_url_param(&self, url: &str, param: &str) -> String {
        let Some((base, rest)) = url.split_once('?') else {
            return url.to_string();
        };
        let (query, fragment) = rest
            .split_once('#')
            .map_or((rest, None), |(query, fragment)| (query, Some(fragment)));

        let query = query
            .split('&')
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) if key == param => format!("{key}={}", self.mask_value(value)),
                _ => pair.to_string(),
            })
            .collect::<Vec<_>>()
            .join("&");

        match fragment {
            Some(fragment) => format!("{base}?{query}#{fragment}"),
            None => format!("{base}?{query}"),
        }
    }

    /// Mask sensitive data in a string using pattern detection.
    ///
    /// # Example
    ///
    /// ```
    /// use resolvinator_telemetry::masking::SensitiveDataMasker;
    ///
    /// let masker = SensitiveDataMasker::new();
    /// let input = "Authorization: Bearer abcdefghijklmnop";
    /// let masked = masker.mask_string(input);
    /// assert_eq!(masked, "Authorization: Bearer abc***nop");
    /// ```
    #[must_use]
    pub fn mask_string<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut result = Cow::Borrowed(input);

        for pattern in PATTERNS.iter() {
            if !pattern.regex.is_match(&result) {
                continue;
            }
            let masked = pattern
                .regex
                .replace_all(&result, |caps: &Captures<'_>| self.mask_capture(caps, pattern.group))
                .into_owned();
            result = Cow::Owned(masked);
        }

        result
    }

    fn mask_capture(&self, caps: &Captures<'_>, group: usize) -> String {
        let whole = &caps[0];
        let Some(secret) = caps.get(group) else {
            return whole.to_string();
        };
        let offset = caps.get(0).map_or(0, |m| m.start());
        let start = secret.start() - offset;
        let end = secret.end() - offset;
        format!(
            "{}{}{}",
            &whole[..start],
            self.mask_value(secret.as_str()),
            &whole[end..]
        )
    }

    /// Names of the patterns that match `input`.
    #[must_use]
    pub fn detect(&self, input: &str) -> Vec<&'static str> {
        PATTERNS
            .iter()
            .filter(|p| p.regex.is_match(input))
            .map(|p| p.name)
            .collect()
    }

    /// Check if a string contains sensitive patterns.
    #[must_use]
    pub fn contains_sensitive(&self, input: &str) -> bool {
        PATTERNS.iter().any(|p| p.regex.is_match(input))
    }
}
