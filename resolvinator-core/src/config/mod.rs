//! Configuration loading and validation.
//!
//! - YAML, TOML and JSON files, detected by extension
//! - Environment variable overrides through [`Configurable`]
//! - Field validation with dotted-path error messages through [`Validator`]
//!
//! # Example
//!
//! ```rust,ignore
//! use resolvinator_core::config::{ConfigFormat, ConfigLoader};
//!
//! let config: ChannelConfig = ConfigLoader::new()
//!     .with_env_prefix("RESOLVINATOR")
//!     .load_file("client.yaml")?;
//! ```

mod loader;
mod traits;
pub mod validation;

pub use loader::{ConfigFormat, ConfigLoader};
pub use traits::{Configurable, Validatable};
pub use validation::{EnvOverride, ValidationContext, ValidationResult, Validator};
