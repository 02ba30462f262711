//! Configuration for the Switchyard runtime.
//!
//! Settings are layered with figment (see [`ConfigLoader`]) and validated
//! with [`validate_config`] before use.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DispatchConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    SpanEventConfig, SwitchyardConfig,
};
pub use validation::validate_config;
