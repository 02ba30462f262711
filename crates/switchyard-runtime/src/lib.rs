//! Switchyard Runtime - the loop that feeds updates to a dispatcher.
//!
//! This crate provides:
//! - Layered configuration (`ConfigLoader`, `SwitchyardConfig`)
//! - Logging setup from that configuration (`LoggingBuilder`)
//! - Update ingestion through the `UpdateSource` trait
//! - The bounded-concurrency update loop (`Runtime`)
//!
//! ```ignore
//! use switchyard_framework::Dispatcher;
//! use switchyard_runtime::{ChannelSource, Runtime};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dp = Dispatcher::new();
//!     dp.bot_started().handler(|| async { "welcome" });
//!
//!     // Loads switchyard.toml from the current directory and installs logging
//!     let runtime = Runtime::builder().build(dp)?;
//!
//!     let (tx, source) = ChannelSource::channel(128);
//!     spawn_receiver(tx);
//!
//!     // Run until Ctrl+C
//!     runtime.run_until_ctrl_c(source, Some(bot)).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod source;

// Re-exports
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, DispatchConfig, LoggingConfig, SwitchyardConfig,
};
pub use error::{LoggingError, RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{RunStats, Runtime, RuntimeBuilder};
pub use source::{ChannelSource, UpdateSource};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros and `Level`.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
