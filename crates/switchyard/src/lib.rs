//! # Switchyard
//!
//! Update routing for Bot API bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────────────────────────────────┐
//! │   Runtime    │────▶│ Dispatcher (root router)                    │
//! │ UpdateSource │     │  update.outer: UpdateContextMiddleware      │
//! └──────────────┘     │  message_created / bot_started / ... / error│
//!                      │   └─ Router "admin" ─ Router "moderation"   │
//!                      │   └─ Router "users"                         │
//!                      └─────────────────────────────────────────────┘
//! ```
//!
//! - **Runtime**: pulls updates from a source, bounds concurrency, shuts down gracefully
//! - **Dispatcher**: the root router; routes failures to error observers
//! - **Routers**: a tree searched depth-first, first match wins
//! - **Observers**: one per update kind per router, with filters and middlewares
//! - **Handlers**: async functions with extractor parameters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use switchyard::prelude::*;
//!
//! async fn start(event: Event<BotStarted>) -> String {
//!     format!("hi, {}", event.user.first_name)
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dp = Dispatcher::new();
//!     dp.bot_started().handler(start);
//!
//!     let runtime = Runtime::builder().build(dp)?;
//!     runtime.run_until_ctrl_c(source, Some(bot)).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: read `switchyard.toml` (default)
//! - `yaml-config`: read `switchyard.yaml`
//! - `json-log`: JSON log lines

pub use switchyard_core as core;
pub use switchyard_framework as framework;
pub use switchyard_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use switchyard::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use switchyard_runtime::{ChannelSource, RunStats, Runtime, UpdateSource};

    // Routing, filters, middlewares, extractors and update types
    pub use switchyard_framework::prelude::*;

    // Logging macros
    pub use switchyard_runtime::prelude::*;
}
