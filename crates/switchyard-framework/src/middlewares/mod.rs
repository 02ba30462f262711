//! Built-in middlewares.

mod update_context;

pub use update_context::{UpdateContext, UpdateContextMiddleware};
