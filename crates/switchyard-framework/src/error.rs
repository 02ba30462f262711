//! Error types for the Switchyard framework.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

pub use tower::BoxError;

/// An error shared between the error observer and the caller.
///
/// Errors raised during routing are moved into an [`Arc`] once error
/// routing starts so the [`ErrorEvent`](crate::ErrorEvent) handed to error
/// handlers and the [`DispatchError`] returned to the caller point at the
/// same value.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Errors that can occur during context extraction.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The context carries no update.
    #[error("context has no update")]
    MissingUpdate,

    /// The context carries no bot.
    #[error("context has no bot")]
    MissingBot,

    /// The update is of a different kind than the handler expects.
    #[error("update kind mismatch: expected '{expected}', got '{got}'")]
    UpdateKindMismatch {
        /// Expected kind name.
        expected: &'static str,
        /// Actual kind name.
        got: &'static str,
    },

    /// The bot type does not match the expected type.
    #[error("bot type mismatch: expected '{expected}'")]
    BotTypeMismatch {
        /// Expected bot type name.
        expected: &'static str,
    },

    /// No value of the requested type was inserted into the context.
    #[error("no '{0}' in context")]
    MissingValue(&'static str),

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Structural errors raised while assembling the router tree.
///
/// These only occur during setup; once a tree has dispatched its first
/// update it can no longer change shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Attaching the router would close a loop in the tree.
    ///
    /// `path` lists the routers on the loop starting from the router being
    /// included, each including the next, the last one attempting to
    /// include the first.
    #[error("Cycle routers detected.\n{}", render_cycle(.path))]
    Cycle { path: Vec<String> },

    /// The router is already a child of another router.
    #[error("router '{router}' is already included in '{parent}'")]
    AlreadyAttached { router: String, parent: String },

    /// The router tree has started dispatching and can no longer change.
    #[error("router '{router}' is frozen: the tree has already dispatched updates")]
    Frozen { router: String },
}

fn render_cycle(path: &[String]) -> String {
    if let [single] = path {
        return format!("⥁ {single}");
    }

    let mut out = String::from("╭─>─╮\n");
    for (i, name) in path.iter().enumerate() {
        if i > 0 {
            out.push_str("│   ▼\n");
        }
        out.push_str("│ ");
        out.push_str(name);
        out.push('\n');
    }
    out.push_str("╰─<─╯");
    out
}

/// Errors returned by [`Dispatcher::trigger`](crate::Dispatcher::trigger).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The context carries no update.
    #[error("context has no update")]
    MissingUpdate,

    /// A handler, filter or middleware failed and no error handler took it.
    #[error("unhandled error while processing update: {0}")]
    Unhandled(SharedError),

    /// An error handler itself failed.
    #[error("error handler failed: {0}")]
    ErrorHandler(BoxError),
}

impl DispatchError {
    /// Returns the original routing error, if this is [`DispatchError::Unhandled`].
    pub fn unhandled(&self) -> Option<&SharedError> {
        match self {
            Self::Unhandled(err) => Some(err),
            _ => None,
        }
    }

    /// Attempts to view the underlying error as a concrete type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Unhandled(err) => err.downcast_ref::<E>(),
            Self::ErrorHandler(err) => err.downcast_ref::<E>(),
            Self::MissingUpdate => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_renders_self_inclusion() {
        let err = RoutingError::Cycle {
            path: vec!["main".into()],
        };
        assert_eq!(err.to_string(), "Cycle routers detected.\n⥁ main");
    }

    #[test]
    fn test_cycle_renders_loop() {
        let err = RoutingError::Cycle {
            path: vec!["a".into(), "b".into(), "c".into()],
        };
        assert_eq!(
            err.to_string(),
            "Cycle routers detected.\n╭─>─╮\n│ a\n│   ▼\n│ b\n│   ▼\n│ c\n╰─<─╯"
        );
    }

    #[test]
    fn test_dispatch_error_downcast() {
        let inner: SharedError = Arc::new(ExtractError::MissingBot);
        let err = DispatchError::Unhandled(inner);
        assert!(matches!(
            err.downcast_ref::<ExtractError>(),
            Some(ExtractError::MissingBot)
        ));
        assert!(DispatchError::MissingUpdate.downcast_ref::<ExtractError>().is_none());
    }
}
