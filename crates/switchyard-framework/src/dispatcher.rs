//! The root of a router tree.
//!
//! A [`Dispatcher`] is a [`Router`] with two extra duties:
//!
//! - it installs an [`UpdateContextMiddleware`] as its update-level outer
//!   middleware, so every handler can see who sent the update and where;
//! - it routes failures. When a handler, filter or middleware returns an
//!   error, the dispatcher stores an [`ErrorEvent`] in the context and
//!   triggers the tree's error observers with the original update, using
//!   the same depth-first, first-match-wins search as for updates.
//!
//! ```rust,ignore
//! let dp = Dispatcher::new();
//! dp.include(&users)?;
//!
//! dp.error()
//!     .with(ExceptionTypeFilter::<InvalidAge>::new())
//!     .handler(|err: ErrorEvent| async move { warn!(error = %err.error, "bad input") });
//!
//! match dp.feed_update(update, Some(bot)).await {
//!     Ok(outcome) if outcome.is_unhandled() => debug!("nobody wanted it"),
//!     Ok(_) => {}
//!     Err(e) => error!(error = %e, "update failed"),
//! }
//! ```

use std::error::Error as StdError;
use std::ops::Deref;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use tower::Service;
use tracing::{Instrument, Level, debug, span};

use switchyard_core::{BoxedBot, Update};

use crate::context::Context;
use crate::error::{BoxError, DispatchError, SharedError};
use crate::handler::BoxFuture;
use crate::middlewares::UpdateContextMiddleware;
use crate::observer::Slot;
use crate::outcome::Outcome;
use crate::router::{Router, RouterNode};

/// The error being routed, available to error observers.
///
/// Extract it as a handler parameter or read it from the context inside
/// error filters and middlewares.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    /// The update whose processing failed.
    pub update: Arc<Update>,
    /// The error that was raised.
    pub error: SharedError,
}

impl ErrorEvent {
    /// Attempts to view the error as a concrete type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref::<E>()
    }
}

/// The root router.
///
/// Dereferences to [`Router`], so observers and `include` are used directly
/// on the dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    router: Router,
}

impl Dispatcher {
    /// Creates a dispatcher with a non-enriching [`UpdateContextMiddleware`].
    pub fn new() -> Self {
        Self::with_update_context(UpdateContextMiddleware::default())
    }

    /// Creates a dispatcher with the given update context resolver.
    pub fn with_update_context(resolver: UpdateContextMiddleware) -> Self {
        let dispatcher = Self::bare();
        dispatcher.router.update().outer_middleware(resolver);
        dispatcher
    }

    /// Creates a dispatcher without an update context resolver.
    pub fn bare() -> Self {
        Self {
            router: Router::new("dispatcher"),
        }
    }

    /// Returns the underlying root router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Routes the update in `ctx`, then routes any error through the error
    /// observers.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::MissingUpdate`] if `ctx` has no update
    /// - [`DispatchError::Unhandled`] if processing failed and no error
    ///   handler took the error
    /// - [`DispatchError::ErrorHandler`] if error routing itself failed
    pub async fn trigger(&self, ctx: &Context) -> Result<Outcome, DispatchError> {
        let update = ctx.update().ok_or(DispatchError::MissingUpdate)?;
        let node = self.router.compiled();
        let span = span!(Level::DEBUG, "dispatch", kind = %update.kind());

        async move {
            match node.trigger(Arc::clone(&update), ctx).await {
                Ok(outcome) => Ok(outcome),
                Err(err) => route_error(node, update, ctx, err).await,
            }
        }
        .instrument(span)
        .await
    }

    /// Builds a context for `update` and `bot`, then [`trigger`](Self::trigger)s it.
    pub async fn feed_update(
        &self,
        update: Update,
        bot: Option<BoxedBot>,
    ) -> Result<Outcome, DispatchError> {
        let mut ctx = Context::new(update);
        if let Some(bot) = bot {
            ctx = ctx.with_bot(bot);
        }
        self.trigger(&ctx).await
    }
}

async fn route_error(
    node: Arc<RouterNode>,
    update: Arc<Update>,
    ctx: &Context,
    err: BoxError,
) -> Result<Outcome, DispatchError> {
    let error: SharedError = Arc::from(err);
    debug!(error = %error, "routing error to error observers");

    ctx.insert(ErrorEvent {
        update: Arc::clone(&update),
        error: Arc::clone(&error),
    });

    match node.propagate(Slot::Error, update, ctx).await {
        Ok(outcome) if outcome.is_handled() => Ok(outcome),
        Ok(_) => Err(DispatchError::Unhandled(error)),
        Err(handler_err) => Err(DispatchError::ErrorHandler(handler_err)),
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Dispatcher {
    type Target = Router;

    fn deref(&self) -> &Router {
        &self.router
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .finish()
    }
}

/// `Dispatcher` as a `tower::Service`, so it can be wrapped in tower layers.
///
/// ```rust,ignore
/// use tower::{ServiceBuilder, timeout::TimeoutLayer};
///
/// let service = ServiceBuilder::new()
///     .layer(TimeoutLayer::new(Duration::from_secs(5)))
///     .service(dispatcher);
/// ```
impl Service<Context> for Dispatcher {
    type Response = Outcome;
    type Error = DispatchError;
    type Future = BoxFuture<'static, Result<Outcome, DispatchError>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Context) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { dispatcher.trigger(&ctx).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::extractor::Event;
    use crate::filters::{ExceptionMessageFilter, ExceptionTypeFilter};
    use crate::middleware::middleware_fn;
    use crate::middlewares::UpdateContext;
    use serde_json::json;
    use switchyard_core::{BotStarted, ChatType, MessageCreated, User};
    use tower::ServiceExt;

    #[derive(Debug, thiserror::Error)]
    #[error("invalid age: {0}")]
    struct InvalidAge(i64);

    fn started() -> Update {
        Update::from(BotStarted {
            chat_id: 42,
            user: User::new(7, "Ann"),
            payload: None,
            user_locale: None,
            timestamp: 0,
        })
    }

    fn failing_dispatcher() -> Dispatcher {
        let dp = Dispatcher::new();
        dp.bot_started()
            .handler(|| async { Err::<(), _>(InvalidAge(-1)) });
        dp
    }

    #[tokio::test]
    async fn test_error_goes_to_matching_exception_handler() {
        let dp = failing_dispatcher();
        dp.error()
            .with(ExceptionTypeFilter::<InvalidAge>::new())
            .handler(|event: ErrorEvent| async move {
                let age = event.downcast_ref::<InvalidAge>().map(|e| e.0);
                format!("age {age:?}")
            });
        dp.error().handler(|| async { "catch-all" });

        let outcome = dp.feed_update(started(), None).await.unwrap();
        assert_eq!(outcome, Outcome::Handled(json!("age Some(-1)")));
    }

    #[tokio::test]
    async fn test_catch_all_takes_other_errors() {
        let dp = failing_dispatcher();
        dp.error()
            .with(ExceptionTypeFilter::<ExtractError>::new())
            .handler(|| async { "extract" });
        dp.error().handler(|| async { "catch-all" });

        let outcome = dp.feed_update(started(), None).await.unwrap();
        assert_eq!(outcome, Outcome::Handled(json!("catch-all")));
    }

    #[tokio::test]
    async fn test_unhandled_error_is_returned() {
        let dp = failing_dispatcher();
        dp.error()
            .with(ExceptionMessageFilter::new("timeout"))
            .handler(|| async { "timeout" });

        let err = dp.feed_update(started(), None).await.unwrap_err();
        assert!(matches!(err, DispatchError::Unhandled(_)));
        assert_eq!(err.downcast_ref::<InvalidAge>().map(|e| e.0), Some(-1));
    }

    #[tokio::test]
    async fn test_failing_error_handler() {
        let dp = failing_dispatcher();
        dp.error()
            .handler(|| async { Err::<(), _>(ExtractError::custom("still broken")) });

        let err = dp.feed_update(started(), None).await.unwrap_err();
        assert!(matches!(err, DispatchError::ErrorHandler(_)));
        assert_eq!(err.downcast_ref::<ExtractError>().map(|e| e.to_string()), Some("still broken".into()));
    }

    #[tokio::test]
    async fn test_extraction_failure_is_routed() {
        let dp = Dispatcher::new();
        dp.bot_started()
            .handler(|_bot: BoxedBot| async { "unreachable" });
        dp.error()
            .with(ExceptionTypeFilter::<ExtractError>::new())
            .handler(|event: ErrorEvent| async move { event.error.to_string() });

        let outcome = dp.feed_update(started(), None).await.unwrap();
        assert_eq!(outcome, Outcome::Handled(json!("context has no bot")));
    }

    #[tokio::test]
    async fn test_error_handler_sees_original_update() {
        let dp = failing_dispatcher();
        dp.error()
            .handler(|event: Event<BotStarted>| async move { event.chat_id });

        let outcome = dp.feed_update(started(), None).await.unwrap();
        assert_eq!(outcome, Outcome::Handled(json!(42)));
    }

    #[tokio::test]
    async fn test_child_error_observer_with_inherited_middleware() {
        let dp = failing_dispatcher();
        let errors = Router::new("errors");
        dp.include(&errors).unwrap();

        let seen: Arc<parking_lot::Mutex<Vec<&'static str>>> = Arc::default();
        let log = Arc::clone(&seen);
        dp.error().outer_middleware(middleware_fn(move |ctx, next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push("error_outer");
                next.run(&ctx).await
            }
        }));
        errors.error().handler(|| async { "child" });

        let outcome = dp.feed_update(started(), None).await.unwrap();
        assert_eq!(outcome, Outcome::Handled(json!("child")));
        // once on the dispatcher's own observer, once inherited by the child
        assert_eq!(*seen.lock(), ["error_outer", "error_outer"]);
    }

    #[tokio::test]
    async fn test_update_context_is_resolved() {
        let dp = Dispatcher::new();
        dp.bot_started()
            .handler(|uc: UpdateContext| async move { json!([uc.chat_id, uc.user_id]) });

        let outcome = dp.feed_update(started(), None).await.unwrap();
        assert_eq!(outcome, Outcome::Handled(json!([42, 7])));
    }

    #[tokio::test]
    async fn test_bare_dispatcher_has_no_update_context() {
        let dp = Dispatcher::bare();
        dp.bot_started()
            .handler(|uc: Option<UpdateContext>| async move { uc.is_some() });

        let outcome = dp.feed_update(started(), None).await.unwrap();
        assert_eq!(outcome, Outcome::Handled(json!(false)));
    }

    #[tokio::test]
    async fn test_unmatched_update_is_unhandled() {
        let dp = Dispatcher::new();
        dp.message_created()
            .handler(|_: Event<MessageCreated>| async {});

        let outcome = dp.feed_update(started(), None).await.unwrap();
        assert!(outcome.is_unhandled());
    }

    #[tokio::test]
    async fn test_missing_update() {
        let dp = Dispatcher::new();
        let err = dp.trigger(&Context::empty()).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingUpdate));
    }

    #[tokio::test]
    async fn test_as_tower_service() {
        let dp = Dispatcher::new();
        dp.bot_started()
            .handler(|uc: UpdateContext| async move { uc.r#type == Some(ChatType::Dialog) });

        let outcome = dp.clone().oneshot(Context::new(started())).await.unwrap();
        // no bot, no enrichment, so the type stays unknown
        assert_eq!(outcome, Outcome::Handled(json!(false)));
    }
}
