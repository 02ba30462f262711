//! Middleware chains.
//!
//! A [`Middleware`] wraps the rest of the chain. It receives the update, the
//! shared [`Context`] and a [`Next`] continuation, and decides what to do:
//!
//! - run code, then call [`Next::run`] and return its result
//! - post-process the result of `next` before returning it
//! - return without calling `next`, which silently ends processing
//! - return an error, which aborts the update and goes to error routing
//!
//! Each observer has two chains. **Outer** middlewares run for every update
//! that reaches the observer, before its filters are evaluated. **Inner**
//! middlewares run only once a handler matched, immediately around it.
//! Chains run in registration order on the way in and in reverse on the way
//! out:
//!
//! ```text
//! outer1 → outer2 → [filters] → inner1 → inner2 → handler
//! outer1 ← outer2 ←─────────── inner1 ← inner2 ←──┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard_framework::{Context, HandlerResult, Middleware, Next};
//!
//! struct Timing;
//!
//! #[async_trait]
//! impl Middleware for Timing {
//!     async fn call(&self, update: &Update, ctx: &Context, next: Next) -> HandlerResult {
//!         let start = Instant::now();
//!         let result = next.run(ctx).await;
//!         debug!(kind = %update.kind(), elapsed = ?start.elapsed(), "update processed");
//!         result
//!     }
//! }
//!
//! router.message_created().outer_middleware(Timing);
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use switchyard_core::Update;

use crate::context::Context;
use crate::handler::{BoxFuture, BoxedHandler};
use crate::observer::Slot;
use crate::outcome::HandlerResult;
use crate::router::RouterNode;

/// A link in a middleware chain.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Processes the update, usually by calling `next.run(ctx)`.
    async fn call(&self, update: &Update, ctx: &Context, next: Next) -> HandlerResult;
}

/// A type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

#[async_trait]
impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    async fn call(&self, update: &Update, ctx: &Context, next: Next) -> HandlerResult {
        (**self).call(update, ctx, next).await
    }
}

// ============================================================================
// Next
// ============================================================================

/// The remainder of a middleware chain.
///
/// Consumed by [`Next::run`], so a middleware can invoke the rest of the
/// chain at most once.
pub struct Next {
    chain: Arc<[BoxedMiddleware]>,
    index: usize,
    endpoint: Endpoint,
    update: Arc<Update>,
}

/// What a chain wraps once every middleware has been passed.
#[derive(Clone)]
pub(crate) enum Endpoint {
    /// Update-level filters and inner chain of a router node.
    Gate(Arc<RouterNode>),
    /// Kind observer of a router node, then its children.
    Route(Arc<RouterNode>),
    /// Filters and candidates of one observer of a router node.
    Resolve(Arc<RouterNode>, Slot),
    /// A matched handler.
    Handler(BoxedHandler),
}

impl Next {
    pub(crate) fn new(chain: Arc<[BoxedMiddleware]>, endpoint: Endpoint, update: Arc<Update>) -> Self {
        Self {
            chain,
            index: 0,
            endpoint,
            update,
        }
    }

    /// Runs the rest of the chain and whatever it wraps.
    pub fn run(self, ctx: &Context) -> BoxFuture<'_, HandlerResult> {
        Box::pin(async move {
            match self.chain.get(self.index).cloned() {
                Some(middleware) => {
                    let update = Arc::clone(&self.update);
                    let next = Self {
                        index: self.index + 1,
                        ..self
                    };
                    middleware.call(&update, ctx, next).await
                }
                None => self.endpoint.run(self.update, ctx).await,
            }
        })
    }

    /// Number of middlewares left before the endpoint.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.remaining())
            .field("kind", &self.update.kind())
            .finish_non_exhaustive()
    }
}

impl Endpoint {
    fn run(self, update: Arc<Update>, ctx: &Context) -> BoxFuture<'_, HandlerResult> {
        match self {
            Self::Gate(node) => node.gate(update, ctx),
            Self::Route(node) => node.route(update, ctx),
            Self::Resolve(node, slot) => node.resolve(slot, update, ctx),
            Self::Handler(handler) => handler(ctx.clone()),
        }
    }
}

// ============================================================================
// Closures
// ============================================================================

/// A middleware backed by an async closure. See [`middleware_fn`].
#[derive(Clone)]
pub struct MiddlewareFn<F>(F);

/// Wraps `Fn(Context, Next) -> impl Future<Output = HandlerResult>` as a middleware.
///
/// The closure receives owned handles so its future can be `'static`:
///
/// ```rust,ignore
/// router.message_created().inner_middleware(middleware_fn(|ctx, next| async move {
///     ctx.insert(RequestId::new());
///     next.run(&ctx).await
/// }));
/// ```
pub fn middleware_fn<F, Fut>(f: F) -> MiddlewareFn<F>
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    MiddlewareFn(f)
}

#[async_trait]
impl<F, Fut> Middleware for MiddlewareFn<F>
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, _update: &Update, ctx: &Context, next: Next) -> HandlerResult {
        (self.0)(ctx.clone(), next).await
    }
}
