//! Routers and the router tree.
//!
//! A [`Router`] is a named node with one [`Observer`] per update kind, an
//! error observer, an update-level observer, and an ordered list of child
//! routers. Routers are cheap handles: cloning one yields another handle to
//! the same node.
//!
//! # Dispatch
//!
//! For every update a router:
//!
//! 1. runs its update-level outer chain;
//! 2. checks its update-level filters (failure skips the whole subtree);
//! 3. runs its update-level inner chain around steps 4 and 5;
//! 4. asks its observer for the update's kind;
//! 5. if that yields [`Outcome::Unhandled`], asks each child in inclusion
//!    order and returns the first handled outcome.
//!
//! This is a depth-first, first-match-wins search evaluated afresh for every
//! update.
//!
//! # Freezing
//!
//! The first [`trigger`](Router::trigger) snapshots the subtree and freezes
//! every router in it. Kind and error observer middlewares are resolved into
//! the snapshot at that point: an observer's effective chain is its
//! ancestors' chain for the same kind (root first) followed by its own.
//! After freezing, [`include`](Router::include) fails and new registrations
//! are rejected with an error log.
//!
//! ```rust,ignore
//! let admin = Router::new("admin");
//! admin.update().filter(is_admin);
//! admin.message_created().with(Command::new(["ban"])).handler(ban);
//!
//! let root = Router::new("root");
//! root.include(&admin)?;
//! root.message_created().handler(fallback);
//! ```

use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, trace};

use switchyard_core::{Update, UpdateKind};

use crate::context::Context;
use crate::error::{ExtractError, RoutingError};
use crate::filter::check_all;
use crate::handler::BoxFuture;
use crate::middleware::{BoxedMiddleware, Endpoint, Next};
use crate::observer::{CompiledGate, CompiledObserver, Observer, ObserverDraft, Slot, UpdateObserver};
use crate::outcome::{HandlerResult, Outcome};

struct RouterInner {
    name: String,
    state: Mutex<RouterState>,
    compiled: OnceLock<Arc<RouterNode>>,
}

struct RouterState {
    gate: ObserverDraft,
    observers: Vec<ObserverDraft>,
    children: Vec<Router>,
    parent: Option<Weak<RouterInner>>,
    frozen: bool,
}

/// A node of the router tree.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

macro_rules! kind_accessors {
    ($($method:ident => $kind:ident),* $(,)?) => {
        $(
            #[doc = concat!("Observer for `", stringify!($method), "` updates.")]
            pub fn $method(&self) -> Observer {
                self.observer(UpdateKind::$kind)
            }
        )*
    };
}

impl Router {
    /// Creates an empty router.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                name: name.into(),
                state: Mutex::new(RouterState {
                    gate: ObserverDraft::default(),
                    observers: (0..Slot::COUNT).map(|_| ObserverDraft::default()).collect(),
                    children: Vec::new(),
                    parent: None,
                    frozen: false,
                }),
                compiled: OnceLock::new(),
            }),
        }
    }

    /// Returns the router's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Observer for the given update kind.
    pub fn observer(&self, kind: UpdateKind) -> Observer {
        Observer::new(self.clone(), Slot::Kind(kind))
    }

    kind_accessors! {
        message_created => MessageCreated,
        message_edited => MessageEdited,
        message_removed => MessageRemoved,
        message_callback => MessageCallback,
        message_chat_created => MessageChatCreated,
        bot_added => BotAdded,
        bot_removed => BotRemoved,
        bot_started => BotStarted,
        bot_stopped => BotStopped,
        user_added => UserAdded,
        user_removed => UserRemoved,
        chat_title_changed => ChatTitleChanged,
        dialog_muted => DialogMuted,
        dialog_unmuted => DialogUnmuted,
        dialog_cleared => DialogCleared,
        dialog_removed => DialogRemoved,
    }

    /// Update-level observer, wrapping this router and its children.
    pub fn update(&self) -> UpdateObserver {
        UpdateObserver::new(self.clone())
    }

    /// Error observer.
    ///
    /// Only consulted by a [`Dispatcher`](crate::Dispatcher): error handlers
    /// receive the failed update with an [`ErrorEvent`](crate::ErrorEvent)
    /// in the context.
    pub fn error(&self) -> Observer {
        Observer::new(self.clone(), Slot::Error)
    }

    // ─── Tree structure ───────────────────────────────────────────────────────

    /// Attaches `child` as the last child of this router.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::Cycle`] if `child` is this router or one of its
    ///   ancestors
    /// - [`RoutingError::AlreadyAttached`] if `child` already has a parent
    /// - [`RoutingError::Frozen`] if either router has started dispatching
    pub fn include(&self, child: &Router) -> Result<(), RoutingError> {
        for router in [self, child] {
            if router.is_frozen() {
                return Err(RoutingError::Frozen {
                    router: router.name().to_string(),
                });
            }
        }

        if self.ptr_eq(child) {
            return Err(RoutingError::Cycle {
                path: vec![self.name().to_string()],
            });
        }

        let mut path = vec![self.name().to_string()];
        let mut current = self.parent();
        while let Some(ancestor) = current {
            path.push(ancestor.name().to_string());
            if ancestor.ptr_eq(child) {
                path.reverse();
                return Err(RoutingError::Cycle { path });
            }
            current = ancestor.parent();
        }

        if let Some(parent) = child.parent() {
            return Err(RoutingError::AlreadyAttached {
                router: child.name().to_string(),
                parent: parent.name().to_string(),
            });
        }

        child.inner.state.lock().parent = Some(Arc::downgrade(&self.inner));
        self.inner.state.lock().children.push(child.clone());
        debug!(parent = %self.name(), child = %child.name(), "router included");
        Ok(())
    }

    /// Attaches several children in order, stopping at the first error.
    pub fn include_all<'a>(
        &self,
        children: impl IntoIterator<Item = &'a Router>,
    ) -> Result<(), RoutingError> {
        children.into_iter().try_for_each(|child| self.include(child))
    }

    /// Returns the direct children, in inclusion order.
    pub fn children(&self) -> Vec<Router> {
        self.inner.state.lock().children.clone()
    }

    /// Returns the parent router, if this router was included somewhere.
    pub fn parent(&self) -> Option<Router> {
        let parent = self.inner.state.lock().parent.clone();
        parent
            .and_then(|weak| weak.upgrade())
            .map(|inner| Router { inner })
    }

    /// Returns `true` once the router can no longer change.
    pub fn is_frozen(&self) -> bool {
        self.inner.state.lock().frozen
    }

    /// Freezes the subtree now instead of on the first update.
    pub fn freeze(&self) {
        self.compiled();
    }

    fn ptr_eq(&self, other: &Router) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ─── Dispatch ─────────────────────────────────────────────────────────────

    /// Routes the update in `ctx` through this router and its subtree.
    ///
    /// Errors are returned as-is; error observers are only consulted by
    /// [`Dispatcher::trigger`](crate::Dispatcher::trigger).
    pub async fn trigger(&self, ctx: &Context) -> HandlerResult {
        let update = ctx.update().ok_or(ExtractError::MissingUpdate)?;
        self.compiled().trigger(update, ctx).await
    }

    pub(crate) fn compiled(&self) -> Arc<RouterNode> {
        let node = self.inner.compiled.get_or_init(|| {
            let empty = vec![Vec::new(); Slot::COUNT];
            let node = self.compile(&empty, &empty);
            debug!(router = %self.name(), "router tree frozen");
            node
        });
        Arc::clone(node)
    }

    fn compile(
        &self,
        inherited_outer: &[Vec<BoxedMiddleware>],
        inherited_inner: &[Vec<BoxedMiddleware>],
    ) -> Arc<RouterNode> {
        let (gate, observers, children) = {
            let mut state = self.inner.state.lock();
            state.frozen = true;
            let observers: Vec<CompiledObserver> = state
                .observers
                .iter()
                .enumerate()
                .map(|(i, draft)| draft.compile(&inherited_outer[i], &inherited_inner[i]))
                .collect();
            (
                CompiledGate::compile(&state.gate),
                observers,
                state.children.clone(),
            )
        };

        let next_outer: Vec<Vec<BoxedMiddleware>> =
            observers.iter().map(|o| o.outer.to_vec()).collect();
        let next_inner: Vec<Vec<BoxedMiddleware>> =
            observers.iter().map(|o| o.inner.to_vec()).collect();

        Arc::new(RouterNode {
            name: self.name().to_string(),
            gate,
            observers,
            children: children
                .iter()
                .map(|child| child.compile(&next_outer, &next_inner))
                .collect(),
        })
    }

    // ─── Registration plumbing ────────────────────────────────────────────────

    pub(crate) fn edit_observer(&self, slot: Slot, what: &str, f: impl FnOnce(&mut ObserverDraft)) {
        let mut state = self.inner.state.lock();
        if state.frozen {
            error!(
                router = %self.name(),
                observer = slot.name(),
                "cannot register {what}: router tree is already dispatching"
            );
            return;
        }
        f(&mut state.observers[slot.index()]);
    }

    pub(crate) fn edit_update_observer(&self, what: &str, f: impl FnOnce(&mut ObserverDraft)) {
        let mut state = self.inner.state.lock();
        if state.frozen {
            error!(
                router = %self.name(),
                observer = "update",
                "cannot register {what}: router tree is already dispatching"
            );
            return;
        }
        f(&mut state.gate);
    }

    pub(crate) fn read_observer<R>(&self, slot: Slot, f: impl FnOnce(&ObserverDraft) -> R) -> R {
        f(&self.inner.state.lock().observers[slot.index()])
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Router")
            .field("name", &self.inner.name)
            .field("children", &state.children.len())
            .field("frozen", &state.frozen)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// RouterNode: frozen snapshot used during dispatch
// =============================================================================

pub(crate) struct RouterNode {
    name: String,
    pub(crate) gate: CompiledGate,
    observers: Vec<CompiledObserver>,
    children: Vec<Arc<RouterNode>>,
}

impl RouterNode {
    /// Full dispatch of an update through this node.
    pub(crate) fn trigger<'a>(
        self: &Arc<Self>,
        update: Arc<Update>,
        ctx: &'a Context,
    ) -> BoxFuture<'a, HandlerResult> {
        Next::new(
            Arc::clone(&self.gate.outer),
            Endpoint::Gate(Arc::clone(self)),
            update,
        )
        .run(ctx)
    }

    /// Update-level filters, then the update-level inner chain around [`route`](Self::route).
    pub(crate) fn gate<'a>(
        self: Arc<Self>,
        update: Arc<Update>,
        ctx: &'a Context,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            if !check_all(&self.gate.filters, &update, ctx).await? {
                trace!(router = %self.name, "update filters rejected update");
                return Ok(Outcome::Unhandled);
            }
            let inner = Arc::clone(&self.gate.inner);
            Next::new(inner, Endpoint::Route(self), update).run(ctx).await
        })
    }

    /// Kind observer, then children.
    pub(crate) fn route<'a>(
        self: Arc<Self>,
        update: Arc<Update>,
        ctx: &'a Context,
    ) -> BoxFuture<'a, HandlerResult> {
        let slot = Slot::Kind(update.kind());
        self.propagate(slot, update, ctx)
    }

    /// Observer for `slot`, then each child in order until one handles it.
    ///
    /// Children are entered through their full [`trigger`](Self::trigger)
    /// for update kinds, and directly through their error observer for
    /// errors.
    pub(crate) fn propagate<'a>(
        self: Arc<Self>,
        slot: Slot,
        update: Arc<Update>,
        ctx: &'a Context,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let observer = &self.observers[slot.index()];
            if !observer.is_inert() {
                let endpoint = Endpoint::Resolve(Arc::clone(&self), slot);
                let outcome = Next::new(Arc::clone(&observer.outer), endpoint, Arc::clone(&update))
                    .run(ctx)
                    .await?;
                if outcome.is_handled() {
                    debug!(router = %self.name, observer = slot.name(), "update handled");
                    return Ok(outcome);
                }
            }

            for child in &self.children {
                let outcome = match slot {
                    Slot::Kind(_) => child.trigger(Arc::clone(&update), ctx).await?,
                    Slot::Error => {
                        Arc::clone(child)
                            .propagate(Slot::Error, Arc::clone(&update), ctx)
                            .await?
                    }
                };
                if outcome.is_handled() {
                    return Ok(outcome);
                }
            }

            Ok(Outcome::Unhandled)
        })
    }

    /// Filters and candidates of the observer for `slot`.
    pub(crate) fn resolve<'a>(
        self: Arc<Self>,
        slot: Slot,
        update: Arc<Update>,
        ctx: &'a Context,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move { self.observers[slot.index()].resolve(update, ctx).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;
    use crate::filter::{FilterExt, filter_fn};
    use crate::middleware::{Middleware, middleware_fn};
    use async_trait::async_trait;
    use serde_json::json;
    use switchyard_core::{ChatType, Message, MessageCreated, Recipient, User};

    type Trace = Arc<parking_lot::Mutex<Vec<String>>>;

    fn message_update() -> Update {
        Update::from(MessageCreated {
            message: Message {
                sender: Some(User::new(5, "Ann")),
                recipient: Recipient {
                    chat_id: Some(10),
                    chat_type: ChatType::Chat,
                    user_id: None,
                },
                timestamp: 0,
                body: None,
                url: None,
            },
            user_locale: None,
            timestamp: 0,
        })
    }

    fn traced_context() -> (Context, Trace) {
        let trace: Trace = Arc::default();
        let ctx = Context::new(message_update()).with(Arc::clone(&trace));
        (ctx, trace)
    }

    fn push(ctx: &Context, entry: &str) {
        if let Some(trace) = ctx.get::<Trace>() {
            trace.lock().push(entry.to_string());
        }
    }

    fn entries(trace: &Trace) -> Vec<String> {
        trace.lock().clone()
    }

    /// Records `{label}_pre` and `{label}_post` around `next`.
    struct Tracer(&'static str);

    #[async_trait]
    impl Middleware for Tracer {
        async fn call(&self, _update: &Update, ctx: &Context, next: Next) -> HandlerResult {
            push(ctx, &format!("{}_pre", self.0));
            let result = next.run(ctx).await;
            push(ctx, &format!("{}_post", self.0));
            result
        }
    }

    fn recording_handler(
        label: &'static str,
    ) -> impl Fn(Context) -> futures::future::Ready<&'static str> + Clone + Send + Sync + 'static {
        move |ctx: Context| {
            push(&ctx, label);
            futures::future::ready(label)
        }
    }

    #[tokio::test]
    async fn test_middleware_execution_order() {
        let router = Router::new("main");
        router.message_created().handler(recording_handler("handler"));
        router
            .message_created()
            .outer_middleware(Tracer("outer1"))
            .outer_middleware(Tracer("outer2"))
            .inner_middleware(Tracer("inner1"))
            .inner_middleware(Tracer("inner2"));

        let (ctx, trace) = traced_context();
        let outcome = router.trigger(&ctx).await.unwrap();

        assert_eq!(outcome, Outcome::Handled(json!("handler")));
        assert_eq!(
            entries(&trace),
            [
                "outer1_pre",
                "outer2_pre",
                "inner1_pre",
                "inner2_pre",
                "handler",
                "inner2_post",
                "inner1_post",
                "outer2_post",
                "outer1_post",
            ]
        );
    }

    #[tokio::test]
    async fn test_outer_middleware_runs_before_observer_filter() {
        let router = Router::new("main");
        router
            .message_created()
            .filter(filter_fn(|_, ctx| {
                push(ctx, "filter");
                false
            }))
            .outer_middleware(Tracer("outer1"))
            .handler(recording_handler("handler"));

        let (ctx, trace) = traced_context();
        let outcome = router.trigger(&ctx).await.unwrap();

        assert!(outcome.is_unhandled());
        assert_eq!(entries(&trace), ["outer1_pre", "filter", "outer1_post"]);
    }

    #[tokio::test]
    async fn test_update_filter_gates_router() {
        let router = Router::new("main");
        router.update().filter(filter_fn(|_, ctx| {
            push(ctx, "filter");
            false
        }));
        router.message_created().handler(recording_handler("handler"));

        let (ctx, trace) = traced_context();
        let outcome = router.trigger(&ctx).await.unwrap();

        assert!(outcome.is_unhandled());
        assert_eq!(entries(&trace), ["filter"]);
    }

    #[tokio::test]
    async fn test_update_middlewares_wrap_children() {
        let root = Router::new("root");
        let child = Router::new("child");
        root.include(&child).unwrap();
        root.update()
            .outer_middleware(Tracer("update_outer"))
            .inner_middleware(Tracer("update_inner"));
        child.message_created().handler(recording_handler("child"));

        let (ctx, trace) = traced_context();
        root.trigger(&ctx).await.unwrap();

        assert_eq!(
            entries(&trace),
            [
                "update_outer_pre",
                "update_inner_pre",
                "child",
                "update_inner_post",
                "update_outer_post",
            ]
        );
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let router = Router::new("main");
        router
            .message_created()
            .with(filter_fn(|_, _| false))
            .handler(recording_handler("first"));
        router
            .message_created()
            .with(filter_fn(|_, _| true))
            .handler(recording_handler("second"));
        router.message_created().handler(recording_handler("third"));

        let (ctx, trace) = traced_context();
        let outcome = router.trigger(&ctx).await.unwrap();

        assert_eq!(outcome, Outcome::Handled(json!("second")));
        assert_eq!(entries(&trace), ["second"]);
    }

    #[tokio::test]
    async fn test_registration_filters_are_anded() {
        let router = Router::new("main");
        router
            .message_created()
            .with(filter_fn(|_, _| true))
            .with(filter_fn(|_, _| true).and(filter_fn(|_, _| false)))
            .handler(recording_handler("never"));

        let (ctx, trace) = traced_context();
        assert!(router.trigger(&ctx).await.unwrap().is_unhandled());
        assert!(entries(&trace).is_empty());
    }

    #[tokio::test]
    async fn test_unhandled_runs_outer_post_and_children_in_order() {
        let root = Router::new("root");
        let first = Router::new("first");
        let second = Router::new("second");
        root.include_all([&first, &second]).unwrap();
        root.message_created().outer_middleware(Tracer("root_outer"));
        first.message_created().handler(|ctx: Context| async move {
            push(&ctx, "first");
            Outcome::Unhandled
        });
        second.message_created().handler(recording_handler("second"));

        let (ctx, trace) = traced_context();
        let outcome = root.trigger(&ctx).await.unwrap();

        assert_eq!(outcome, Outcome::Handled(json!("second")));
        // root's outer chain is inherited by both children
        assert_eq!(
            entries(&trace),
            [
                "root_outer_pre",
                "root_outer_post",
                "root_outer_pre",
                "first",
                "root_outer_post",
                "root_outer_pre",
                "second",
                "root_outer_post",
            ]
        );
    }

    #[tokio::test]
    async fn test_unhandled_everywhere() {
        let root = Router::new("root");
        let child = Router::new("child");
        root.include(&child).unwrap();
        root.message_created().outer_middleware(Tracer("outer"));
        child.message_edited().handler(recording_handler("edited"));

        let (ctx, trace) = traced_context();
        assert!(root.trigger(&ctx).await.unwrap().is_unhandled());
        assert_eq!(
            entries(&trace),
            ["outer_pre", "outer_post", "outer_pre", "outer_post"]
        );
    }

    #[tokio::test]
    async fn test_inner_middlewares_propagate_to_children() {
        let root = Router::new("root");
        let child = Router::new("child");
        root.include(&child).unwrap();
        root.message_created().inner_middleware(Tracer("root_inner"));
        child.message_created().inner_middleware(Tracer("child_inner"));
        child.message_created().handler(recording_handler("handler"));

        let (ctx, trace) = traced_context();
        root.trigger(&ctx).await.unwrap();

        assert_eq!(
            entries(&trace),
            [
                "root_inner_pre",
                "child_inner_pre",
                "handler",
                "child_inner_post",
                "root_inner_post",
            ]
        );
    }

    #[tokio::test]
    async fn test_middleware_short_circuit() {
        let router = Router::new("main");
        router
            .message_created()
            .outer_middleware(middleware_fn(|ctx, _next| async move {
                push(&ctx, "blocked");
                Ok(Outcome::handled())
            }))
            .handler(recording_handler("handler"));

        let (ctx, trace) = traced_context();
        assert!(router.trigger(&ctx).await.unwrap().is_handled());
        assert_eq!(entries(&trace), ["blocked"]);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let router = Router::new("main");
        router
            .message_created()
            .handler(|| async { Err::<(), _>(ExtractError::custom("broken")) });

        let (ctx, _) = traced_context();
        let err = router.trigger(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "broken");
    }

    #[tokio::test]
    async fn test_filter_error_propagates() {
        struct Exploding;

        #[async_trait]
        impl crate::filter::Filter for Exploding {
            async fn check(&self, _: &Update, _: &Context) -> Result<bool, crate::BoxError> {
                Err("filter failed".into())
            }
        }

        let router = Router::new("main");
        router
            .message_created()
            .with(Exploding)
            .handler(recording_handler("handler"));

        let (ctx, trace) = traced_context();
        assert_err!(router.trigger(&ctx).await);
        assert!(entries(&trace).is_empty());
    }

    #[tokio::test]
    async fn test_missing_update_is_an_error() {
        let router = Router::new("main");
        assert_err!(router.trigger(&Context::empty()).await);
    }

    // ─── Structure ────────────────────────────────────────────────────────────

    #[test]
    fn test_self_inclusion_is_a_cycle() {
        let router = Router::new("main");
        let err = router.include(&router).unwrap_err();
        assert_eq!(
            err,
            RoutingError::Cycle {
                path: vec!["main".into()]
            }
        );
    }

    #[test]
    fn test_mutual_inclusion_is_a_cycle() {
        let a = Router::new("a");
        let b = Router::new("b");
        a.include(&b).unwrap();
        let err = b.include(&a).unwrap_err();
        assert_eq!(
            err,
            RoutingError::Cycle {
                path: vec!["a".into(), "b".into()]
            }
        );
        assert!(a.parent().is_none());
    }

    #[test]
    fn test_deep_cycle_lists_whole_path() {
        let a = Router::new("a");
        let b = Router::new("b");
        let c = Router::new("c");
        a.include(&b).unwrap();
        b.include(&c).unwrap();
        let err = c.include(&a).unwrap_err();
        assert_eq!(
            err,
            RoutingError::Cycle {
                path: vec!["a".into(), "b".into(), "c".into()]
            }
        );
    }

    #[test]
    fn test_reattaching_is_rejected() {
        let a = Router::new("a");
        let b = Router::new("b");
        let shared = Router::new("shared");
        a.include(&shared).unwrap();
        let err = b.include(&shared).unwrap_err();
        assert_eq!(
            err,
            RoutingError::AlreadyAttached {
                router: "shared".into(),
                parent: "a".into()
            }
        );
        assert!(matches!(
            a.include(&shared),
            Err(RoutingError::AlreadyAttached { .. })
        ));
        assert_eq!(a.children().len(), 1);
    }

    #[tokio::test]
    async fn test_tree_freezes_on_first_trigger() {
        let root = Router::new("root");
        let child = Router::new("child");
        root.include(&child).unwrap();
        root.message_created().handler(recording_handler("root"));

        let (ctx, _) = traced_context();
        root.trigger(&ctx).await.unwrap();

        assert!(root.is_frozen());
        assert!(child.is_frozen());
        assert!(matches!(
            root.include(&Router::new("late")),
            Err(RoutingError::Frozen { .. })
        ));

        // late registrations are ignored
        child.message_created().handler(recording_handler("late"));
        assert_eq!(child.message_created().handler_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_triggers_share_the_snapshot() {
        let router = Router::new("main");
        router.message_created().handler(|| async { "ok" });
        router.freeze();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let router = router.clone();
            tasks.push(tokio::spawn(async move {
                let ctx = Context::new(message_update());
                router.trigger(&ctx).await.map_err(|e| e.to_string())
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok(Outcome::Handled(json!("ok"))));
        }
    }
}
