//! Observers bind handlers to one update kind on one router.
//!
//! An observer owns an ordered list of candidates, each a set of filters
//! plus a handler, together with observer-level filters and outer/inner
//! middleware chains. When an update reaches it:
//!
//! 1. the outer chain runs around everything below;
//! 2. observer-level filters are checked once (failure means unhandled);
//! 3. candidates are tried in registration order, and the first whose
//!    filters all pass is selected;
//! 4. the inner chain runs around the selected handler.
//!
//! [`Observer`] is the registration handle returned by the per-kind
//! accessors on [`Router`], e.g. [`Router::message_created`].

use std::sync::Arc;

use switchyard_core::{Update, UpdateKind};
use tracing::trace;

use crate::context::Context;
use crate::filter::{BoxedFilter, Filter, check_all};
use crate::handler::{BoxedHandler, Handler, into_handler};
use crate::middleware::{BoxedMiddleware, Endpoint, Middleware, Next};
use crate::outcome::{HandlerResult, Outcome};
use crate::router::Router;

// ============================================================================
// Slot
// ============================================================================

/// Which observer of a router is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Kind(UpdateKind),
    Error,
}

impl Slot {
    /// Number of observers per router: one per kind plus the error observer.
    pub(crate) const COUNT: usize = UpdateKind::COUNT + 1;

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Kind(kind) => kind.index(),
            Self::Error => UpdateKind::COUNT,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Kind(kind) => kind.as_str(),
            Self::Error => "error",
        }
    }
}

// ============================================================================
// Registration state
// ============================================================================

pub(crate) struct Candidate {
    pub(crate) filters: Vec<BoxedFilter>,
    pub(crate) handler: BoxedHandler,
}

/// Mutable observer contents, held by the router until the tree freezes.
#[derive(Default)]
pub(crate) struct ObserverDraft {
    pub(crate) outer: Vec<BoxedMiddleware>,
    pub(crate) inner: Vec<BoxedMiddleware>,
    pub(crate) filters: Vec<BoxedFilter>,
    pub(crate) candidates: Vec<Candidate>,
}

impl ObserverDraft {
    /// Snapshots this observer, prefixing the chains inherited from ancestors.
    pub(crate) fn compile(
        &self,
        inherited_outer: &[BoxedMiddleware],
        inherited_inner: &[BoxedMiddleware],
    ) -> CompiledObserver {
        CompiledObserver {
            outer: inherited_outer.iter().chain(&self.outer).cloned().collect(),
            inner: inherited_inner.iter().chain(&self.inner).cloned().collect(),
            filters: self.filters.clone(),
            candidates: self
                .candidates
                .iter()
                .map(|c| Candidate {
                    filters: c.filters.clone(),
                    handler: Arc::clone(&c.handler),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Compiled observer
// ============================================================================

/// Frozen observer with middleware chains already resolved.
pub(crate) struct CompiledObserver {
    pub(crate) outer: Arc<[BoxedMiddleware]>,
    pub(crate) inner: Arc<[BoxedMiddleware]>,
    pub(crate) filters: Vec<BoxedFilter>,
    pub(crate) candidates: Vec<Candidate>,
}

impl CompiledObserver {
    /// Returns `true` if nothing was registered and nothing was inherited.
    pub(crate) fn is_inert(&self) -> bool {
        self.candidates.is_empty() && self.filters.is_empty() && self.outer.is_empty()
    }

    /// Observer-level filters, first matching candidate, inner chain, handler.
    pub(crate) async fn resolve(&self, update: Arc<Update>, ctx: &Context) -> HandlerResult {
        if !check_all(&self.filters, &update, ctx).await? {
            trace!(kind = %update.kind(), "observer filters rejected update");
            return Ok(Outcome::Unhandled);
        }

        for (index, candidate) in self.candidates.iter().enumerate() {
            if check_all(&candidate.filters, &update, ctx).await? {
                trace!(kind = %update.kind(), candidate = index, "handler matched");
                let endpoint = Endpoint::Handler(Arc::clone(&candidate.handler));
                return Next::new(Arc::clone(&self.inner), endpoint, update)
                    .run(ctx)
                    .await;
            }
        }

        Ok(Outcome::Unhandled)
    }
}

// ============================================================================
// Registration handles
// ============================================================================

/// Registration handle for one observer of a router.
///
/// Methods take `&self` so calls can be chained on the temporary:
///
/// ```rust,ignore
/// router
///     .message_created()
///     .outer_middleware(Logging)
///     .filter(ChatTypeFilter::new([ChatType::Chat]))
///     .handler(on_group_message);
/// ```
#[derive(Clone)]
pub struct Observer {
    router: Router,
    slot: Slot,
}

impl Observer {
    pub(crate) fn new(router: Router, slot: Slot) -> Self {
        Self { router, slot }
    }

    /// Registers a handler with no filters.
    pub fn handler<H, T>(&self, handler: H) -> &Self
    where
        H: Handler<T>,
        T: 'static,
    {
        self.register(Vec::new(), into_handler(handler));
        self
    }

    /// Starts a registration guarded by `filter`.
    pub fn with<F: Filter>(&self, filter: F) -> Registration {
        Registration {
            observer: self.clone(),
            filters: vec![Arc::new(filter)],
        }
    }

    /// Adds an observer-level filter, checked once before any candidate.
    pub fn filter<F: Filter>(&self, filter: F) -> &Self {
        self.router
            .edit_observer(self.slot, "filter", |draft| draft.filters.push(Arc::new(filter)));
        self
    }

    /// Appends an outer middleware.
    pub fn outer_middleware<M: Middleware>(&self, middleware: M) -> &Self {
        self.router
            .edit_observer(self.slot, "outer middleware", |draft| {
                draft.outer.push(Arc::new(middleware))
            });
        self
    }

    /// Appends an inner middleware.
    pub fn inner_middleware<M: Middleware>(&self, middleware: M) -> &Self {
        self.router
            .edit_observer(self.slot, "inner middleware", |draft| {
                draft.inner.push(Arc::new(middleware))
            });
        self
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.router.read_observer(self.slot, |draft| draft.candidates.len())
    }

    fn register(&self, filters: Vec<BoxedFilter>, handler: BoxedHandler) {
        self.router.edit_observer(self.slot, "handler", |draft| {
            draft.candidates.push(Candidate { filters, handler })
        });
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer")
            .field("router", &self.router.name())
            .field("kind", &self.slot.name())
            .field("handlers", &self.handler_count())
            .finish()
    }
}

/// A pending registration with its filters. See [`Observer::with`].
///
/// Filters are AND-ed in the order they were added.
pub struct Registration {
    observer: Observer,
    filters: Vec<BoxedFilter>,
}

impl Registration {
    /// Adds another filter.
    pub fn with<F: Filter>(mut self, filter: F) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Completes the registration.
    pub fn handler<H, T>(self, handler: H) -> Observer
    where
        H: Handler<T>,
        T: 'static,
    {
        self.observer.register(self.filters, into_handler(handler));
        self.observer
    }
}

/// Registration handle for the update-level observer of a router.
///
/// Unlike kind observers, this one wraps the router as a whole, children
/// included:
///
/// - outer middlewares run for every update that reaches the router;
/// - filters gate the router's entire subtree;
/// - inner middlewares run once the filters pass, around the kind observer
///   and children.
///
/// The [`Dispatcher`](crate::Dispatcher) installs its
/// [`UpdateContextMiddleware`](crate::UpdateContextMiddleware) here.
#[derive(Clone)]
pub struct UpdateObserver {
    router: Router,
}

impl UpdateObserver {
    pub(crate) fn new(router: Router) -> Self {
        Self { router }
    }

    /// Adds a filter gating the router and its children.
    pub fn filter<F: Filter>(&self, filter: F) -> &Self {
        self.router
            .edit_update_observer("filter", |draft| draft.filters.push(Arc::new(filter)));
        self
    }

    /// Appends an outer middleware.
    pub fn outer_middleware<M: Middleware>(&self, middleware: M) -> &Self {
        self.router
            .edit_update_observer("outer middleware", |draft| draft.outer.push(Arc::new(middleware)));
        self
    }

    /// Appends an inner middleware.
    pub fn inner_middleware<M: Middleware>(&self, middleware: M) -> &Self {
        self.router
            .edit_update_observer("inner middleware", |draft| draft.inner.push(Arc::new(middleware)));
        self
    }
}

/// Snapshot of a router's update-level observer.
pub(crate) struct CompiledGate {
    pub(crate) outer: Arc<[BoxedMiddleware]>,
    pub(crate) inner: Arc<[BoxedMiddleware]>,
    pub(crate) filters: Vec<BoxedFilter>,
}

impl CompiledGate {
    pub(crate) fn compile(draft: &ObserverDraft) -> Self {
        Self {
            outer: draft.outer.iter().cloned().collect(),
            inner: draft.inner.iter().cloned().collect(),
            filters: draft.filters.clone(),
        }
    }
}
