//! Filters decide which handler receives an update.
//!
//! A [`Filter`] is an async predicate over the update and its [`Context`].
//! It may stash values into the context for the handler it guards (the
//! [`Command`](crate::Command) filter stores the parsed command, for
//! instance), but should otherwise leave the context alone.
//!
//! Returning `Err` is not the same as returning `false`: an error aborts the
//! update and is routed to the error observers like a handler error.
//!
//! # Composition
//!
//! ```rust,ignore
//! use switchyard_framework::{FilterExt, KindFilter, filter_fn};
//!
//! let long_text = filter_fn(|update, _ctx| match update {
//!     Update::MessageCreated(m) => m.message.text().is_some_and(|t| t.len() > 100),
//!     _ => false,
//! });
//!
//! router.message_created().with(long_text.and(admin_only.not())).handler(h);
//! ```
//!
//! `and` stops at the first `false`, `or` stops at the first `true`.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use switchyard_core::Update;

use crate::context::Context;
use crate::error::BoxError;

/// An async predicate over an update.
#[async_trait]
pub trait Filter: Send + Sync + 'static {
    /// Returns `Ok(true)` if the update passes.
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError>;
}

/// A type-erased filter.
pub type BoxedFilter = Arc<dyn Filter>;

#[async_trait]
impl<F: Filter + ?Sized> Filter for Arc<F> {
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        (**self).check(update, ctx).await
    }
}

/// Evaluates filters in order, stopping at the first that does not pass.
pub(crate) async fn check_all(
    filters: &[BoxedFilter],
    update: &Update,
    ctx: &Context,
) -> Result<bool, BoxError> {
    for filter in filters {
        if !filter.check(update, ctx).await? {
            return Ok(false);
        }
    }
    Ok(true)
}

// ============================================================================
// Combinators
// ============================================================================

/// Combinator methods available on every filter.
pub trait FilterExt: Filter + Sized {
    /// Passes when both filters pass. `other` is skipped if `self` fails.
    fn and<F: Filter>(self, other: F) -> And<Self, F> {
        And(self, other)
    }

    /// Passes when either filter passes. `other` is skipped if `self` passes.
    fn or<F: Filter>(self, other: F) -> Or<Self, F> {
        Or(self, other)
    }

    /// Inverts the filter. Errors are not inverted.
    fn not(self) -> Not<Self> {
        Not(self)
    }

    /// Erases the filter type.
    fn boxed(self) -> BoxedFilter {
        Arc::new(self)
    }
}

impl<F: Filter> FilterExt for F {}

/// See [`FilterExt::and`].
#[derive(Debug, Clone)]
pub struct And<A, B>(A, B);

#[async_trait]
impl<A: Filter, B: Filter> Filter for And<A, B> {
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        Ok(self.0.check(update, ctx).await? && self.1.check(update, ctx).await?)
    }
}

/// See [`FilterExt::or`].
#[derive(Debug, Clone)]
pub struct Or<A, B>(A, B);

#[async_trait]
impl<A: Filter, B: Filter> Filter for Or<A, B> {
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        Ok(self.0.check(update, ctx).await? || self.1.check(update, ctx).await?)
    }
}

/// See [`FilterExt::not`].
#[derive(Debug, Clone)]
pub struct Not<A>(A);

#[async_trait]
impl<A: Filter> Filter for Not<A> {
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        Ok(!self.0.check(update, ctx).await?)
    }
}

/// Passes when every filter passes; empty passes.
pub struct All(Vec<BoxedFilter>);

/// Builds an [`All`] over the given filters.
pub fn all(filters: impl IntoIterator<Item = BoxedFilter>) -> All {
    All(filters.into_iter().collect())
}

#[async_trait]
impl Filter for All {
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        check_all(&self.0, update, ctx).await
    }
}

/// Passes when any filter passes; empty fails.
pub struct Any(Vec<BoxedFilter>);

/// Builds an [`Any`] over the given filters.
pub fn any(filters: impl IntoIterator<Item = BoxedFilter>) -> Any {
    Any(filters.into_iter().collect())
}

#[async_trait]
impl Filter for Any {
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        for filter in &self.0 {
            if filter.check(update, ctx).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

// ============================================================================
// Closures
// ============================================================================

/// A filter backed by a synchronous closure. See [`filter_fn`].
#[derive(Clone)]
pub struct FilterFn<F>(F);

/// Wraps `Fn(&Update, &Context) -> bool` as a filter.
pub fn filter_fn<F>(f: F) -> FilterFn<F>
where
    F: Fn(&Update, &Context) -> bool + Send + Sync + 'static,
{
    FilterFn(f)
}

#[async_trait]
impl<F> Filter for FilterFn<F>
where
    F: Fn(&Update, &Context) -> bool + Send + Sync + 'static,
{
    async fn check(&self, update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        Ok((self.0)(update, ctx))
    }
}

/// A filter backed by an async closure. See [`async_filter_fn`].
#[derive(Clone)]
pub struct AsyncFilterFn<F>(F);

/// Wraps `Fn(Context) -> impl Future<Output = Result<bool, BoxError>>` as a filter.
///
/// The closure receives an owned [`Context`] handle; the update is available
/// through [`Context::update`].
pub fn async_filter_fn<F, Fut>(f: F) -> AsyncFilterFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
{
    AsyncFilterFn(f)
}

#[async_trait]
impl<F, Fut> Filter for AsyncFilterFn<F>
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
{
    async fn check(&self, _update: &Update, ctx: &Context) -> Result<bool, BoxError> {
        (self.0)(ctx.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_err;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use switchyard_core::{BotStopped, User};

    fn update() -> Update {
        Update::from(BotStopped {
            chat_id: 1,
            user: User::new(1, "Ann"),
            user_locale: None,
            timestamp: 0,
        })
    }

    /// Counts calls and returns a fixed answer.
    struct Counting {
        answer: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Counting {
        fn new(answer: bool) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    answer,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl Filter for Counting {
        async fn check(&self, _update: &Update, _ctx: &Context) -> Result<bool, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    struct Failing;

    #[async_trait]
    impl Filter for Failing {
        async fn check(&self, _update: &Update, _ctx: &Context) -> Result<bool, BoxError> {
            Err("filter exploded".into())
        }
    }

    #[tokio::test]
    async fn test_and_short_circuits_on_false() {
        let (left, _) = Counting::new(false);
        let (right, right_calls) = Counting::new(true);
        let ctx = Context::empty();
        assert!(!left.and(right).check(&update(), &ctx).await.unwrap());
        assert_eq!(right_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_or_short_circuits_on_true() {
        let (left, _) = Counting::new(true);
        let (right, right_calls) = Counting::new(false);
        let ctx = Context::empty();
        assert!(left.or(right).check(&update(), &ctx).await.unwrap());
        assert_eq!(right_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_inverts_but_keeps_errors() {
        let ctx = Context::empty();
        let (counting, _) = Counting::new(false);
        assert!(counting.not().check(&update(), &ctx).await.unwrap());
        assert_err!(Failing.not().check(&update(), &ctx).await);
    }

    #[tokio::test]
    async fn test_all_and_any() {
        let ctx = Context::empty();
        let yes = || filter_fn(|_, _| true).boxed();
        let no = || filter_fn(|_, _| false).boxed();

        assert!(all([]).check(&update(), &ctx).await.unwrap());
        assert!(all([yes(), yes()]).check(&update(), &ctx).await.unwrap());
        assert!(!all([yes(), no()]).check(&update(), &ctx).await.unwrap());

        assert!(!any([]).check(&update(), &ctx).await.unwrap());
        assert!(any([no(), yes()]).check(&update(), &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_async_filter_fn_sees_context() {
        let filter = async_filter_fn(|ctx: Context| async move { Ok(ctx.contains::<u8>()) });
        let ctx = Context::empty();
        assert!(!filter.check(&update(), &ctx).await.unwrap());
        ctx.insert(1u8);
        assert!(filter.check(&update(), &ctx).await.unwrap());
    }
}
