//! Per-update context.
//!
//! A [`Context`] is created for every incoming update and shared by every
//! middleware, filter and handler that touches it. It is a typed map: each
//! value is stored under its Rust type, so the well-known entries are
//! distinct types rather than string keys.
//!
//! | Entry | Type | Written by |
//! |-------|------|------------|
//! | update | `Arc<Update>` | caller |
//! | bot | [`BoxedBot`] | caller (optional) |
//! | enrich flag | [`EnrichUpdateContext`] | caller (optional) |
//! | update context | [`UpdateContext`] | [`UpdateContextMiddleware`](crate::UpdateContextMiddleware) |
//! | event user | [`EventFromUser`] | [`UpdateContextMiddleware`](crate::UpdateContextMiddleware) |
//! | event chat | [`EventChat`] | [`UpdateContextMiddleware`](crate::UpdateContextMiddleware), when enriched |
//! | error | [`ErrorEvent`](crate::ErrorEvent) | [`Dispatcher`](crate::Dispatcher), during error routing |
//!
//! Cloning a `Context` is cheap and yields a handle to the same map, so a
//! value inserted by an inner middleware is visible to an outer middleware
//! once `next` returns.
//!
//! # Example
//!
//! ```rust,ignore
//! let ctx = Context::new(update).with_bot(bot).with(EnrichUpdateContext(true));
//! ctx.insert(Database::connect().await?);
//! let outcome = dispatcher.trigger(&ctx).await?;
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use switchyard_core::{BoxedBot, Chat, Update, User};

use crate::middlewares::UpdateContext;

type StateMap = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

/// The per-update shared data carrier.
#[derive(Clone, Default)]
pub struct Context {
    state: Arc<Mutex<StateMap>>,
}

impl Context {
    /// Creates a context seeded with the given update.
    pub fn new(update: impl Into<Arc<Update>>) -> Self {
        let ctx = Self::empty();
        ctx.insert::<Arc<Update>>(update.into());
        ctx
    }

    /// Creates a context with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds the bot (builder pattern).
    pub fn with_bot(self, bot: BoxedBot) -> Self {
        self.insert(bot);
        self
    }

    /// Adds an arbitrary value (builder pattern).
    pub fn with<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Stores a value, returning the previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&self, value: T) -> Option<T> {
        self.state
            .lock()
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Retrieves a clone of the stored value of type `T`.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        self.state
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Returns `true` if a value of type `T` is stored.
    pub fn contains<T: 'static>(&self) -> bool {
        self.state.lock().contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns the stored value of type `T`.
    pub fn remove<T: 'static>(&self) -> Option<T> {
        self.state
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    /// Mutates the stored value of type `T` in place.
    ///
    /// Returns `None` without calling `f` if no such value exists. The map
    /// is locked while `f` runs, so `f` must not touch this context.
    pub fn modify<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut state = self.state.lock();
        state
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut::<T>())
            .map(f)
    }

    /// Returns the update being processed.
    pub fn update(&self) -> Option<Arc<Update>> {
        self.get::<Arc<Update>>()
    }

    /// Returns the bot, if the caller provided one.
    pub fn bot(&self) -> Option<BoxedBot> {
        self.get::<BoxedBot>()
    }

    /// Returns the resolved update context, once the resolver has run.
    pub fn update_context(&self) -> Option<UpdateContext> {
        self.get::<UpdateContext>()
    }

    /// Returns the user who caused the update, if resolved.
    pub fn event_from_user(&self) -> Option<User> {
        self.get::<EventFromUser>().map(|u| u.0)
    }

    /// Returns the chat the update happened in, if enrichment resolved it.
    pub fn event_chat(&self) -> Option<Chat> {
        self.get::<EventChat>().map(|c| c.0)
    }

    /// Returns `true` if the caller asked for update-context enrichment.
    pub fn enrich_requested(&self) -> bool {
        self.get::<EnrichUpdateContext>().is_some_and(|flag| flag.0)
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("entries", &self.len())
            .field("update", &self.update().map(|u| u.kind()))
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Well-known entries
// =============================================================================

/// The user who caused the current update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFromUser(pub User);

impl Deref for EventFromUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

/// The chat the current update happened in, as fetched during enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventChat(pub Chat);

impl Deref for EventChat {
    type Target = Chat;

    fn deref(&self) -> &Chat {
        &self.0
    }
}

/// Per-dispatch request to enrich the [`UpdateContext`] through the bot.
///
/// Honoured by [`UpdateContextMiddleware`](crate::UpdateContextMiddleware)
/// even when the middleware itself was built with enrichment disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichUpdateContext(pub bool);

pub(crate) fn missing<T>() -> crate::error::ExtractError {
    crate::error::ExtractError::MissingValue(type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchyard_core::{DialogCleared, UpdateKind};

    fn sample_update() -> Update {
        Update::from(DialogCleared {
            chat_id: 1,
            user: User::new(2, "Ann"),
            user_locale: None,
            timestamp: 0,
        })
    }

    #[test]
    fn test_new_seeds_update() {
        let ctx = Context::new(sample_update());
        assert_eq!(
            ctx.update().map(|u| u.kind()),
            Some(UpdateKind::DialogCleared)
        );
        assert!(ctx.bot().is_none());
        assert!(!ctx.enrich_requested());
    }

    #[test]
    fn test_insert_get_remove() {
        let ctx = Context::empty();
        assert!(ctx.insert(5u32).is_none());
        assert_eq!(ctx.insert(6u32), Some(5));
        assert_eq!(ctx.get::<u32>(), Some(6));
        assert!(ctx.contains::<u32>());
        assert_eq!(ctx.remove::<u32>(), Some(6));
        assert!(!ctx.contains::<u32>());
    }

    #[test]
    fn test_clones_share_state() {
        let ctx = Context::empty();
        let other = ctx.clone();
        other.insert(String::from("shared"));
        assert_eq!(ctx.get::<String>().as_deref(), Some("shared"));
    }

    #[test]
    fn test_modify_in_place() {
        let ctx = Context::empty().with(vec![1, 2]);
        let len = ctx.modify::<Vec<i32>, _>(|v| {
            v.push(3);
            v.len()
        });
        assert_eq!(len, Some(3));
        assert_eq!(ctx.get::<Vec<i32>>(), Some(vec![1, 2, 3]));
        assert_eq!(ctx.modify::<String, _>(|s| s.len()), None);
    }

    #[test]
    fn test_enrich_flag() {
        let ctx = Context::empty().with(EnrichUpdateContext(true));
        assert!(ctx.enrich_requested());
        ctx.insert(EnrichUpdateContext(false));
        assert!(!ctx.enrich_requested());
    }
}
