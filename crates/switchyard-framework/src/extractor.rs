//! Extractor system for the Switchyard framework.
//!
//! This module provides the [`FromContext`] trait, which defines how types
//! can be extracted from a [`Context`] for use as handler parameters.

use std::ops::Deref;
use std::sync::Arc;

use switchyard_core::{Bot, BoxedBot, FromUpdate, Update, downcast_bot};

use crate::context::{Context, EventChat, EventFromUser, missing};
use crate::dispatcher::ErrorEvent;
use crate::error::{ExtractError, ExtractResult};
use crate::filters::{CommandObject, Deeplink};
use crate::middlewares::UpdateContext;

/// A trait for types that can be extracted from a [`Context`].
///
/// # Example
///
/// ```rust,ignore
/// struct Locale(String);
///
/// impl FromContext for Locale {
///     fn from_context(ctx: &Context) -> ExtractResult<Self> {
///         match ctx.update().as_deref() {
///             Some(Update::MessageCreated(m)) => Ok(Locale(m.user_locale.clone().unwrap_or_default())),
///             _ => Err(ExtractError::custom("no locale")),
///         }
///     }
/// }
/// ```
pub trait FromContext: Sized {
    /// Attempts to extract this type from the given context.
    fn from_context(ctx: &Context) -> ExtractResult<Self>;
}

/// Implementation for `Option<T>` where `T: FromContext`.
///
/// Turns a failed extraction into `None` instead of a handler error.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &Context) -> ExtractResult<Self> {
        Ok(T::from_context(ctx).ok())
    }
}

/// The context itself, for handlers that read or write arbitrary entries.
impl FromContext for Context {
    fn from_context(ctx: &Context) -> ExtractResult<Self> {
        Ok(ctx.clone())
    }
}

/// The whole update, whatever its kind.
impl FromContext for Update {
    fn from_context(ctx: &Context) -> ExtractResult<Self> {
        ctx.update()
            .map(|update| (*update).clone())
            .ok_or(ExtractError::MissingUpdate)
    }
}

/// The bot, as a trait object.
impl FromContext for BoxedBot {
    fn from_context(ctx: &Context) -> ExtractResult<Self> {
        ctx.bot().ok_or(ExtractError::MissingBot)
    }
}

/// A concrete bot type, for protocol-specific API calls:
///
/// ```rust,ignore
/// async fn handler(bot: Arc<HttpBot>) {
///     bot.send_message(chat_id, "hi").await.ok();
/// }
/// ```
impl<T: Bot + 'static> FromContext for Arc<T> {
    fn from_context(ctx: &Context) -> ExtractResult<Self> {
        let bot = ctx.bot().ok_or(ExtractError::MissingBot)?;
        downcast_bot::<T>(bot).ok_or_else(|| ExtractError::BotTypeMismatch {
            expected: std::any::type_name::<T>(),
        })
    }
}

macro_rules! impl_from_context_via_state {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromContext for $ty {
                fn from_context(ctx: &Context) -> ExtractResult<Self> {
                    ctx.get::<$ty>().ok_or_else(missing::<$ty>)
                }
            }
        )*
    };
}

impl_from_context_via_state!(
    UpdateContext,
    EventFromUser,
    EventChat,
    ErrorEvent,
    CommandObject,
    Deeplink,
);

// ============================================================================
// Event<T>
// ============================================================================

/// A typed update payload.
///
/// Extraction fails with [`ExtractError::UpdateKindMismatch`] if the update
/// is of another kind.
///
/// ```rust,ignore
/// async fn on_removed(event: Event<MessageRemoved>) {
///     println!("{} deleted {}", event.user_id, event.message_id);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Event<T>(pub T);

impl<T> Event<T> {
    /// Unwraps the payload.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Event<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: FromUpdate> FromContext for Event<T> {
    fn from_context(ctx: &Context) -> ExtractResult<Self> {
        let update = ctx.update().ok_or(ExtractError::MissingUpdate)?;
        T::from_update(&update)
            .cloned()
            .map(Event)
            .ok_or_else(|| ExtractError::UpdateKindMismatch {
                expected: T::KIND.as_str(),
                got: update.kind().as_str(),
            })
    }
}

// ============================================================================
// Extension<T>
// ============================================================================

/// Any value inserted into the context, typically by a middleware.
///
/// ```rust,ignore
/// router.update().outer_middleware(middleware_fn(move |ctx, next| {
///     let pool = pool.clone();
///     async move {
///         ctx.insert(pool);
///         next.run(&ctx).await
///     }
/// }));
///
/// async fn handler(Extension(pool): Extension<DbPool>) { /* ... */ }
/// ```
#[derive(Debug, Clone)]
pub struct Extension<T>(pub T);

impl<T> Deref for Extension<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Clone + Send + Sync + 'static> FromContext for Extension<T> {
    fn from_context(ctx: &Context) -> ExtractResult<Self> {
        ctx.get::<T>().map(Extension).ok_or_else(missing::<T>)
    }
}
