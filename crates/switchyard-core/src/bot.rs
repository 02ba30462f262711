//! The Bot capability consumed by the routing layer.
//!
//! The HTTP client itself lives outside this workspace. Routing only needs
//! the two lookups the update-context resolver performs during enrichment,
//! so that is all the trait requires.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::{Chat, ChatMembersList};

/// A Bot API client as seen by the dispatcher.
///
/// Implementations are expected to be cheap to share (`Arc`) and to perform
/// their own request timeouts. Every method may fail with an
/// [`ApiError`](crate::ApiError); callers in the routing layer decide whether
/// a failure is fatal.
///
/// Concrete clients usually expose many more API methods. Handlers can reach
/// them by requesting `Arc<ConcreteBot>` instead of [`BoxedBot`], which goes
/// through [`downcast_bot`].
#[async_trait]
pub trait Bot: Send + Sync {
    /// Fetches a chat by its identifier.
    async fn get_chat(&self, chat_id: i64) -> ApiResult<Chat>;

    /// Fetches the membership records of the given users in a group chat.
    ///
    /// Users that are not members are omitted from the returned list.
    async fn get_members(&self, chat_id: i64, user_ids: &[i64]) -> ApiResult<ChatMembersList>;

    /// Returns self as an `Arc<dyn Any>` for safe downcasting.
    ///
    /// Implementors should simply return `self`:
    ///
    /// ```rust,ignore
    /// fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
    ///     self
    /// }
    /// ```
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A shared Bot trait object.
pub type BoxedBot = Arc<dyn Bot>;

/// Attempts to downcast a [`BoxedBot`] to a specific concrete type.
pub fn downcast_bot<T: Bot + 'static>(bot: BoxedBot) -> Option<Arc<T>> {
    Arc::downcast::<T>(bot.as_any()).ok()
}
