//! Resolution of the chat and user an update belongs to.
//!
//! [`UpdateContextMiddleware`] runs as the dispatcher's update-level outer
//! middleware. For every update it publishes an [`UpdateContext`] and, when
//! a user is known, an [`EventFromUser`]. Both are resolved from the update
//! alone:
//!
//! | Kinds | `chat_id` | `user_id` | `type` |
//! |-------|-----------|-----------|--------|
//! | `bot_*`, `user_*`, `chat_title_changed`, `dialog_*` | payload | payload user | channel/chat from `is_channel` where present |
//! | `message_callback` | message recipient | callback user | recipient chat type |
//! | `message_created`, `message_edited` | recipient chat, else recipient user | sender | recipient chat type |
//! | `message_removed` | payload | payload | unknown |
//! | `message_chat_created` | created chat | none | created chat type |
//!
//! # Enrichment
//!
//! With enrichment enabled (on the middleware or per update through
//! [`EnrichUpdateContext`](crate::EnrichUpdateContext)) and a bot in the
//! context, the resolver also fetches the chat, which fixes the chat type
//! and publishes an [`EventChat`]. If the user is still unknown it is looked
//! up as a chat member in group chats, or taken from the dialog in dialogs.
//! API failures are logged and swallowed; the update is dispatched with
//! whatever was resolved.

use async_trait::async_trait;
use tracing::{debug, warn};

use switchyard_core::{BoxedBot, Chat, ChatType, Message, Update, User};

use crate::context::{Context, EventChat, EventFromUser};
use crate::middleware::{Middleware, Next};
use crate::outcome::HandlerResult;

/// Where an update happened and who caused it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateContext {
    pub chat_id: Option<i64>,
    pub user_id: Option<i64>,
    /// Chat type, if the update or enrichment revealed it.
    pub r#type: Option<ChatType>,
    /// Set by enrichment, or taken from a `message_chat_created` payload.
    pub chat: Option<Chat>,
    pub user: Option<User>,
}

impl UpdateContext {
    /// Resolves what the update itself says, without any API call.
    pub fn resolve(update: &Update) -> Self {
        macro_rules! with_chat_and_user {
            ($payload:expr, $chat_type:expr) => {
                Self {
                    chat_id: Some($payload.chat_id),
                    user_id: Some($payload.user.user_id),
                    r#type: $chat_type,
                    chat: None,
                    user: Some($payload.user.clone()),
                }
            };
        }

        match update {
            Update::BotAdded(e) => with_chat_and_user!(e, Some(group_type(e.is_channel))),
            Update::BotRemoved(e) => with_chat_and_user!(e, Some(group_type(e.is_channel))),
            Update::UserAdded(e) => with_chat_and_user!(e, Some(group_type(e.is_channel))),
            Update::UserRemoved(e) => with_chat_and_user!(e, Some(group_type(e.is_channel))),
            Update::BotStarted(e) => with_chat_and_user!(e, None),
            Update::BotStopped(e) => with_chat_and_user!(e, None),
            Update::ChatTitleChanged(e) => with_chat_and_user!(e, None),
            Update::DialogMuted(e) => with_chat_and_user!(e, None),
            Update::DialogUnmuted(e) => with_chat_and_user!(e, None),
            Update::DialogCleared(e) => with_chat_and_user!(e, None),
            Update::DialogRemoved(e) => with_chat_and_user!(e, None),
            Update::MessageCallback(e) => {
                let user = e.callback.user.clone();
                let mut resolved = e.message.as_ref().map(from_message).unwrap_or_default();
                resolved.user_id = Some(user.user_id);
                resolved.user = Some(user);
                resolved
            }
            Update::MessageChatCreated(e) => Self {
                chat_id: Some(e.chat.chat_id),
                r#type: Some(e.chat.r#type),
                chat: Some(e.chat.clone()),
                ..Self::default()
            },
            Update::MessageCreated(e) => from_message(&e.message),
            Update::MessageEdited(e) => from_message(&e.message),
            Update::MessageRemoved(e) => Self {
                chat_id: Some(e.chat_id),
                user_id: Some(e.user_id),
                ..Self::default()
            },
        }
    }

    /// Alias for the `type` field.
    pub fn chat_type(&self) -> Option<ChatType> {
        self.r#type
    }
}

fn group_type(is_channel: bool) -> ChatType {
    if is_channel {
        ChatType::Channel
    } else {
        ChatType::Chat
    }
}

fn from_message(message: &Message) -> UpdateContext {
    let recipient = &message.recipient;
    UpdateContext {
        chat_id: recipient.chat_id.or(recipient.user_id),
        user_id: message.sender.as_ref().map(|u| u.user_id),
        r#type: Some(recipient.chat_type),
        chat: None,
        user: message.sender.clone(),
    }
}

/// Publishes the [`UpdateContext`] and [`EventFromUser`] of every update.
///
/// Installed by [`Dispatcher::new`](crate::Dispatcher::new). Build one with
/// enrichment on and pass it to
/// [`Dispatcher::with_update_context`](crate::Dispatcher::with_update_context)
/// to always enrich.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateContextMiddleware {
    enrich: bool,
}

impl UpdateContextMiddleware {
    pub fn new(enrich: bool) -> Self {
        Self { enrich }
    }

    /// Returns `true` if every update is enriched.
    pub fn enriches(&self) -> bool {
        self.enrich
    }

    async fn enrich(&self, bot: &BoxedBot, resolved: &mut UpdateContext, ctx: &Context) {
        let Some(chat_id) = resolved.chat_id else {
            return;
        };

        debug!(chat_id, "enriching update context");
        let chat = match bot.get_chat(chat_id).await {
            Ok(chat) => chat,
            Err(error) => {
                warn!(chat_id, %error, "failed to enrich update context");
                return;
            }
        };
        resolved.r#type = Some(chat.r#type);
        ctx.insert(EventChat(chat.clone()));
        let dialog_user = chat.dialog_with_user.clone();
        resolved.chat = Some(chat);

        let Some(user_id) = resolved.user_id.filter(|_| resolved.user.is_none()) else {
            return;
        };
        match resolved.r#type {
            Some(ChatType::Chat) => match bot.get_members(chat_id, &[user_id]).await {
                Ok(list) => resolved.user = list.members.into_iter().next().map(|m| m.user),
                Err(error) => warn!(chat_id, user_id, %error, "failed to load chat member"),
            },
            Some(ChatType::Dialog) => resolved.user = dialog_user,
            _ => {}
        }
    }
}

#[async_trait]
impl Middleware for UpdateContextMiddleware {
    async fn call(&self, update: &Update, ctx: &Context, next: Next) -> HandlerResult {
        let mut resolved = UpdateContext::resolve(update);
        if let Some(user) = &resolved.user {
            ctx.insert(EventFromUser(user.clone()));
        }

        if (self.enrich || ctx.enrich_requested())
            && let Some(bot) = ctx.bot()
        {
            self.enrich(&bot, &mut resolved, ctx).await;
        }

        if let Some(user) = &resolved.user
            && !ctx.contains::<EventFromUser>()
        {
            ctx.insert(EventFromUser(user.clone()));
        }
        ctx.insert(resolved);

        next.run(ctx).await
    }
}
