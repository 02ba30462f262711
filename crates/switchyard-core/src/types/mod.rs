//! Bot API data model.
//!
//! Field names follow the platform's JSON so every type deserializes
//! directly from API responses and update payloads.

pub mod chat;
pub mod message;
pub mod update;
pub mod user;

pub use chat::{Chat, ChatMember, ChatMembersList, ChatStatus, ChatType};
pub use message::{Callback, Message, MessageBody, Recipient};
pub use update::{
    BotAdded, BotRemoved, BotStarted, BotStopped, ChatTitleChanged, DialogCleared, DialogMuted,
    DialogRemoved, DialogUnmuted, FromUpdate, MessageCallback, MessageChatCreated, MessageCreated,
    MessageEdited, MessageRemoved, Update, UpdateKind, UserAdded, UserRemoved,
};
pub use user::User;
