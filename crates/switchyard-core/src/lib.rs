//! # Switchyard Core
//!
//! Data model and capability types shared by every Switchyard crate.
//!
//! This crate knows nothing about routing. It provides:
//!
//! - **Update model**: the [`Update`] sum type with one payload struct per
//!   inbound event kind, plus the fieldless [`UpdateKind`] discriminator
//! - **Platform objects**: [`User`], [`Chat`], [`Message`], [`ChatMember`] and
//!   friends, deserializable from the Bot API JSON
//! - **Bot capability**: the [`Bot`] trait the routing layer calls into for
//!   chat and membership lookups, and [`BoxedBot`] for type erasure
//! - **API errors**: [`ApiError`], the failure taxonomy of Bot API calls
//!
//! ## Example
//!
//! ```rust,ignore
//! use switchyard_core::{Update, UpdateKind};
//!
//! let update: Update = serde_json::from_str(raw)?;
//! assert_eq!(update.kind(), UpdateKind::MessageCreated);
//! ```

pub mod bot;
pub mod error;
pub mod types;

pub use bot::{Bot, BoxedBot, downcast_bot};
pub use error::{ApiError, ApiResult};
pub use types::{
    BotAdded, BotRemoved, BotStarted, BotStopped, Callback, Chat, ChatMember, ChatMembersList,
    ChatStatus, ChatTitleChanged, ChatType, DialogCleared, DialogMuted, DialogRemoved,
    DialogUnmuted, FromUpdate, Message, MessageBody, MessageCallback, MessageChatCreated, MessageCreated,
    MessageEdited, MessageRemoved, Recipient, Update, UpdateKind, User, UserAdded, UserRemoved,
};
