//! Inbound updates.
//!
//! Every update the platform delivers is one variant of [`Update`]. Variants
//! wrap a payload struct of the same name, so code that knows which kind it
//! expects can borrow the payload directly through [`FromUpdate`]:
//!
//! ```rust,ignore
//! use switchyard_core::{FromUpdate, MessageCreated, Update};
//!
//! if let Some(created) = MessageCreated::from_update(&update) {
//!     println!("{:?}", created.message.text());
//! }
//! ```
//!
//! On the wire, updates are JSON objects tagged by `update_type`:
//!
//! ```text
//! {"update_type": "bot_started", "chat_id": 1, "user": {...}, "timestamp": 0}
//! ```

use serde::{Deserialize, Serialize};

use super::chat::Chat;
use super::message::{Callback, Message};
use super::user::User;

// ============================================================================
// Payloads
// ============================================================================

/// A new message was posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCreated {
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
    pub timestamp: i64,
}

/// A message was edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEdited {
    pub message: Message,
    pub timestamp: i64,
}

/// A message was deleted.
///
/// Only identifiers survive deletion; there is no embedded user object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRemoved {
    pub message_id: String,
    pub chat_id: i64,
    /// Who deleted the message.
    pub user_id: i64,
    pub timestamp: i64,
}

/// An inline keyboard button was pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCallback {
    pub callback: Callback,
    /// The message carrying the keyboard. Absent if it was deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
    pub timestamp: i64,
}

/// A chat was created from a chat button the bot posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageChatCreated {
    pub chat: Chat,
    /// The message holding the chat button.
    pub message_id: String,
    /// Payload attached to the button, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_payload: Option<String>,
    pub timestamp: i64,
}

/// The bot was added to a chat or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotAdded {
    pub chat_id: i64,
    /// Who added the bot.
    pub user: User,
    #[serde(default)]
    pub is_channel: bool,
    pub timestamp: i64,
}

/// The bot was removed from a chat or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotRemoved {
    pub chat_id: i64,
    /// Who removed the bot.
    pub user: User,
    #[serde(default)]
    pub is_channel: bool,
    pub timestamp: i64,
}

/// A user pressed "Start" in a dialog with the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStarted {
    pub chat_id: i64,
    pub user: User,
    /// Deep link payload, if the dialog was opened through one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
    pub timestamp: i64,
}

/// A user stopped the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStopped {
    pub chat_id: i64,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
    pub timestamp: i64,
}

/// A user joined a chat or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAdded {
    pub chat_id: i64,
    /// The user who joined.
    pub user: User,
    /// Who invited the user; absent when joining by link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inviter_id: Option<i64>,
    #[serde(default)]
    pub is_channel: bool,
    pub timestamp: i64,
}

/// A user left or was removed from a chat or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRemoved {
    pub chat_id: i64,
    /// The user who left.
    pub user: User,
    /// The administrator who removed the user; absent when the user left.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<i64>,
    #[serde(default)]
    pub is_channel: bool,
    pub timestamp: i64,
}

/// A chat title was changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTitleChanged {
    pub chat_id: i64,
    /// Who changed the title.
    pub user: User,
    pub title: String,
    pub timestamp: i64,
}

/// A user muted the dialog with the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogMuted {
    pub chat_id: i64,
    pub user: User,
    /// Mute expiry (unix milliseconds).
    pub muted_until: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
    pub timestamp: i64,
}

/// A user unmuted the dialog with the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogUnmuted {
    pub chat_id: i64,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
    pub timestamp: i64,
}

/// A user cleared the dialog history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogCleared {
    pub chat_id: i64,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
    pub timestamp: i64,
}

/// A user deleted the dialog with the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogRemoved {
    pub chat_id: i64,
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
    pub timestamp: i64,
}

// ============================================================================
// FromUpdate
// ============================================================================

/// Borrowing access to a concrete payload inside an [`Update`].
///
/// Implemented for every payload struct. Returns `None` when the update is
/// of a different kind.
pub trait FromUpdate: Clone + Send + Sync + 'static {
    /// The kind this payload belongs to.
    const KIND: UpdateKind;

    fn from_update(update: &Update) -> Option<&Self>;
}

// ============================================================================
// Update / UpdateKind
// ============================================================================

macro_rules! define_updates {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// One inbound event from the messaging platform.
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(tag = "update_type")]
        pub enum Update {
            $(
                #[serde(rename = $name)]
                $variant($variant),
            )*
        }

        /// The fieldless discriminator of [`Update`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum UpdateKind {
            $($variant,)*
        }

        impl UpdateKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [UpdateKind] = &[$(Self::$variant,)*];

            /// Number of kinds.
            pub const COUNT: usize = Self::ALL.len();

            /// The wire name (`update_type` tag) of this kind.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// Parses a wire name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Dense index in `0..COUNT`, usable as an array slot.
            pub fn index(self) -> usize {
                self as usize
            }
        }

        impl Update {
            /// Returns the kind of this update.
            pub fn kind(&self) -> UpdateKind {
                match self {
                    $(Self::$variant(_) => UpdateKind::$variant,)*
                }
            }

            /// Returns the update timestamp (unix milliseconds).
            pub fn timestamp(&self) -> i64 {
                match self {
                    $(Self::$variant(payload) => payload.timestamp,)*
                }
            }
        }

        $(
            impl From<$variant> for Update {
                fn from(payload: $variant) -> Self {
                    Self::$variant(payload)
                }
            }

            impl FromUpdate for $variant {
                const KIND: UpdateKind = UpdateKind::$variant;

                fn from_update(update: &Update) -> Option<&Self> {
                    match update {
                        Update::$variant(payload) => Some(payload),
                        _ => None,
                    }
                }
            }
        )*
    };
}

define_updates! {
    MessageCreated => "message_created",
    MessageEdited => "message_edited",
    MessageRemoved => "message_removed",
    MessageCallback => "message_callback",
    MessageChatCreated => "message_chat_created",
    BotAdded => "bot_added",
    BotRemoved => "bot_removed",
    BotStarted => "bot_started",
    BotStopped => "bot_stopped",
    UserAdded => "user_added",
    UserRemoved => "user_removed",
    ChatTitleChanged => "chat_title_changed",
    DialogMuted => "dialog_muted",
    DialogUnmuted => "dialog_unmuted",
    DialogCleared => "dialog_cleared",
    DialogRemoved => "dialog_removed",
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatType;

    #[test]
    fn test_deserialize_message_created() {
        let raw = r#"{
            "update_type": "message_created",
            "timestamp": 1700000000000,
            "user_locale": "en",
            "message": {
                "sender": {"user_id": 5, "first_name": "Ann"},
                "recipient": {"chat_id": 10, "chat_type": "chat"},
                "timestamp": 1700000000000,
                "body": {"mid": "m1", "seq": 1, "text": "/start"}
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        assert_eq!(update.kind(), UpdateKind::MessageCreated);
        assert_eq!(update.timestamp(), 1_700_000_000_000);

        let created = MessageCreated::from_update(&update).unwrap();
        assert_eq!(created.message.recipient.chat_type, ChatType::Chat);
        assert_eq!(created.message.text(), Some("/start"));
        assert!(MessageEdited::from_update(&update).is_none());
    }

    #[test]
    fn test_deserialize_message_removed_has_no_user_object() {
        let raw = r#"{"update_type": "message_removed", "message_id": "m1",
                      "chat_id": 3, "user_id": 4, "timestamp": 0}"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        match update {
            Update::MessageRemoved(removed) => {
                assert_eq!(removed.chat_id, 3);
                assert_eq!(removed.user_id, 4);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_message_chat_created() {
        let raw = r#"{"update_type": "message_chat_created", "message_id": "m7",
                      "chat": {"chat_id": 30, "type": "chat", "title": "Support"},
                      "start_payload": "ticket-1", "timestamp": 5}"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        assert_eq!(update.kind(), UpdateKind::MessageChatCreated);
        assert_eq!(update.timestamp(), 5);

        let created = MessageChatCreated::from_update(&update).unwrap();
        assert_eq!(created.chat.chat_id, 30);
        assert_eq!(created.chat.r#type, ChatType::Chat);
        assert_eq!(created.start_payload.as_deref(), Some("ticket-1"));
    }

    #[test]
    fn test_serialize_uses_update_type_tag() {
        let update = Update::from(BotStarted {
            chat_id: 1,
            user: User::new(2, "Bo"),
            payload: Some("ref".into()),
            user_locale: None,
            timestamp: 0,
        });
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value["update_type"], "bot_started");
        assert_eq!(value["payload"], "ref");
    }

    #[test]
    fn test_kind_names_are_unique_and_parse_back() {
        assert_eq!(UpdateKind::COUNT, 16);
        for (i, kind) in UpdateKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(UpdateKind::from_name(kind.as_str()), Some(*kind));
        }
        assert_eq!(UpdateKind::from_name("nope"), None);
    }
}
