use serde::{Deserialize, Serialize};

use super::chat::ChatType;
use super::user::User;

/// Where a message was sent.
///
/// Group messages carry `chat_id`; dialog messages may carry only the
/// counterpart's `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default)]
    pub chat_id: Option<i64>,
    pub chat_type: ChatType,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Message content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    /// Message ID.
    pub mid: String,
    /// Sequence number within the chat.
    #[serde(default)]
    pub seq: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author; absent for channel posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<User>,
    pub recipient: Recipient,
    /// Creation time (unix milliseconds).
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<MessageBody>,
    /// Public link, for channel posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Message {
    /// Returns the text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.body.as_ref().and_then(|b| b.text.as_deref())
    }

    /// Returns the message ID, if the body is present.
    pub fn mid(&self) -> Option<&str> {
        self.body.as_ref().map(|b| b.mid.as_str())
    }
}

/// A button press on an inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    pub callback_id: String,
    /// Who pressed the button.
    pub user: User,
    /// Button payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub timestamp: i64,
}
