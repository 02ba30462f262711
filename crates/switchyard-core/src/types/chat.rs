use serde::{Deserialize, Serialize};

use super::user::User;

/// Kind of chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    /// One-to-one conversation between the bot and a user.
    Dialog,
    /// Group chat.
    Chat,
    /// Broadcast channel.
    Channel,
}

impl ChatType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dialog => "dialog",
            Self::Chat => "chat",
            Self::Channel => "channel",
        }
    }
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bot's relationship with a chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    /// The bot is an active participant.
    #[default]
    Active,
    /// The bot was removed.
    Removed,
    /// The bot left voluntarily.
    Left,
    /// The chat was closed.
    Closed,
    /// The chat was suspended by the platform.
    Suspended,
}

/// A chat as returned by `GET /chats/{chat_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: i64,
    /// Chat kind.
    pub r#type: ChatType,
    #[serde(default)]
    pub status: ChatStatus,
    /// Title; absent for dialogs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub last_event_time: i64,
    #[serde(default)]
    pub participants_count: i64,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The other participant of a dialog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog_with_user: Option<User>,
}

impl Chat {
    /// Creates an active chat with only its ID and kind set.
    pub fn new(chat_id: i64, r#type: ChatType) -> Self {
        Self {
            chat_id,
            r#type,
            status: ChatStatus::Active,
            title: None,
            last_event_time: 0,
            participants_count: 0,
            is_public: false,
            description: None,
            dialog_with_user: None,
        }
    }
}

/// A user's membership record in a group chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMember {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub is_admin: bool,
    /// Join time (unix milliseconds).
    #[serde(default)]
    pub join_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access_time: Option<i64>,
    /// Member title shown in the chat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ChatMember {
    /// Wraps a user as a plain (non-admin) member.
    pub fn new(user: User) -> Self {
        Self {
            user,
            is_owner: false,
            is_admin: false,
            join_time: 0,
            last_access_time: None,
            alias: None,
        }
    }
}

/// A page of chat members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMembersList {
    pub members: Vec<ChatMember>,
    /// Cursor for the next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_member_flattens_user() {
        let member: ChatMember = serde_json::from_str(
            r#"{"user_id": 5, "first_name": "Ann", "is_admin": true, "join_time": 100}"#,
        )
        .unwrap();
        assert_eq!(member.user.user_id, 5);
        assert!(member.is_admin);
        assert!(!member.is_owner);
    }

    #[test]
    fn test_chat_deserialize_dialog() {
        let chat: Chat = serde_json::from_str(
            r#"{"chat_id": 3, "type": "dialog", "dialog_with_user": {"user_id": 9, "first_name": "Bo"}}"#,
        )
        .unwrap();
        assert_eq!(chat.r#type, ChatType::Dialog);
        assert_eq!(chat.status, ChatStatus::Active);
        assert_eq!(chat.dialog_with_user.map(|u| u.user_id), Some(9));
    }
}
