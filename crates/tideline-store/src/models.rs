//! Remote record shapes
//!
//! Field names follow the chat service's wire format so records decode
//! straight from API responses and real-time events.

use serde::{Deserialize, Serialize};
use tideline_core::{ChannelId, MessageKey, Timestamp, UserId};

/// A channel, private group or direct message conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel id
    pub id: ChannelId,
    /// Channel name; for direct messages usually the peer's user id
    #[serde(default)]
    pub name: String,
    /// Whether this is a direct message conversation
    #[serde(default)]
    pub is_im: bool,
    /// Peer of a direct message conversation
    #[serde(default, rename = "user", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Starred by the current user
    #[serde(default)]
    pub is_starred: bool,
    /// Unread mentions of the current user
    #[serde(default)]
    pub mention_count: u32,
    /// Whether unread messages exist
    #[serde(default)]
    pub has_unreads: bool,
}

impl Channel {
    /// A regular named channel.
    pub fn new(id: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_im: false,
            user_id: None,
            is_starred: false,
            mention_count: 0,
            has_unreads: false,
        }
    }

    /// A direct message conversation with `user`.
    pub fn direct(id: impl Into<ChannelId>, user: impl Into<UserId>) -> Self {
        let user = user.into();
        Self {
            name: user.to_string(),
            is_im: true,
            user_id: Some(user),
            ..Self::new(id, "")
        }
    }

    /// Whether this is a direct message conversation.
    pub fn is_dm(&self) -> bool {
        self.is_im
    }

    /// Peer user of a direct message conversation.
    pub fn dm_peer(&self) -> Option<&UserId> {
        if self.is_im {
            self.user_id.as_ref()
        } else {
            None
        }
    }
}

/// Profile details of a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// 72px avatar URL
    #[serde(default)]
    pub image_72: String,
}

/// A user of the chat service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id
    pub id: UserId,
    /// Handle
    #[serde(default)]
    pub name: String,
    /// Full name, if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    /// Profile; absent in partial records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

impl User {
    /// A user with only a handle.
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            real_name: None,
            profile: None,
        }
    }

    /// Best available display name: real name, then handle.
    pub fn display_name(&self) -> Option<&str> {
        self.real_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(Some(self.name.as_str()).filter(|n| !n.is_empty()))
    }
}

/// A chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Channel the message was posted to
    pub channel: ChannelId,
    /// Service timestamp; unique within the channel
    pub ts: Timestamp,
    /// Sender; absent for bot and system messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    /// Message text
    #[serde(default)]
    pub text: String,
}

impl Message {
    /// Create a message.
    pub fn new(
        channel: impl Into<ChannelId>,
        ts: Timestamp,
        user: Option<UserId>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            ts,
            user,
            text: text.into(),
        }
    }

    /// Identity of this message.
    pub fn key(&self) -> MessageKey {
        MessageKey::new(self.channel.clone(), self.ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_decodes_wire_shape() {
        let channel: Channel = serde_json::from_str(
            r#"{"id":"D1","name":"U9","is_im":true,"user":"U9","mention_count":2}"#,
        )
        .unwrap();
        assert!(channel.is_dm());
        assert_eq!(channel.dm_peer(), Some(&UserId::new("U9")));
        assert_eq!(channel.mention_count, 2);
        assert!(!channel.has_unreads);
    }

    #[test]
    fn test_user_display_name_fallbacks() {
        let mut user = User::new("U1", "ann");
        assert_eq!(user.display_name(), Some("ann"));
        user.real_name = Some(String::new());
        assert_eq!(user.display_name(), Some("ann"));
        user.real_name = Some("Ann Example".into());
        assert_eq!(user.display_name(), Some("Ann Example"));
        user.name.clear();
        user.real_name = None;
        assert_eq!(user.display_name(), None);
    }

    #[test]
    fn test_message_decodes_string_timestamp() {
        let message: Message = serde_json::from_str(
            r#"{"channel":"C1","ts":"1512085950.000216","user":"U1","text":"hi"}"#,
        )
        .unwrap();
        assert_eq!(message.ts.as_secs(), 1_512_085_950);
        assert_eq!(message.key().channel, ChannelId::new("C1"));
    }
}
