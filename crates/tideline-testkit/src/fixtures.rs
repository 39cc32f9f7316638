//! Record fixtures

use tideline_core::{ChannelId, MessageKey, Timestamp, UserId};
use tideline_store::{Channel, Message, Profile, User};

/// A regular channel.
pub fn channel(id: &str, name: &str) -> Channel {
    Channel::new(id, name)
}

/// A channel with unread state.
pub fn channel_with_unreads(id: &str, name: &str, mentions: u32, has_unreads: bool) -> Channel {
    Channel {
        mention_count: mentions,
        has_unreads,
        ..Channel::new(id, name)
    }
}

/// A direct message channel with `user`.
pub fn dm(id: &str, user: &str) -> Channel {
    Channel::direct(id, user)
}

/// A complete user record.
pub fn user(id: &str, name: &str, real_name: Option<&str>, avatar: &str) -> User {
    User {
        real_name: real_name.map(str::to_string),
        profile: Some(Profile {
            image_72: avatar.to_string(),
        }),
        ..User::new(id, name)
    }
}

/// A user record without its profile, as partial lookups return it.
pub fn partial_user(id: &str, name: &str) -> User {
    User::new(id, name)
}

/// A message posted at `secs` whole seconds.
pub fn message(channel: &str, secs: u64, user: &str, text: &str) -> Message {
    Message::new(channel, Timestamp::from_secs(secs), Some(UserId::new(user)), text)
}

/// Key of a message posted at `secs` whole seconds.
pub fn key(channel: &str, secs: u64) -> MessageKey {
    MessageKey::new(ChannelId::new(channel), Timestamp::from_secs(secs))
}
