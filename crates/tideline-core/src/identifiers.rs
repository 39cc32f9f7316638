//! Identifiers for remote records
//!
//! All identifiers are opaque strings assigned by the chat service. A record
//! is only unique within its [`SourceId`] (the account/workspace it came from).

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from its wire form.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The wire form of this identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// The remote account/workspace a record belongs to.
    SourceId
);

string_id!(
    /// A chat channel (public channel, private group or direct message).
    ChannelId
);

string_id!(
    /// A user of the chat service.
    UserId
);

/// Identity of one message: its timestamp within a channel.
///
/// Ordering is by timestamp first, then by channel, so keys from several
/// channels interleave chronologically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageKey {
    /// Service-assigned message timestamp
    pub timestamp: Timestamp,
    /// Channel the message was posted to
    pub channel: ChannelId,
}

impl MessageKey {
    /// Create a message key.
    pub fn new(channel: ChannelId, timestamp: Timestamp) -> Self {
        Self { timestamp, channel }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.channel, self.timestamp)
    }
}

/// Oldest-first comparator used by message windows.
pub fn message_key_compare(a: &MessageKey, b: &MessageKey) -> Ordering {
    a.cmp(b)
}
