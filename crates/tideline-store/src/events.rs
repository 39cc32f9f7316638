//! Remote events pushed by the chat service

use crate::models::{Channel, Message, User};
use serde::Deserialize;
use tideline_core::{ChannelId, Result, SourceId, Timestamp};

/// A change announced by the remote service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// A new message was posted.
    Message {
        /// Account the event arrived on
        source: SourceId,
        /// The message
        message: Message,
    },
    /// A channel was created, joined or updated.
    Channel {
        /// Account the event arrived on
        source: SourceId,
        /// The channel
        channel: Channel,
    },
    /// The current user read a channel up to `ts`.
    ChannelMarked {
        /// Account the event arrived on
        source: SourceId,
        /// Channel that was read
        channel: ChannelId,
        /// Read marker
        ts: Timestamp,
    },
    /// A user's profile changed.
    User {
        /// Account the event arrived on
        source: SourceId,
        /// The user
        user: User,
    },
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    subtype: Option<String>,
}

#[derive(Deserialize)]
struct ChannelPayload {
    channel: Channel,
}

#[derive(Deserialize)]
struct MarkedPayload {
    channel: ChannelId,
    ts: Timestamp,
}

#[derive(Deserialize)]
struct UserPayload {
    user: User,
}

impl StoreEvent {
    /// Account the event arrived on.
    pub fn source(&self) -> &SourceId {
        match self {
            Self::Message { source, .. }
            | Self::Channel { source, .. }
            | Self::ChannelMarked { source, .. }
            | Self::User { source, .. } => source,
        }
    }

    /// Decode one real-time event.
    ///
    /// Event types the engine does not track (typing indicators, presence,
    /// edited messages, ...) decode to `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `TidelineError::Serialization` for malformed JSON or a known
    /// event type with an invalid body.
    pub fn from_json(source: &SourceId, text: &str) -> Result<Option<Self>> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let envelope = Envelope::deserialize(&value)?;
        let source = source.clone();
        let event = match (envelope.kind.as_str(), envelope.subtype.as_deref()) {
            ("message", None) => Self::Message {
                source,
                message: Message::deserialize(&value)?,
            },
            ("channel_created" | "channel_joined" | "im_created", _) => Self::Channel {
                source,
                channel: ChannelPayload::deserialize(&value)?.channel,
            },
            ("channel_marked" | "im_marked", _) => {
                let marked = MarkedPayload::deserialize(&value)?;
                Self::ChannelMarked {
                    source,
                    channel: marked.channel,
                    ts: marked.ts,
                }
            }
            ("user_change", _) => Self::User {
                source,
                user: UserPayload::deserialize(&value)?.user,
            },
            (kind, subtype) => {
                tracing::trace!(kind, ?subtype, "ignoring untracked event");
                return Ok(None);
            }
        };
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tideline_core::TidelineError;

    fn source() -> SourceId {
        SourceId::new("T1")
    }

    #[test]
    fn test_decode_message() {
        let event = StoreEvent::from_json(
            &source(),
            r#"{"type":"message","channel":"C1","user":"U1","text":"hi","ts":"100.000001"}"#,
        )
        .unwrap()
        .unwrap();
        match event {
            StoreEvent::Message { message, .. } => {
                assert_eq!(message.text, "hi");
                assert_eq!(message.ts, Timestamp::from_micros(100_000_001));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_decode_channel_events() {
        let created = StoreEvent::from_json(
            &source(),
            r#"{"type":"channel_created","channel":{"id":"C2","name":"general"}}"#,
        )
        .unwrap();
        assert!(matches!(created, Some(StoreEvent::Channel { ref channel, .. }) if channel.name == "general"));

        let marked = StoreEvent::from_json(
            &source(),
            r#"{"type":"channel_marked","channel":"C2","ts":"5.0"}"#,
        )
        .unwrap();
        assert!(matches!(marked, Some(StoreEvent::ChannelMarked { .. })));
    }

    #[test]
    fn test_decode_user_change() {
        let event = StoreEvent::from_json(
            &source(),
            r#"{"type":"user_change","user":{"id":"U1","name":"ann","profile":{"image_72":"a.png"}}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(event.source(), &source());
        assert!(matches!(event, StoreEvent::User { ref user, .. } if user.profile.is_some()));
    }

    #[test]
    fn test_untracked_events_are_skipped() {
        assert_eq!(
            StoreEvent::from_json(&source(), r#"{"type":"user_typing","channel":"C1"}"#).unwrap(),
            None
        );
        assert_eq!(
            StoreEvent::from_json(
                &source(),
                r#"{"type":"message","subtype":"message_changed","channel":"C1"}"#
            )
            .unwrap(),
            None
        );
    }

    #[test]
    fn test_malformed_events_fail() {
        assert!(StoreEvent::from_json(&source(), "{not json").is_err());
        assert!(matches!(
            StoreEvent::from_json(&source(), r#"{"type":"message","channel":"C1"}"#),
            Err(TidelineError::Serialization { .. })
        ));
    }
}
