//! Remote chat service contract

use crate::models::{Channel, Message, User};
use async_trait::async_trait;
use tideline_core::{ChannelId, Result, SourceId, Timestamp, UserId};

/// Access to one account on the chat service.
///
/// Implementations live with the transport; the engine only needs these
/// lookups. `Ok(None)` means the record does not exist.
#[async_trait(?Send)]
pub trait ChatApi {
    /// The account this API talks to.
    fn source(&self) -> SourceId;

    /// Look up a channel.
    async fn channel_info(&self, channel: &ChannelId) -> Result<Option<Channel>>;

    /// Look up a user.
    async fn user_info(&self, user: &UserId) -> Result<Option<User>>;

    /// Messages of `channel` with `oldest <= ts < latest`, in any order.
    async fn history(
        &self,
        channel: &ChannelId,
        oldest: Timestamp,
        latest: Timestamp,
    ) -> Result<Vec<Message>>;
}
