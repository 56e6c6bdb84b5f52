//! Models relating to channels and the messages sent in them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::{ChannelId, MessageId};
use super::user::User;
use super::Timestamp;

/// A representation of a message sent in a channel, as returned when a follow-up is created or an
/// original response is edited.
///
/// [Discord docs](https://discord.com/developers/docs/resources/channel#message-object).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct Message {
    /// The unique Id of the message.
    pub id: MessageId,
    /// The Id of the [`Channel`] that the message was sent to.
    ///
    /// [`Channel`]: https://discord.com/developers/docs/resources/channel#channel-object
    pub channel_id: ChannelId,
    /// The user that sent the message.
    pub author: Option<User>,
    /// The content of the message.
    #[serde(default)]
    pub content: String,
    /// Initial message creation timestamp, calculated from its Id.
    pub timestamp: Option<Timestamp>,
    /// Message flags.
    #[serde(default)]
    pub flags: Option<MessageFlags>,
}

impl Message {
    /// Whether the message is only visible to the user who invoked the interaction.
    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        self.flags.is_some_and(|flags| flags.contains(MessageFlags::EPHEMERAL))
    }
}

/// A direct message channel between the bot and one user.
///
/// [Discord docs](https://discord.com/developers/docs/resources/channel#channel-object).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct PrivateChannel {
    /// The unique Id of the private channel.
    pub id: ChannelId,
    /// The recipients of the channel, the bot excluded.
    #[serde(default)]
    pub recipients: Vec<User>,
}

bitflags::bitflags! {
    /// Describes extra features of the message.
    ///
    /// [Discord docs](https://discord.com/developers/docs/resources/channel#message-object-message-flags).
    #[derive(Copy, PartialEq, Eq, Clone, PartialOrd, Ord, Hash, Debug, Default)]
    pub struct MessageFlags: u64 {
        /// This message has been published to subscribed channels (via Channel Following).
        const CROSSPOSTED = 1 << 0;
        /// Do not include any embeds when serializing this message.
        const SUPPRESS_EMBEDS = 1 << 2;
        /// This message is only visible to the user who invoked the Interaction.
        const EPHEMERAL = 1 << 6;
        /// This message is an Interaction Response and the bot is "thinking".
        const LOADING = 1 << 7;
        /// This message will not trigger push and desktop notifications.
        const SUPPRESS_NOTIFICATIONS = 1 << 12;
    }
}

impl Serialize for MessageFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.bits())
    }
}

impl<'de> Deserialize<'de> for MessageFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_bits_retain(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn message_flags_roundtrip_unknown_bits() {
        let message: Message = serde_json::from_value(json!({
            "id": "1",
            "channel_id": "2",
            "content": "hello",
            "flags": 64_u64 | (1 << 40),
        }))
        .unwrap();

        assert!(message.is_ephemeral());
        assert_eq!(serde_json::to_value(message.flags).unwrap(), json!(64_u64 | (1 << 40)));
    }
}
