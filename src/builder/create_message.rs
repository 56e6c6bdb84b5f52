use serde::Serialize;

use super::{CreateActionRow, CreateAllowedMentions, CreateEmbed};
use crate::model::channel::MessageFlags;

/// A builder for the message carried by an interaction reply, an edit of the original response,
/// or a follow-up.
///
/// Plain strings convert into a content-only message, so `interaction.send_reply("pong", false)`
/// works as well as a fully built message.
///
/// # Examples
///
/// ```rust
/// use tempest::builder::{CreateButton, CreateActionRow, CreateEmbed, CreateMessage};
///
/// let message = CreateMessage::new()
///     .content("Pick one")
///     .embed(CreateEmbed::new().title("Poll"))
///     .components(vec![CreateActionRow::buttons(vec![
///         CreateButton::new("poll-yes").label("Yes"),
///         CreateButton::new("poll-no").label("No"),
///     ])]);
/// ```
///
/// [Discord docs](https://discord.com/developers/docs/interactions/receiving-and-responding#interaction-response-object-messages).
#[derive(Clone, Debug, Default, Serialize)]
#[must_use]
pub struct CreateMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tts: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<CreateEmbed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_mentions: Option<CreateAllowedMentions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    components: Option<Vec<CreateActionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<MessageFlags>,
}

impl CreateMessage {
    /// Equivalent to [`Self::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content of the message.
    ///
    /// **Note**: Message contents must be under 2000 unicode code points.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set whether the message is text-to-speech.
    pub fn tts(mut self, tts: bool) -> Self {
        self.tts = Some(tts);
        self
    }

    /// Adds an embed to the message.
    pub fn embed(mut self, embed: CreateEmbed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Replaces the embeds of the message.
    pub fn embeds(mut self, embeds: Vec<CreateEmbed>) -> Self {
        self.embeds = embeds;
        self
    }

    /// Set the allowed mentions for the message.
    pub fn allowed_mentions(mut self, allowed_mentions: CreateAllowedMentions) -> Self {
        self.allowed_mentions = Some(allowed_mentions);
        self
    }

    /// Sets the components of this message. An empty list removes the components of an edited
    /// message.
    pub fn components(mut self, components: Vec<CreateActionRow>) -> Self {
        self.components = Some(components);
        self
    }

    /// Sets the flags for the message, replacing any set before.
    pub fn flags(mut self, flags: MessageFlags) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Adds or removes the ephemeral flag, leaving other flags untouched.
    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        let mut flags = self.flags.unwrap_or_else(MessageFlags::empty);
        flags.set(MessageFlags::EPHEMERAL, ephemeral);

        self.flags = (!flags.is_empty()).then_some(flags);
        self
    }
}

impl From<&str> for CreateMessage {
    fn from(content: &str) -> Self {
        Self::new().content(content)
    }
}

impl From<String> for CreateMessage {
    fn from(content: String) -> Self {
        Self::new().content(content)
    }
}

impl From<CreateEmbed> for CreateMessage {
    fn from(embed: CreateEmbed) -> Self {
        Self::new().embed(embed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ephemeral_toggles_only_its_flag() {
        let message = CreateMessage::from("hi").ephemeral(true);
        assert_eq!(serde_json::to_value(&message).unwrap(), json!({"content": "hi", "flags": 64}));

        let message = message.flags(MessageFlags::SUPPRESS_EMBEDS | MessageFlags::EPHEMERAL);
        let message = message.ephemeral(false);
        assert_eq!(serde_json::to_value(&message).unwrap(), json!({"content": "hi", "flags": 4}));

        let message = CreateMessage::new().ephemeral(false);
        assert_eq!(serde_json::to_value(&message).unwrap(), json!({}));
    }
}
