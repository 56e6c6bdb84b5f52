use serde::ser::SerializeMap as _;
use serde::{Serialize, Serializer};

use crate::model::application::{ButtonStyle, ComponentType};

/// A builder for creating a components action row in a message.
///
/// [Discord docs](https://discord.com/developers/docs/interactions/message-components#component-object).
#[derive(Clone, Debug)]
#[must_use]
pub enum CreateActionRow {
    Buttons(Vec<CreateButton>),
}

impl CreateActionRow {
    /// A row of up to five buttons.
    pub fn buttons(buttons: Vec<CreateButton>) -> Self {
        Self::Buttons(buttons)
    }
}

impl Serialize for CreateActionRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", &ComponentType::ActionRow)?;

        match self {
            CreateActionRow::Buttons(buttons) => map.serialize_entry("components", &buttons)?,
        }

        map.end()
    }
}

/// A builder for creating a button component in a message
#[derive(Clone, Debug, Serialize)]
#[must_use]
pub struct CreateButton {
    style: ButtonStyle,
    #[serde(rename = "type")]
    kind: ComponentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emoji: Option<ButtonEmoji>,
    #[serde(default)]
    disabled: bool,
}

impl CreateButton {
    /// Creates a normal button with the given custom ID. You must also set [`Self::label`] and/or
    /// [`Self::emoji`] after this.
    ///
    /// Clicks on it can be awaited through [`ButtonWaiters`].
    ///
    /// [`ButtonWaiters`]: crate::collector::ButtonWaiters
    pub fn new(custom_id: impl Into<String>) -> Self {
        Self {
            kind: ComponentType::Button,
            style: ButtonStyle::Primary,
            url: None,
            custom_id: Some(custom_id.into()),
            label: None,
            emoji: None,
            disabled: false,
        }
    }

    /// Creates a link button to the given URL. You must also set [`Self::label`] and/or
    /// [`Self::emoji`] after this.
    ///
    /// Clicking this button _will not_ trigger an interaction.
    pub fn new_link(url: impl Into<String>) -> Self {
        Self {
            kind: ComponentType::Button,
            style: ButtonStyle::Link,
            url: Some(url.into()),
            custom_id: None,
            label: None,
            emoji: None,
            disabled: false,
        }
    }

    /// Sets the style of this button.
    ///
    /// Has no effect on link buttons.
    pub fn style(mut self, new_style: ButtonStyle) -> Self {
        if self.url.is_none() {
            self.style = new_style;
        }

        self
    }

    /// Sets label of the button.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets a unicode emoji shown on the button.
    pub fn emoji(mut self, emoji: impl Into<String>) -> Self {
        self.emoji = Some(ButtonEmoji {
            name: emoji.into(),
        });
        self
    }

    /// Sets the disabled state for the button.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

#[derive(Clone, Debug, Serialize)]
struct ButtonEmoji {
    name: String,
}
