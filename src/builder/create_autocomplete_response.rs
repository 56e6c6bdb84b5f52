use serde::Serialize;
use serde_json::Value;

/// One suggestion shown to the user while they type into an autocompleted option.
///
/// [Discord docs](https://discord.com/developers/docs/interactions/application-commands#application-command-object-application-command-option-choice-structure).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[must_use]
pub struct AutocompleteChoice {
    pub name: String,
    pub value: Value,
}

impl AutocompleteChoice {
    /// A choice shown as `name` that fills the option with `value`.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<&str> for AutocompleteChoice {
    /// A string choice whose name and value are the same.
    fn from(value: &str) -> Self {
        Self::new(value, value)
    }
}

impl From<String> for AutocompleteChoice {
    fn from(value: String) -> Self {
        Self::new(value.clone(), value)
    }
}

/// The `data` of an autocomplete callback.
#[derive(Clone, Debug, Default, Serialize)]
#[must_use]
pub struct CreateAutocompleteResponse {
    choices: Vec<AutocompleteChoice>,
}

impl CreateAutocompleteResponse {
    /// Equivalent to [`Self::default`]; an empty list shows "no options" to the user.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the choices, replacing any set before.
    ///
    /// Discord shows at most 25; extra choices are dropped.
    pub fn set_choices(mut self, choices: Vec<AutocompleteChoice>) -> Self {
        self.choices = choices;
        self.choices.truncate(crate::constants::COMMAND_CHOICES_LIMIT);
        self
    }

    #[must_use]
    pub fn choices(&self) -> &[AutocompleteChoice] {
        &self.choices
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn choices_are_capped() {
        let choices = (0..30).map(|i| AutocompleteChoice::new(format!("#{i}"), i)).collect();
        let response = CreateAutocompleteResponse::new().set_choices(choices);

        assert_eq!(response.choices().len(), 25);
        assert_eq!(
            serde_json::to_value(&response).unwrap()["choices"][0],
            json!({"name": "#0", "value": 0})
        );
    }
}
