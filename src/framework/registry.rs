use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{Command, CommandError};
use crate::internal::prelude::*;

/// The commands of a client, by name.
///
/// Commands are validated when added and immutable afterwards, except that subcommands can be
/// attached to a root command. Lookups hand out [`Arc`]s, so they stay usable while commands are
/// being added. Iteration is in name order.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: RwLock<BTreeMap<String, Arc<Command>>>,
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root command, or a subcommand of the root command named `parent`.
    ///
    /// The name is lowercased before the command is validated.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Invalid`] if the command breaks Discord's constraints,
    /// [`CommandError::Duplicate`] if a root command of that name exists,
    /// [`CommandError::MissingParent`] if `parent` is not registered,
    /// [`CommandError::ParentHasOptions`] if `parent` takes options, and
    /// [`CommandError::DuplicateSubcommand`] if `parent` already has a subcommand of that name.
    pub fn add(&self, mut command: Command, parent: Option<&str>) -> StdResult<(), CommandError> {
        command.name = command.name.to_lowercase();
        command.validate()?;

        let mut commands = self.commands.write();

        let Some(parent) = parent else {
            if commands.contains_key(&command.name) {
                return Err(CommandError::Duplicate {
                    name: command.name,
                });
            }

            debug!("Registered command `{}`", command.name);
            commands.insert(command.name.clone(), Arc::new(command));
            return Ok(());
        };

        let parent = parent.to_lowercase();
        let Some(root) = commands.get_mut(&parent) else {
            return Err(CommandError::MissingParent {
                parent,
                name: command.name,
            });
        };

        if !root.options.is_empty() {
            return Err(CommandError::ParentHasOptions {
                parent,
                name: command.name,
            });
        }

        if root.subcommands.contains_key(&command.name) {
            return Err(CommandError::DuplicateSubcommand {
                parent,
                name: command.name,
            });
        }

        debug!("Registered subcommand `{} {}`", parent, command.name);
        Arc::make_mut(root).subcommands.insert(command.name.clone(), Arc::new(command));
        Ok(())
    }

    /// Removes a root command together with its subcommands. Names match case-insensitively, as
    /// in [`Self::add`].
    pub fn delete(&self, name: &str) -> Option<Arc<Command>> {
        self.commands.write().remove(&name.to_lowercase())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Command>> {
        self.commands.read().get(&name.to_lowercase()).cloned()
    }

    /// Gets the command that runs for an invocation: the subcommand when one is named, otherwise
    /// the root command.
    #[must_use]
    pub fn resolve(&self, name: &str, subcommand: Option<&str>) -> Option<Arc<Command>> {
        let root = self.get(name)?;

        match subcommand {
            Some(subcommand) => root.subcommand(subcommand).cloned(),
            None => Some(root),
        }
    }

    /// The first root command matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&Command) -> bool) -> Option<Arc<Command>> {
        self.commands.read().values().find(|command| predicate(command)).cloned()
    }

    /// The root commands matching `predicate`, at most `limit` of them.
    pub fn filter(
        &self,
        predicate: impl Fn(&Command) -> bool,
        limit: Option<usize>,
    ) -> Vec<Arc<Command>> {
        self.commands
            .read()
            .values()
            .filter(|command| predicate(command))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// All root commands.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Command>> {
        self.commands.read().values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::CommandOption;
    use crate::model::application::CommandOptionType;

    #[test]
    fn duplicate_root_is_rejected() {
        let registry = CommandRegistry::new();
        registry.add(Command::new("ping", "First"), None).unwrap();

        let error = registry.add(Command::new("ping", "Second"), None).unwrap_err();
        assert_eq!(error, CommandError::Duplicate {
            name: "ping".into(),
        });

        let kept = registry.get("ping").unwrap();
        assert_eq!(kept.description, "First");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_are_lowercased() {
        let registry = CommandRegistry::new();
        registry.add(Command::new("Ping", "Ping"), None).unwrap();

        assert_eq!(registry.get("ping").unwrap().name(), "ping");
        assert_eq!(registry.get("PING").unwrap().name(), "ping");
        assert_eq!(registry.resolve("Ping", None).unwrap().name(), "ping");

        assert!(registry.delete("Ping").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn subcommands() {
        let registry = CommandRegistry::new();
        registry
            .add(
                Command::new("echo", "Echoes").add_option(CommandOption::new(
                    CommandOptionType::String,
                    "text",
                    "Text",
                )),
                None,
            )
            .unwrap();
        registry.add(Command::new("root", "Groups subcommands"), None).unwrap();

        assert!(matches!(
            registry.add(Command::new("sub", "Sub"), Some("echo")),
            Err(CommandError::ParentHasOptions { .. })
        ));
        assert!(matches!(
            registry.add(Command::new("sub", "Sub"), Some("missing")),
            Err(CommandError::MissingParent { .. })
        ));

        registry.add(Command::new("sub", "Sub"), Some("root")).unwrap();
        assert!(matches!(
            registry.add(Command::new("sub", "Again"), Some("root")),
            Err(CommandError::DuplicateSubcommand { .. })
        ));

        let root = registry.get("root").unwrap();
        assert_eq!(root.subcommands()["sub"].description, "Sub");
        assert_eq!(registry.resolve("root", Some("sub")).unwrap().name(), "sub");
        assert!(registry.resolve("root", Some("other")).is_none());
        assert_eq!(registry.resolve("echo", None).unwrap().name(), "echo");
    }

    #[test]
    fn delete_find_filter() {
        let registry = CommandRegistry::new();
        for name in ["alpha", "beta", "gamma", "delta"] {
            registry.add(Command::new(name, "Command"), None).unwrap();
        }
        registry.add(Command::new("sub", "Sub"), Some("alpha")).unwrap();

        assert_eq!(registry.find(|c| c.name().starts_with('g')).unwrap().name(), "gamma");
        assert!(registry.find(|c| c.name() == "omega").is_none());

        let all = registry.filter(|_| true, None);
        assert_eq!(all.len(), 4);
        assert_eq!(registry.filter(|c| c.name().contains('a'), Some(2)).len(), 2);

        assert!(registry.delete("alpha").is_some());
        assert!(registry.get("alpha").is_none());
        assert!(registry.resolve("alpha", Some("sub")).is_none());
        assert_eq!(registry.all().len(), 3);
    }

    #[test]
    fn invalid_command_is_not_added() {
        let registry = CommandRegistry::new();
        assert!(matches!(
            registry.add(Command::new("x", "Too short"), None),
            Err(CommandError::Invalid { .. })
        ));
        assert!(registry.is_empty());
    }
}
