// File: gibbot-core/src/services/command_registry.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gibbot_common::models::CommandInfo;

use crate::services::command_service::CommandHandler;

/// A statically declared command descriptor. Descriptors are defined in
/// code; only their names are mirrored into the store so per-channel state
/// can reference them.
#[derive(Clone)]
pub struct Command {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    pub description: &'static str,
    pub channel_cooldown_seconds: i64,
    pub user_cooldown_seconds: i64,
    /// Pattern-triggered: fires off the handler's predicate instead of the
    /// prefix lookup.
    pub no_prefix: bool,
    pub can_disable: bool,
    pub handler: Arc<dyn CommandHandler>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("no_prefix", &self.no_prefix)
            .field("can_disable", &self.can_disable)
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Serializable view for the command-list surface; the handler never
    /// leaves this struct.
    pub fn info(&self) -> CommandInfo {
        CommandInfo {
            name: self.name.to_string(),
            aliases: self.aliases.iter().map(|a| a.to_string()).collect(),
            usage: self.usage.to_string(),
            description: self.description.to_string(),
            channel_cooldown_seconds: self.channel_cooldown_seconds,
            user_cooldown_seconds: self.user_cooldown_seconds,
            no_prefix: self.no_prefix,
            can_disable: self.can_disable,
        }
    }
}

/// Immutable command lookup built once at startup: every prefixed command's
/// name and aliases map to its descriptor, and pattern-triggered commands
/// keep their declaration order for first-match-wins scanning. Shared
/// read-only state; no locking.
pub struct CommandRegistry {
    commands: Vec<Arc<Command>>,
    prefixed: HashMap<&'static str, Arc<Command>>,
    no_prefix: Vec<Arc<Command>>,
}

impl CommandRegistry {
    pub fn new(commands: Vec<Command>) -> Self {
        let commands: Vec<Arc<Command>> = commands.into_iter().map(Arc::new).collect();

        let mut prefixed = HashMap::new();
        let mut no_prefix = Vec::new();
        for cmd in &commands {
            if cmd.no_prefix {
                no_prefix.push(cmd.clone());
                continue;
            }
            prefixed.insert(cmd.name, cmd.clone());
            for alias in cmd.aliases {
                prefixed.insert(*alias, cmd.clone());
            }
        }

        Self {
            commands,
            prefixed,
            no_prefix,
        }
    }

    /// Exact-token lookup over prefix-triggered commands (names and
    /// aliases).
    pub fn get(&self, token: &str) -> Option<&Command> {
        self.prefixed.get(token).map(Arc::as_ref)
    }

    /// Pattern-triggered descriptors in declaration order.
    pub fn no_prefix(&self) -> impl Iterator<Item = &Command> {
        self.no_prefix.iter().map(Arc::as_ref)
    }

    /// Canonical-name lookup across both groups; used by admin bodies that
    /// take a command name as an argument.
    pub fn find(&self, name: &str) -> Option<&Command> {
        self.get(name)
            .or_else(|| self.no_prefix.iter().find(|c| c.name == name).map(Arc::as_ref))
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|c| c.name).collect()
    }

    pub fn command_infos(&self) -> Vec<CommandInfo> {
        self.commands.iter().map(|c| c.info()).collect()
    }
}
