// File: gibbot-core/src/services/builtin_commands/mod.rs

mod greeting;
mod help;
mod join;
mod optout;
mod part;
mod ping;
mod setenabled;
mod setlevel;

use crate::services::command_registry::Command;

/// Generic store-failure reply; internal detail never reaches chat.
pub(crate) const APOLOGY: &str = "Command failed, please try again or contact an admin";

/// Every built-in command, in declaration order. Pattern-triggered commands
/// are scanned in exactly this order, so position matters for them.
pub fn builtin_commands() -> Vec<Command> {
    vec![
        ping::command(),
        join::command(),
        part::command(),
        help::command(),
        setenabled::command(),
        setlevel::command(),
        optout::optout_command(),
        optout::optin_command(),
        greeting::command(),
    ]
}
