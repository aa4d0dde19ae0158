use std::sync::Arc;

use async_trait::async_trait;

use gibbot_common::models::ChatMessage;
use gibbot_common::Error;

use crate::services::command_registry::Command;
use crate::services::command_service::{CommandContext, CommandHandler};

struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        msg: &ChatMessage,
        args: &[String],
    ) -> Result<(), Error> {
        let reply = match args.get(1) {
            Some(name) => match ctx.registry.find(name) {
                Some(cmd) => format!("{}: {} | Usage: {}", cmd.name, cmd.description, cmd.usage),
                None => format!("Unknown command '{}'", name),
            },
            None => {
                let names = ctx.registry.command_names().join(", ");
                format!("Usage: help [command] | Commands: {}", names)
            }
        };

        ctx.sender.say(&msg.channel, &reply).await;
        Ok(())
    }
}

pub(super) fn command() -> Command {
    Command {
        name: "help",
        aliases: &["commands"],
        usage: "help | help [command]",
        description: "Show the usage of a command, or list every command",
        channel_cooldown_seconds: 10,
        user_cooldown_seconds: 5,
        no_prefix: false,
        can_disable: true,
        handler: Arc::new(Help),
    }
}
