use std::sync::Arc;

use async_trait::async_trait;

use gibbot_common::models::ChatMessage;
use gibbot_common::Error;

use crate::repositories::sqlite::commands;
use crate::services::builtin_commands::APOLOGY;
use crate::services::command_registry::Command;
use crate::services::command_service::{CommandContext, CommandHandler};

struct SetEnabled;

#[async_trait]
impl CommandHandler for SetEnabled {
    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        msg: &ChatMessage,
        args: &[String],
    ) -> Result<(), Error> {
        let (name, state) = match (args.get(1), args.get(2)) {
            (Some(name), Some(state)) if state == "on" || state == "off" => (name, state),
            _ => {
                ctx.sender
                    .say(&msg.channel, "Usage: setenabled <command> <on | off>")
                    .await;
                return Ok(());
            }
        };

        let Some(cmd) = ctx.registry.find(name) else {
            ctx.sender
                .say(&msg.channel, &format!("Unknown command '{}'", name))
                .await;
            return Ok(());
        };

        if !cmd.can_disable {
            ctx.sender
                .say(&msg.channel, "This command cannot be disabled")
                .await;
            return Ok(());
        }

        if !(msg.chatter.is_mod || msg.chatter.is_broadcaster) {
            ctx.sender
                .say(&msg.channel, "You must be a moderator to use this command")
                .await;
            return Ok(());
        }

        let result = async {
            let mut tx = ctx.db.pool().begin().await?;
            commands::set_command_enabled(&mut tx, state == "on", &msg.channel_id, cmd.name)
                .await?;
            tx.commit().await?;
            Ok::<(), Error>(())
        }
        .await;

        if let Err(e) = result {
            ctx.sender.say(&msg.channel, APOLOGY).await;
            return Err(e);
        }

        ctx.sender
            .say(
                &msg.channel,
                &format!("Set command '{}' to '{}'", cmd.name, state),
            )
            .await;
        Ok(())
    }
}

pub(super) fn command() -> Command {
    Command {
        name: "setenabled",
        aliases: &[],
        usage: "setenabled <command> <on | off>",
        description: "Enables or disables a command for everyone in the channel",
        channel_cooldown_seconds: 5,
        user_cooldown_seconds: 5,
        no_prefix: false,
        can_disable: false,
        handler: Arc::new(SetEnabled),
    }
}
