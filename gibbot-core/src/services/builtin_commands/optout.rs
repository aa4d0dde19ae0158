use std::sync::Arc;

use async_trait::async_trait;

use gibbot_common::models::ChatMessage;
use gibbot_common::Error;

use crate::repositories::sqlite::command_usage;
use crate::services::builtin_commands::APOLOGY;
use crate::services::command_registry::Command;
use crate::services::command_service::{CommandContext, CommandHandler};

/// Shared body for `optout` and `optin`; only the flag written differs.
struct OptOut {
    opt_out: bool,
}

#[async_trait]
impl CommandHandler for OptOut {
    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        msg: &ChatMessage,
        args: &[String],
    ) -> Result<(), Error> {
        let verb = if self.opt_out { "optout" } else { "optin" };

        let Some(target) = args.get(1) else {
            ctx.sender
                .say(&msg.channel, &format!("Usage: {verb} [all] | {verb} [command]"))
                .await;
            return Ok(());
        };

        // a user can opt out of one command or of every command at once
        let command_name = if target == "all" {
            None
        } else {
            match ctx.registry.find(target) {
                Some(cmd) => Some(cmd.name),
                None => {
                    ctx.sender
                        .say(&msg.channel, &format!("Unknown command '{}'", target))
                        .await;
                    return Ok(());
                }
            }
        };

        let result = async {
            let mut tx = ctx.db.pool().begin().await?;
            command_usage::set_opted_out(&mut tx, &msg.chatter.id, command_name, self.opt_out)
                .await?;
            tx.commit().await?;
            Ok::<(), Error>(())
        }
        .await;

        if let Err(e) = result {
            ctx.sender.say(&msg.channel, APOLOGY).await;
            return Err(e);
        }

        let reply = if self.opt_out { "Opted out" } else { "Opted back in" };
        ctx.sender.say(&msg.channel, reply).await;
        Ok(())
    }
}

pub(super) fn optout_command() -> Command {
    Command {
        name: "optout",
        aliases: &[],
        usage: "optout [all] | optout [command]",
        description: "Opt out of one or all commands",
        channel_cooldown_seconds: 5,
        user_cooldown_seconds: 5,
        no_prefix: false,
        can_disable: false,
        handler: Arc::new(OptOut { opt_out: true }),
    }
}

pub(super) fn optin_command() -> Command {
    Command {
        name: "optin",
        aliases: &[],
        usage: "optin [all] | optin [command]",
        description: "Opt back into one or all commands",
        channel_cooldown_seconds: 5,
        user_cooldown_seconds: 5,
        no_prefix: false,
        can_disable: false,
        handler: Arc::new(OptOut { opt_out: false }),
    }
}
