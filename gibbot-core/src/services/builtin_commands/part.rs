use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use gibbot_common::models::ChatMessage;
use gibbot_common::Error;

use crate::repositories::sqlite::user;
use crate::services::builtin_commands::APOLOGY;
use crate::services::command_registry::Command;
use crate::services::command_service::{CommandContext, CommandHandler};

struct Part;

#[async_trait]
impl CommandHandler for Part {
    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        msg: &ChatMessage,
        args: &[String],
    ) -> Result<(), Error> {
        let mut tx = match ctx.db.pool().begin().await {
            Ok(tx) => tx,
            Err(e) => {
                ctx.sender.say(&msg.channel, APOLOGY).await;
                return Err(e.into());
            }
        };

        let target = match args.get(1) {
            Some(name) if *name != msg.chatter.name => {
                let is_admin = user::is_bot_admin(&mut tx, &msg.chatter.id)
                    .await?
                    .unwrap_or(false);
                if !is_admin {
                    ctx.sender
                        .say(&msg.channel, "You must be an admin to use this command")
                        .await;
                    return Ok(());
                }
                match user::get_user_by_name(&mut tx, name).await? {
                    Some(u) => u,
                    None => {
                        ctx.sender.say(&msg.channel, "Channel not found").await;
                        return Ok(());
                    }
                }
            }
            _ => match user::get_user(&mut tx, &msg.chatter.id).await? {
                Some(u) => u,
                None => {
                    ctx.sender.say(&msg.channel, "Channel not found").await;
                    return Ok(());
                }
            },
        };

        if !target.bot_is_joined {
            ctx.sender
                .say(&msg.channel, &format!("Channel {} was not joined", target.username))
                .await;
            return Ok(());
        }

        user::set_bot_joined(&mut tx, false, &[target.user_id.clone()]).await?;
        tx.commit().await?;

        info!("parted channel '{}'", target.username);
        ctx.sender.part(&[target.username.clone()]).await;
        ctx.sender
            .say(&msg.channel, &format!("Parted channel {}", target.username))
            .await;
        Ok(())
    }
}

pub(super) fn command() -> Command {
    Command {
        name: "part",
        aliases: &["leave"],
        usage: "part | part [channel]",
        description: "Leave the message author's channel or the specified channel",
        channel_cooldown_seconds: 5,
        user_cooldown_seconds: 5,
        no_prefix: false,
        can_disable: false,
        handler: Arc::new(Part),
    }
}
