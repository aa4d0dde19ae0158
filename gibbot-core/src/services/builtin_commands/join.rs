use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use gibbot_common::models::{ChatMessage, NewUser};
use gibbot_common::Error;

use crate::repositories::sqlite::{commands, user};
use crate::services::builtin_commands::APOLOGY;
use crate::services::command_registry::Command;
use crate::services::command_service::{CommandContext, CommandHandler};

struct Join;

impl Join {
    /// Provision the channel inside one transaction: user row with the
    /// joined flag, plus the per-channel and per-user command rows every
    /// gate evaluation expects to find.
    async fn join_channel(ctx: &CommandContext<'_>, target: &NewUser) -> Result<(), Error> {
        let mut tx = ctx.db.pool().begin().await?;

        user::insert_users(&mut tx, true, std::slice::from_ref(target)).await?;
        user::set_bot_joined(&mut tx, true, &[target.user_id.clone()]).await?;
        commands::seed_channel_commands(&mut tx, &target.user_id).await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CommandHandler for Join {
    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        msg: &ChatMessage,
        args: &[String],
    ) -> Result<(), Error> {
        let target = match args.get(1) {
            // joining someone else's channel needs bot-admin rights, and the
            // channel must already be known to the store (there is no remote
            // account lookup without a transport)
            Some(name) if *name != msg.chatter.name => {
                let mut tx = ctx.db.pool().begin().await?;
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
                    Some(u) => NewUser::new(u.user_id, u.username),
                    None => {
                        ctx.sender.say(&msg.channel, "Channel not found").await;
                        return Ok(());
                    }
                }
            }
            _ => NewUser::new(&msg.chatter.id, &msg.chatter.name),
        };

        if let Err(e) = Self::join_channel(ctx, &target).await {
            ctx.sender.say(&msg.channel, APOLOGY).await;
            return Err(e);
        }

        info!("joined channel '{}'", target.username);
        ctx.sender.join(&[target.username.clone()]).await;
        ctx.sender
            .say(&msg.channel, &format!("Joined channel {}", target.username))
            .await;
        Ok(())
    }
}

pub(super) fn command() -> Command {
    Command {
        name: "join",
        aliases: &[],
        usage: "join | join [channel]",
        description: "Join the message author's channel or the specified channel",
        channel_cooldown_seconds: 5,
        user_cooldown_seconds: 5,
        no_prefix: false,
        can_disable: false,
        handler: Arc::new(Join),
    }
}
