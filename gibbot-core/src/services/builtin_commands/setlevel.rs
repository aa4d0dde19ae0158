use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use gibbot_common::models::{ChatMessage, PermissionTier};
use gibbot_common::Error;

use crate::repositories::sqlite::user;
use crate::services::args::{args_by_name, parse_args, ArgKind};
use crate::services::builtin_commands::APOLOGY;
use crate::services::command_registry::Command;
use crate::services::command_service::{CommandContext, CommandHandler};

const USAGE: &str = "Usage: setlevel <user> <user | banned | admin>";

struct SetLevel;

/// Accepts both calling conventions: positional (`setlevel alice admin`)
/// and named (`setlevel user:alice level:admin`), mixed freely.
fn pick<'a>(args: &'a [crate::services::args::CmdArg], name: &str, index: usize) -> Option<&'a str> {
    let by_name = args_by_name(args);
    by_name
        .get(name)
        .map(|a| a.value.as_str())
        .or_else(|| {
            args.iter()
                .find(|a| a.kind == ArgKind::Positional && a.index == index)
                .map(|a| a.value.as_str())
        })
}

#[async_trait]
impl CommandHandler for SetLevel {
    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        msg: &ChatMessage,
        args: &[String],
    ) -> Result<(), Error> {
        let line = args.join(" ");
        let Some(parsed) = parse_args(&line) else {
            ctx.sender.say(&msg.channel, USAGE).await;
            return Ok(());
        };

        let (Some(username), Some(tier)) = (pick(&parsed, "user", 0), pick(&parsed, "level", 1))
        else {
            ctx.sender.say(&msg.channel, USAGE).await;
            return Ok(());
        };
        let username = username.to_string();

        let Ok(tier) = PermissionTier::from_str(tier) else {
            ctx.sender
                .say(&msg.channel, &format!("Unknown permission tier '{}'", tier))
                .await;
            return Ok(());
        };

        let result = async {
            let mut tx = ctx.db.pool().begin().await?;

            let is_admin = user::is_bot_admin(&mut tx, &msg.chatter.id)
                .await?
                .unwrap_or(false);
            if !is_admin {
                return Ok(Some("You must be an admin to use this command"));
            }

            match user::set_permission(&mut tx, &username, tier).await {
                Ok(()) => {
                    tx.commit().await?;
                    Ok(None)
                }
                Err(Error::NotFound(_)) => Ok(Some("Unknown user")),
                Err(e) => Err(e),
            }
        }
        .await;

        match result {
            Ok(None) => {
                info!("set permission of '{}' to '{}'", username, tier);
                ctx.sender
                    .say(
                        &msg.channel,
                        &format!("Set permission of '{}' to '{}'", username, tier),
                    )
                    .await;
                Ok(())
            }
            Ok(Some(reply)) => {
                ctx.sender.say(&msg.channel, reply).await;
                Ok(())
            }
            Err(e) => {
                ctx.sender.say(&msg.channel, APOLOGY).await;
                Err(e)
            }
        }
    }
}

pub(super) fn command() -> Command {
    Command {
        name: "setlevel",
        aliases: &[],
        usage: "setlevel <user> <level> | setlevel user:<user> level:<level>",
        description: "Move a user to another permission tier",
        channel_cooldown_seconds: 5,
        user_cooldown_seconds: 5,
        no_prefix: false,
        can_disable: false,
        handler: Arc::new(SetLevel),
    }
}
