use std::sync::Arc;

use async_trait::async_trait;

use gibbot_common::models::ChatMessage;
use gibbot_common::Error;

use crate::services::command_registry::Command;
use crate::services::command_service::{CommandContext, CommandHandler};

/// Pattern-triggered: waves back when a message addresses the bot by name.
struct Greeting;

#[async_trait]
impl CommandHandler for Greeting {
    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        msg: &ChatMessage,
        _args: &[String],
    ) -> Result<(), Error> {
        ctx.sender
            .say(&msg.channel, &format!("hello, {}!", msg.chatter.name))
            .await;
        Ok(())
    }

    fn should_run_unprefixed(&self, _msg: &ChatMessage, args: &[String]) -> bool {
        args.first()
            .map(|token| token.trim_start_matches('@').eq_ignore_ascii_case("gibbot"))
            .unwrap_or(false)
    }
}

pub(super) fn command() -> Command {
    Command {
        name: "greeting",
        aliases: &[],
        usage: "gibbot",
        description: "Waves back when addressed by name",
        channel_cooldown_seconds: 10,
        user_cooldown_seconds: 30,
        no_prefix: true,
        can_disable: true,
        handler: Arc::new(Greeting),
    }
}
