use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use gibbot_common::models::ChatMessage;
use gibbot_common::Error;

use crate::services::command_registry::Command;
use crate::services::command_service::{CommandContext, CommandHandler};

struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        msg: &ChatMessage,
        _args: &[String],
    ) -> Result<(), Error> {
        let mut parts = vec!["Pong!".to_string()];

        match ctx.sender.latency() {
            Some(latency) => parts.push(format!("Latency: {}ms", latency.as_millis())),
            None => warn!("no latency sample available for ping reply"),
        }
        parts.push(format!("Uptime: {}s", ctx.sender.uptime().as_secs()));

        ctx.sender.say(&msg.channel, &parts.join(" | ")).await;
        Ok(())
    }
}

pub(super) fn command() -> Command {
    Command {
        name: "ping",
        aliases: &[],
        usage: "ping",
        description: "Responds with pong, chat latency and process uptime",
        channel_cooldown_seconds: 5,
        user_cooldown_seconds: 5,
        no_prefix: false,
        can_disable: false,
        handler: Arc::new(Ping),
    }
}
