// gibbot-server/src/console.rs

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};
use uuid::Uuid;

use gibbot_common::models::{ChatMessage, Chatter, NewUser};
use gibbot_common::traits::MessageSender;
use gibbot_common::Error;
use gibbot_core::config::Config;
use gibbot_core::repositories::sqlite::{commands, user};
use gibbot_core::services::command_service::Dispatch;
use gibbot_core::services::CommandService;
use gibbot_core::Database;

const CONSOLE_CHANNEL: &str = "console";
const CONSOLE_CHANNEL_ID: &str = "console";

/// `MessageSender` that prints to stdout. An operator/dev surface, not a
/// chat-network transport.
pub struct ConsoleSender {
    started: Instant,
}

impl ConsoleSender {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

#[async_trait]
impl MessageSender for ConsoleSender {
    async fn say(&self, channel: &str, text: &str) {
        println!("[{}] {}", channel, text);
    }

    async fn join(&self, channels: &[String]) {
        info!("join requested for {:?}", channels);
    }

    async fn part(&self, channels: &[String]) {
        info!("part requested for {:?}", channels);
    }

    fn latency(&self) -> Option<Duration> {
        None
    }

    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Provision the console channel like any other joined channel, then feed
/// stdin lines through the gating pipeline until EOF.
pub async fn run_console_loop(
    service: &CommandService,
    sender: &ConsoleSender,
    db: &Database,
    config: &Config,
) -> Result<(), Error> {
    {
        let mut tx = db.pool().begin().await?;
        user::insert_users(
            &mut tx,
            true,
            &[NewUser::new(CONSOLE_CHANNEL_ID, CONSOLE_CHANNEL)],
        )
        .await?;
        commands::seed_channel_commands(&mut tx, CONSOLE_CHANNEL_ID).await?;
        tx.commit().await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim().to_string();
        if text.is_empty() {
            continue;
        }

        let msg = ChatMessage {
            id: Uuid::new_v4().to_string(),
            text,
            channel: CONSOLE_CHANNEL.to_string(),
            channel_id: CONSOLE_CHANNEL_ID.to_string(),
            timestamp: Utc::now(),
            chatter: Chatter {
                id: "console-operator".to_string(),
                name: "operator".to_string(),
                is_mod: true,
                is_broadcaster: true,
            },
        };

        match service.handle_message(&msg, sender, config).await {
            Ok(Dispatch::NotHandled) => {}
            Ok(Dispatch::Blocked { command, gate }) => {
                debug!("'{}' blocked by {} gate", command, gate);
            }
            Ok(Dispatch::Executed { command }) => debug!("'{}' executed", command),
            Ok(Dispatch::BodyFailed { command, error }) => {
                error!("command '{}' body failed: {}", command, error);
            }
            Err(Error::UnknownCommand(detail)) => debug!("unknown command: {}", detail),
            Err(e) => {
                error!("message handling failed: {}", e);
                sender
                    .say(
                        CONSOLE_CHANNEL,
                        "Command failed, please try again or contact an admin",
                    )
                    .await;
            }
        }
    }

    Ok(())
}
