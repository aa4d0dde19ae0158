// File: gibbot-core/src/services/command_service.rs

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use gibbot_common::models::{ChatMessage, NewUser};
use gibbot_common::traits::MessageSender;
use gibbot_common::Error;

use crate::config::Config;
use crate::db::Database;
use crate::repositories::sqlite::{command_usage, commands, user};
use crate::services::command_registry::{Command, CommandRegistry};

/// Context handed to command bodies. Bodies run outside the gating
/// transaction and open their own when they touch the store.
pub struct CommandContext<'a> {
    pub db: &'a Database,
    pub sender: &'a dyn MessageSender,
    pub registry: &'a CommandRegistry,
    pub config: &'a Config,
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// The command body. `args[0]` is the command token itself.
    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        msg: &ChatMessage,
        args: &[String],
    ) -> Result<(), Error>;

    /// Firing predicate for pattern-triggered commands. Runs for every
    /// ordinary chat line, before any store access, so it must stay cheap.
    fn should_run_unprefixed(&self, _msg: &ChatMessage, _args: &[String]) -> bool {
        false
    }
}

/// The gates a selected command must pass, in evaluation order. The first
/// failure aborts without evaluating the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Enabled,
    Ignored,
    ChannelCooldown,
    UserCooldown,
    OptedOut,
}

const GATE_ORDER: [Gate; 5] = [
    Gate::Enabled,
    Gate::Ignored,
    Gate::ChannelCooldown,
    Gate::UserCooldown,
    Gate::OptedOut,
];

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Enabled => write!(f, "enabled"),
            Gate::Ignored => write!(f, "ignored"),
            Gate::ChannelCooldown => write!(f, "channel-cooldown"),
            Gate::UserCooldown => write!(f, "user-cooldown"),
            Gate::OptedOut => write!(f, "opted-out"),
        }
    }
}

/// Outcome of handling one inbound message.
#[derive(Debug)]
pub enum Dispatch {
    /// Ordinary chat line: no prefix and no pattern command fired. The
    /// overwhelmingly common case; involves no store access.
    NotHandled,
    /// A gate failed. Transaction rolled back, body never invoked.
    Blocked { command: &'static str, gate: Gate },
    /// All gates passed, the last-used update committed, and the body ran
    /// to completion.
    Executed { command: &'static str },
    /// All gates passed and the cooldown was consumed, but the body failed.
    /// The gating commit stands.
    BodyFailed {
        command: &'static str,
        error: Error,
    },
}

/// The gating pipeline: resolves an inbound message to a command, evaluates
/// the access-control and rate-limit gates inside one transaction, and
/// durably marks the command used before invoking its body.
pub struct CommandService {
    db: Database,
    registry: Arc<CommandRegistry>,
}

impl CommandService {
    pub fn new(db: Database, registry: Arc<CommandRegistry>) -> Self {
        Self { db, registry }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Handle one normalized inbound message. Soft outcomes (`NotHandled`,
    /// `Blocked`, `BodyFailed`) come back as `Ok`; an unrecognized prefixed
    /// token is `Error::UnknownCommand`; anything else is a store error and
    /// the whole transaction has been rolled back.
    pub async fn handle_message(
        &self,
        msg: &ChatMessage,
        sender: &dyn MessageSender,
        config: &Config,
    ) -> Result<Dispatch, Error> {
        let text = msg.text.trim();

        if let Some(unprefixed) = text.strip_prefix(&config.prefix) {
            let args: Vec<String> = unprefixed.split(' ').map(str::to_string).collect();
            let cmd = args
                .first()
                .filter(|token| !token.is_empty())
                .and_then(|token| self.registry.get(token))
                .ok_or_else(|| {
                    Error::UnknownCommand(format!(
                        "'{}' called by '{}'",
                        args.first().map(String::as_str).unwrap_or_default(),
                        msg.chatter.name
                    ))
                })?;
            return self.gate_and_execute(cmd, msg, &args, sender, config).await;
        }

        let args: Vec<String> = text.split(' ').map(str::to_string).collect();
        for cmd in self.registry.no_prefix() {
            if cmd.handler.should_run_unprefixed(msg, &args) {
                return self.gate_and_execute(cmd, msg, &args, sender, config).await;
            }
        }

        Ok(Dispatch::NotHandled)
    }

    async fn gate_and_execute(
        &self,
        cmd: &Command,
        msg: &ChatMessage,
        args: &[String],
        sender: &dyn MessageSender,
        config: &Config,
    ) -> Result<Dispatch, Error> {
        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;

        user::insert_users(
            &mut tx,
            false,
            &[NewUser::new(&msg.chatter.id, &msg.chatter.name)],
        )
        .await?;

        for gate in GATE_ORDER {
            if !Self::eval_gate(&mut tx, gate, cmd, msg, now).await? {
                debug!(
                    "command '{}' blocked by {} gate in channel '{}'",
                    cmd.name, gate, msg.channel
                );
                return Ok(Dispatch::Blocked {
                    command: cmd.name,
                    gate,
                });
            }
        }

        // The cooldown clock starts when gating succeeds, not when the body
        // finishes: commit before invoking, so a slow or failing body cannot
        // be retried around the cooldown. A failing body therefore still
        // consumes it.
        command_usage::touch_last_used(
            &mut tx,
            &msg.channel_id,
            &msg.chatter.id,
            cmd.name,
            now.timestamp(),
        )
        .await?;
        tx.commit().await?;

        let ctx = CommandContext {
            db: &self.db,
            sender,
            registry: &self.registry,
            config,
        };
        match cmd.handler.execute(&ctx, msg, args).await {
            Ok(()) => Ok(Dispatch::Executed { command: cmd.name }),
            Err(error) => Ok(Dispatch::BodyFailed {
                command: cmd.name,
                error,
            }),
        }
    }

    async fn eval_gate(
        tx: &mut Transaction<'_, Sqlite>,
        gate: Gate,
        cmd: &Command,
        msg: &ChatMessage,
        now: DateTime<Utc>,
    ) -> Result<bool, Error> {
        match gate {
            Gate::Enabled => {
                if !cmd.can_disable {
                    return Ok(true);
                }
                match commands::is_command_enabled(&mut *tx, &msg.channel_id, cmd.name).await? {
                    Some(enabled) => Ok(enabled),
                    // fail closed: a joined channel always has its rows
                    // seeded, so a missing row is a provisioning bug
                    None => Err(Error::NotFound(format!(
                        "channel '{}' has no enablement row for command '{}'",
                        msg.channel, cmd.name
                    ))),
                }
            }
            Gate::Ignored => {
                let ignored = user::is_ignored(&mut *tx, &msg.chatter.id)
                    .await?
                    .unwrap_or(false);
                Ok(!ignored)
            }
            Gate::ChannelCooldown => {
                match command_usage::channel_last_used(&mut *tx, &msg.channel_id, cmd.name).await? {
                    Some(last_used) => {
                        Ok(!on_cooldown(last_used, cmd.channel_cooldown_seconds, now))
                    }
                    None => Ok(true),
                }
            }
            Gate::UserCooldown => {
                match command_usage::user_last_used(&mut *tx, &msg.chatter.id, cmd.name).await? {
                    Some(last_used) => Ok(!on_cooldown(last_used, cmd.user_cooldown_seconds, now)),
                    None => Ok(true),
                }
            }
            Gate::OptedOut => {
                let opted_out = command_usage::is_opted_out(&mut *tx, &msg.chatter.id, cmd.name)
                    .await?
                    .unwrap_or(false);
                Ok(!opted_out)
            }
        }
    }
}

fn on_cooldown(last_used: i64, cooldown_seconds: i64, now: DateTime<Utc>) -> bool {
    let elapsed = now.timestamp() - last_used;
    cooldown_seconds - elapsed > 0
}
