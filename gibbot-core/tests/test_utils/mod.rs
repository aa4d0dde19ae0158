// File: gibbot-core/tests/test_utils/mod.rs

use chrono::Utc;
use uuid::Uuid;

use gibbot_common::models::{ChatMessage, Chatter, NewUser};
use gibbot_core::config::{Config, DatabaseConfig};
use gibbot_core::repositories::sqlite::{commands, user};
use gibbot_core::services::builtin_commands::builtin_commands;
use gibbot_core::services::CommandRegistry;
use gibbot_core::{Database, Error};

/// Config pointing at a private in-memory store, version 0.
pub fn test_config() -> Config {
    let mut cfg = Config::template();
    cfg.database = DatabaseConfig {
        path: ":memory:".to_string(),
        version: 0,
    };
    cfg
}

/// Fully migrated in-memory database with the built-in command names
/// mirrored, plus the config tracking its version.
pub async fn setup_test_database() -> Result<(Database, Config), Error> {
    let mut cfg = test_config();
    let db = Database::new(":memory:").await?;
    db.migrate(&mut cfg).await?;

    let registry = CommandRegistry::new(builtin_commands());
    let mut tx = db.pool().begin().await?;
    commands::insert_commands(&mut tx, &registry.command_names()).await?;
    tx.commit().await?;

    Ok((db, cfg))
}

/// Provision a joined channel the way the join body does: user row with the
/// joined flag plus the seeded per-channel command rows.
pub async fn provision_channel(db: &Database, channel_id: &str, name: &str) -> Result<(), Error> {
    let mut tx = db.pool().begin().await?;
    user::insert_users(&mut tx, true, &[NewUser::new(channel_id, name)]).await?;
    commands::seed_channel_commands(&mut tx, channel_id).await?;
    tx.commit().await?;
    Ok(())
}

/// Normalized inbound message from an ordinary (non-mod) chatter.
pub fn message(channel: &str, user_id: &str, user_name: &str, text: &str) -> ChatMessage {
    ChatMessage {
        id: Uuid::new_v4().to_string(),
        text: text.to_string(),
        channel: channel.to_string(),
        channel_id: channel.to_string(),
        timestamp: Utc::now(),
        chatter: Chatter {
            id: user_id.to_string(),
            name: user_name.to_string(),
            is_mod: false,
            is_broadcaster: false,
        },
    }
}
