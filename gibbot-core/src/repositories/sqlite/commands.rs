// File: gibbot-core/src/repositories/sqlite/commands.rs

use sqlx::{Row, SqliteConnection};
use tracing::debug;

use gibbot_common::Error;

/// Mirror the registry's command names into the store. Runs once, at first
/// startup: when any command row already exists this is a no-op, since
/// later additions arrive through schema changesets.
pub async fn insert_commands(conn: &mut SqliteConnection, names: &[&str]) -> Result<(), Error> {
    let existing = sqlx::query("SELECT command_id FROM commands LIMIT 1")
        .fetch_optional(&mut *conn)
        .await?;
    if existing.is_some() {
        debug!("commands already mirrored, skipping");
        return Ok(());
    }

    for name in names {
        sqlx::query("INSERT INTO commands (command_name) VALUES (?)")
            .bind(name)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Seed the per-channel enablement rows for every mirrored command, so
/// admins get channel-level control the moment a channel is joined. Rows
/// that already exist keep their state.
pub async fn seed_channel_commands(
    conn: &mut SqliteConnection,
    channel_id: &str,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO channel_commands (channel_id, command_id)
        SELECT ?, command_id FROM commands WHERE TRUE
        ON CONFLICT (channel_id, command_id) DO NOTHING
        "#,
    )
    .bind(channel_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Read the enablement flag for `(channel, command)`. `None` means the
/// channel was never provisioned for this command, which callers must treat
/// as an error distinct from "disabled".
pub async fn is_command_enabled(
    conn: &mut SqliteConnection,
    channel_id: &str,
    command_name: &str,
) -> Result<Option<bool>, Error> {
    let row = sqlx::query(
        r#"
        SELECT is_enabled
        FROM channel_commands
        WHERE command_id = (
            SELECT command_id FROM commands WHERE command_name = ?
        ) AND channel_id = ?
        "#,
    )
    .bind(command_name)
    .bind(channel_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(r) => Ok(Some(r.try_get("is_enabled")?)),
        None => Ok(None),
    }
}

pub async fn set_command_enabled(
    conn: &mut SqliteConnection,
    enabled: bool,
    channel_id: &str,
    command_name: &str,
) -> Result<(), Error> {
    let result = sqlx::query(
        r#"
        UPDATE channel_commands SET is_enabled = ?
        WHERE command_id = (
            SELECT command_id FROM commands WHERE command_name = ?
        ) AND channel_id = ?
        "#,
    )
    .bind(enabled)
    .bind(command_name)
    .bind(channel_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() != 1 {
        return Err(Error::NotFound(format!(
            "channel '{}' has no row for command '{}'",
            channel_id, command_name
        )));
    }

    Ok(())
}
