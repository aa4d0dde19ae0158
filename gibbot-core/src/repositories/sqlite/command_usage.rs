// File: gibbot-core/src/repositories/sqlite/command_usage.rs

use sqlx::{Row, SqliteConnection};

use gibbot_common::Error;

/// Epoch seconds of the last gated use of `command_name` in the channel.
/// `None` means the pair was never tracked, which is distinct from "on
/// cooldown": callers treat it as never used.
pub async fn channel_last_used(
    conn: &mut SqliteConnection,
    channel_id: &str,
    command_name: &str,
) -> Result<Option<i64>, Error> {
    let row = sqlx::query(
        r#"
        SELECT cc.last_used
        FROM channel_commands cc
        INNER JOIN commands c ON c.command_id = cc.command_id
        WHERE c.command_name = ? AND cc.channel_id = ?
        "#,
    )
    .bind(command_name)
    .bind(channel_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(r) => Ok(Some(r.try_get("last_used")?)),
        None => Ok(None),
    }
}

/// Epoch seconds of the user's last gated use of `command_name`, any
/// channel. Same `None` semantics as [`channel_last_used`].
pub async fn user_last_used(
    conn: &mut SqliteConnection,
    user_id: &str,
    command_name: &str,
) -> Result<Option<i64>, Error> {
    let row = sqlx::query(
        r#"
        SELECT d.last_used
        FROM user_command_data d
        INNER JOIN commands c ON c.command_id = d.command_id
        WHERE c.command_name = ? AND d.user_id = ?
        "#,
    )
    .bind(command_name)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(r) => Ok(Some(r.try_get("last_used")?)),
        None => Ok(None),
    }
}

/// Start the cooldown clocks: set `last_used` for both the channel row and
/// the user row. Rows nobody provisioned yet are created on the spot so the
/// clock holds either way. Fails when the command was never mirrored.
pub async fn touch_last_used(
    conn: &mut SqliteConnection,
    channel_id: &str,
    user_id: &str,
    command_name: &str,
    now_epoch: i64,
) -> Result<(), Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO channel_commands (channel_id, command_id, last_used)
        SELECT ?, command_id, ? FROM commands WHERE command_name = ?
        ON CONFLICT (channel_id, command_id) DO UPDATE SET last_used = excluded.last_used
        "#,
    )
    .bind(channel_id)
    .bind(now_epoch)
    .bind(command_name)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() != 1 {
        return Err(Error::NotFound(format!(
            "command '{}' is not mirrored into the store",
            command_name
        )));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO user_command_data (user_id, command_id, last_used)
        SELECT ?, command_id, ? FROM commands WHERE command_name = ?
        ON CONFLICT (user_id, command_id) DO UPDATE SET last_used = excluded.last_used
        "#,
    )
    .bind(user_id)
    .bind(now_epoch)
    .bind(command_name)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() != 1 {
        return Err(Error::NotFound(format!(
            "command '{}' is not mirrored into the store",
            command_name
        )));
    }

    Ok(())
}

/// Whether the user opted out of `command_name`. `None` means the pair is
/// not tracked yet (never opted out).
pub async fn is_opted_out(
    conn: &mut SqliteConnection,
    user_id: &str,
    command_name: &str,
) -> Result<Option<bool>, Error> {
    let row = sqlx::query(
        r#"
        SELECT d.opted_out
        FROM user_command_data d
        INNER JOIN commands c ON c.command_id = d.command_id
        WHERE c.command_name = ? AND d.user_id = ?
        "#,
    )
    .bind(command_name)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(r) => Ok(Some(r.try_get("opted_out")?)),
        None => Ok(None),
    }
}

/// Set or clear the opt-out flag for one command (`Some(name)`) or for all
/// of the user's tracked commands (`None`).
pub async fn set_opted_out(
    conn: &mut SqliteConnection,
    user_id: &str,
    command_name: Option<&str>,
    opted_out: bool,
) -> Result<(), Error> {
    match command_name {
        None => {
            sqlx::query("UPDATE user_command_data SET opted_out = ? WHERE user_id = ?")
                .bind(opted_out)
                .bind(user_id)
                .execute(&mut *conn)
                .await?;
        }
        Some(name) => {
            let result = sqlx::query(
                r#"
                INSERT INTO user_command_data (user_id, command_id, opted_out)
                SELECT ?, command_id, ? FROM commands WHERE command_name = ?
                ON CONFLICT (user_id, command_id) DO UPDATE SET opted_out = excluded.opted_out
                "#,
            )
            .bind(user_id)
            .bind(opted_out)
            .bind(name)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() != 1 {
                return Err(Error::NotFound(format!(
                    "command '{}' is not mirrored into the store",
                    name
                )));
            }
        }
    }

    Ok(())
}
