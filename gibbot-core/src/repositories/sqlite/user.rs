// File: gibbot-core/src/repositories/sqlite/user.rs

use sqlx::{Row, SqliteConnection};
use tracing::{debug, info};

use gibbot_common::models::{NewUser, PermissionTier, User};
use gibbot_common::Error;

/// Insert users that are not yet known, with the default `user` permission
/// tier. Users that already exist are skipped, not errored. New users get
/// their per-command usage rows seeded so cooldown and opt-out state is
/// tracked from the start.
pub async fn insert_users(
    conn: &mut SqliteConnection,
    bot_is_joined: bool,
    users: &[NewUser],
) -> Result<(), Error> {
    let row = sqlx::query("SELECT permission_id FROM permissions WHERE name = ?")
        .bind(PermissionTier::User.to_string())
        .fetch_one(&mut *conn)
        .await?;
    let user_permission_id: i64 = row.try_get("permission_id")?;

    for user in users {
        let result = sqlx::query(
            r#"
            INSERT INTO users (user_id, username, permission_id, bot_is_joined)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(user_permission_id)
        .bind(bot_is_joined)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            debug!("user '{}' already present, skipping insert", user.username);
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO user_command_data (user_id, command_id)
            SELECT ?, command_id FROM commands WHERE TRUE
            ON CONFLICT (user_id, command_id) DO NOTHING
            "#,
        )
        .bind(&user.user_id)
        .execute(&mut *conn)
        .await?;

        info!("inserted new user '{}'", user.username);
    }

    Ok(())
}

pub async fn get_user(conn: &mut SqliteConnection, user_id: &str) -> Result<Option<User>, Error> {
    let row = sqlx::query(
        r#"
        SELECT user_id, username, permission_id, bot_is_joined
        FROM users
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(r) = row {
        Ok(Some(User {
            user_id: r.try_get("user_id")?,
            username: r.try_get("username")?,
            permission_id: r.try_get("permission_id")?,
            bot_is_joined: r.try_get("bot_is_joined")?,
        }))
    } else {
        Ok(None)
    }
}

pub async fn get_user_by_name(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<User>, Error> {
    let row = sqlx::query(
        r#"
        SELECT user_id, username, permission_id, bot_is_joined
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(r) = row {
        Ok(Some(User {
            user_id: r.try_get("user_id")?,
            username: r.try_get("username")?,
            permission_id: r.try_get("permission_id")?,
            bot_is_joined: r.try_get("bot_is_joined")?,
        }))
    } else {
        Ok(None)
    }
}

/// Read the `is_ignored` flag of the user's permission tier. `None` means
/// the user row does not exist (yet).
pub async fn is_ignored(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<bool>, Error> {
    let row = sqlx::query(
        r#"
        SELECT p.is_ignored FROM permissions p
        INNER JOIN users u ON u.permission_id = p.permission_id
        WHERE u.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(r) => Ok(Some(r.try_get("is_ignored")?)),
        None => Ok(None),
    }
}

/// Read the `is_bot_admin` flag of the user's permission tier.
pub async fn is_bot_admin(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Option<bool>, Error> {
    let row = sqlx::query(
        r#"
        SELECT p.is_bot_admin FROM permissions p
        INNER JOIN users u ON u.permission_id = p.permission_id
        WHERE u.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(r) => Ok(Some(r.try_get("is_bot_admin")?)),
        None => Ok(None),
    }
}

/// Channels the bot is currently joined to, as `(user_id, username)` pairs.
pub async fn joined_channels(conn: &mut SqliteConnection) -> Result<Vec<(String, String)>, Error> {
    let rows = sqlx::query("SELECT user_id, username FROM users WHERE bot_is_joined")
        .fetch_all(&mut *conn)
        .await?;

    let mut channels = Vec::with_capacity(rows.len());
    for r in rows {
        channels.push((r.try_get("user_id")?, r.try_get("username")?));
    }
    Ok(channels)
}

pub async fn set_bot_joined(
    conn: &mut SqliteConnection,
    joined: bool,
    user_ids: &[String],
) -> Result<(), Error> {
    for user_id in user_ids {
        sqlx::query("UPDATE users SET bot_is_joined = ? WHERE user_id = ?")
            .bind(joined)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Move a user (looked up by display name) to another permission tier.
pub async fn set_permission(
    conn: &mut SqliteConnection,
    username: &str,
    tier: PermissionTier,
) -> Result<(), Error> {
    let row = sqlx::query("SELECT permission_id FROM permissions WHERE name = ?")
        .bind(tier.to_string())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("no permission tier named '{}'", tier)))?;
    let permission_id: i64 = row.try_get("permission_id")?;

    let result = sqlx::query("UPDATE users SET permission_id = ? WHERE username = ?")
        .bind(permission_id)
        .bind(username)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("no user named '{}'", username)));
    }

    Ok(())
}
