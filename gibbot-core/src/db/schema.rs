// File: gibbot-core/src/db/schema.rs

use super::migrations::Migration;

/// The complete schema as of the latest version. Changeset 1 applies this
/// wholesale, so a fresh store never replays the incremental history.
pub fn current_schema() -> Vec<String> {
    [
        // DDL
        r#"CREATE TABLE users (
            user_id TEXT NOT NULL PRIMARY KEY,
            username TEXT NOT NULL,
            permission_id INTEGER NOT NULL,
            bot_is_joined BOOLEAN NOT NULL DEFAULT FALSE,
            FOREIGN KEY (permission_id) REFERENCES permissions(permission_id)
        )"#,
        r#"CREATE TABLE permissions (
            permission_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            is_ignored BOOLEAN NOT NULL DEFAULT FALSE,
            is_bot_admin BOOLEAN NOT NULL DEFAULT FALSE
        )"#,
        r#"CREATE TABLE commands (
            command_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            command_name TEXT NOT NULL
        )"#,
        r#"CREATE INDEX idx_commands_name ON commands(command_name)"#,
        r#"CREATE TABLE channel_commands (
            channel_command_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            channel_id TEXT NOT NULL,
            command_id INTEGER NOT NULL,
            is_enabled BOOLEAN NOT NULL DEFAULT TRUE,
            last_used INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (channel_id) REFERENCES users(user_id) ON DELETE CASCADE,
            FOREIGN KEY (command_id) REFERENCES commands(command_id) ON DELETE CASCADE,
            UNIQUE (channel_id, command_id)
        )"#,
        r#"CREATE INDEX idx_channel_commands_enabled ON channel_commands(is_enabled)"#,
        r#"CREATE TABLE user_command_data (
            user_command_data_id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            command_id INTEGER NOT NULL,
            last_used INTEGER NOT NULL DEFAULT 0,
            opted_out BOOLEAN NOT NULL DEFAULT FALSE,
            FOREIGN KEY (user_id) REFERENCES users(user_id) ON DELETE CASCADE,
            FOREIGN KEY (command_id) REFERENCES commands(command_id) ON DELETE CASCADE,
            UNIQUE (user_id, command_id)
        )"#,
        r#"CREATE INDEX idx_user_command_data ON user_command_data(user_id, command_id, last_used)"#,
        // DML
        r#"INSERT INTO permissions (name) VALUES ('user')"#,
        r#"INSERT INTO permissions (name, is_ignored) VALUES ('banned', TRUE)"#,
        r#"INSERT INTO permissions (name, is_bot_admin) VALUES ('admin', TRUE)"#,
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// The full changeset history. Fresh stores take the version-1 fast path and
/// mirror the command list at startup; stores that predate a command pick it
/// up through the incremental changesets below.
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            statements: current_schema(),
        },
        Migration {
            version: 2,
            statements: [
                r#"INSERT INTO commands (command_name) VALUES ('optin')"#,
                r#"INSERT INTO channel_commands (channel_id, command_id, is_enabled)
                    SELECT u.user_id, (
                        SELECT c.command_id FROM commands c WHERE c.command_name = 'optin'
                    ), TRUE FROM users u WHERE u.bot_is_joined"#,
                r#"INSERT INTO user_command_data (user_id, command_id)
                    SELECT u.user_id, (
                        SELECT c.command_id FROM commands c WHERE c.command_name = 'optin'
                    ) FROM users u"#,
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        },
    ]
}
