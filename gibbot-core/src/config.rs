// File: gibbot-core/src/config.rs

use std::path::Path;

use serde::{Deserialize, Serialize};

use gibbot_common::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: String,
    /// Tracks schema migrations. 0 means the tables were not created yet.
    pub version: i64,
}

/// The persisted configuration document. The migration engine reads and
/// rewrites exactly one field of it: `database.version`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub twitch_token: String,
    pub initial_channels: Vec<String>,
    pub prefix: String,
    pub user_id: String,
    pub admin_usernames: Vec<String>,
    pub login: String,
    pub client_id: String,
    pub database: DatabaseConfig,
}

impl Config {
    /// Parse a config document and ensure every field is set.
    pub fn load(json: &str) -> Result<Self, Error> {
        let cfg: Config = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let data = std::fs::read_to_string(path)?;
        Self::load(&data)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        let mut missing = Vec::new();
        if self.twitch_token.is_empty() {
            missing.push("twitch_token");
        }
        if self.initial_channels.is_empty() {
            missing.push("initial_channels");
        }
        if self.prefix.is_empty() {
            missing.push("prefix");
        }
        if self.user_id.is_empty() {
            missing.push("user_id");
        }
        if self.admin_usernames.is_empty() {
            missing.push("admin_usernames");
        }
        if self.login.is_empty() {
            missing.push("login");
        }
        if self.client_id.is_empty() {
            missing.push("client_id");
        }
        if self.database.path.is_empty() {
            missing.push("database.path");
        }
        if let Some(field) = missing.first() {
            return Err(Error::Config(format!("missing field: {}", field)));
        }
        Ok(())
    }

    /// Starting-point document written on first run for the operator to fill
    /// in.
    pub fn template() -> Self {
        Self {
            twitch_token: "YOUR_OAUTH_TOKEN_HERE".to_string(),
            initial_channels: vec!["gibbot".to_string()],
            prefix: "!".to_string(),
            user_id: "YOUR_USER_ID_HERE".to_string(),
            admin_usernames: vec!["gibbot".to_string()],
            login: "YOUR_LOGIN_HERE".to_string(),
            client_id: "YOUR_CLIENT_ID_HERE".to_string(),
            database: DatabaseConfig {
                path: "data.db".to_string(),
                version: 0,
            },
        }
    }
}
