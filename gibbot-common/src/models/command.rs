use serde::{Deserialize, Serialize};

/// Serializable view of a command descriptor for the external command-list
/// surface. Handler and predicate callbacks never appear here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub aliases: Vec<String>,
    pub usage: String,
    pub description: String,
    pub channel_cooldown_seconds: i64,
    pub user_cooldown_seconds: i64,
    pub no_prefix: bool,
    pub can_disable: bool,
}
