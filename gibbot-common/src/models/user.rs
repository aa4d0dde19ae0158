use serde::{Deserialize, Serialize};

/// A chat identity known to the bot. Channels are users too: the bot joins
/// the channel belonging to `user_id` when `bot_is_joined` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub permission_id: i64,
    pub bot_is_joined: bool,
}

/// Identity key + display name pair used for lazy, idempotent inserts.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub username: String,
}

impl NewUser {
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
        }
    }
}

/// A permission tier row. Each user references exactly one tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub permission_id: i64,
    pub name: String,
    pub is_ignored: bool,
    pub is_bot_admin: bool,
}

/// The built-in permission tiers seeded by the first schema changeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionTier {
    User,
    Banned,
    Admin,
}

impl std::fmt::Display for PermissionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionTier::User => write!(f, "user"),
            PermissionTier::Banned => write!(f, "banned"),
            PermissionTier::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for PermissionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(PermissionTier::User),
            "banned" => Ok(PermissionTier::Banned),
            "admin" => Ok(PermissionTier::Admin),
            _ => Err(format!("Unknown permission tier: {}", s)),
        }
    }
}
