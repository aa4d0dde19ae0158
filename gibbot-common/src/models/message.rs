use chrono::{DateTime, Utc};

/// The author of an inbound message.
#[derive(Debug, Clone)]
pub struct Chatter {
    pub id: String,
    pub name: String,
    pub is_mod: bool,
    pub is_broadcaster: bool,
}

/// Inbound chat message, normalized to be platform agnostic. The transport
/// collaborator builds one of these per received line.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    /// Display name of the channel the message arrived in.
    pub channel: String,
    /// Stable identity key of the channel owner's user row.
    pub channel_id: String,
    pub timestamp: DateTime<Utc>,
    pub chatter: Chatter,
}
