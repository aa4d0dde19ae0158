// gibbot-common/src/models/mod.rs

pub mod command;
pub mod message;
pub mod user;

pub use command::CommandInfo;
pub use message::{ChatMessage, Chatter};
pub use user::{NewUser, Permission, PermissionTier, User};
