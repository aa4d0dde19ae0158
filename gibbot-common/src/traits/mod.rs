// gibbot-common/src/traits/mod.rs

pub mod message_sender;

pub use message_sender::MessageSender;
