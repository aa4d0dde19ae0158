use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;

/// Outbound side of the transport collaborator. The pipeline and command
/// bodies talk to chat exclusively through this trait; building network
/// frames is the transport's problem.
#[automock]
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn say(&self, channel: &str, text: &str);

    async fn join(&self, channels: &[String]);

    async fn part(&self, channels: &[String]);

    /// Last measured round-trip to the chat network, if the transport has
    /// one yet.
    fn latency(&self) -> Option<Duration>;

    fn uptime(&self) -> Duration;
}
