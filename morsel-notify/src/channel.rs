use crate::render::Notification;
use async_trait::async_trait;

/// One outbound delivery channel.
///
/// Adapters are invoked independently by the dispatcher; a failed send is
/// logged and dropped, never retried and never surfaced to order processing.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Transport failure: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway rejected the payload: {0}")]
    Rejected(String),
}
