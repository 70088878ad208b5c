use crate::channel::{ChannelAdapter, ChannelError};
use crate::render::Notification;
use async_trait::async_trait;
use serde_json::json;

/// Email channel delivering through a transactional-mail HTTP gateway
pub struct EmailChannel {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl EmailChannel {
    pub fn new(endpoint: String, api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl ChannelAdapter for EmailChannel {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": notification.customer_email,
                "subject": notification.subject(),
                "text": notification.body(),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChannelError::Rejected(format!(
                "mail gateway returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
