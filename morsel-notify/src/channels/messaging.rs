use crate::channel::{ChannelAdapter, ChannelError};
use crate::render::Notification;
use async_trait::async_trait;
use serde_json::json;

/// Messaging-gateway channel (SMS/IM aggregator with a JSON webhook API)
pub struct MessagingChannel {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl MessagingChannel {
    pub fn new(endpoint: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl ChannelAdapter for MessagingChannel {
    fn name(&self) -> &'static str {
        "messaging"
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "to": notification.customer_phone,
                "body": notification.body(),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChannelError::Rejected(format!(
                "messaging gateway returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
