use crate::channel::{ChannelAdapter, ChannelError};
use crate::controls::{controls_for, Control};
use crate::render::Notification;
use async_trait::async_trait;
use serde_json::json;

/// Control-keyboard operations the command handler needs from the chat
/// surface; split out so tests can substitute a recording fake.
#[async_trait]
pub trait BotGateway: Send + Sync {
    async fn update_controls(
        &self,
        message_id: i64,
        controls: &[Control],
    ) -> Result<(), ChannelError>;
}

/// Chat-bot channel speaking a Telegram-style bot gateway API
pub struct ChatBotChannel {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl ChatBotChannel {
    pub fn new(api_base: String, bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            bot_token,
            chat_id,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    fn keyboard(controls: &[Control]) -> serde_json::Value {
        // One control per row keeps long labels readable on phones
        json!({
            "inline_keyboard": controls
                .iter()
                .map(|c| vec![json!({ "text": c.label, "callback_data": c.token })])
                .collect::<Vec<_>>()
        })
    }

    async fn post(&self, method: &str, body: serde_json::Value) -> Result<(), ChannelError> {
        let response = self.http.post(self.method_url(method)).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ChannelError::Rejected(format!(
                "{} returned {}",
                method,
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for ChatBotChannel {
    fn name(&self) -> &'static str {
        "chat-bot"
    }

    async fn send(&self, notification: &Notification) -> Result<(), ChannelError> {
        let controls = controls_for(notification.status, notification.order_id);
        self.post(
            "sendMessage",
            json!({
                "chat_id": self.chat_id,
                "text": notification.body(),
                "reply_markup": Self::keyboard(&controls),
            }),
        )
        .await
    }
}

#[async_trait]
impl BotGateway for ChatBotChannel {
    async fn update_controls(
        &self,
        message_id: i64,
        controls: &[Control],
    ) -> Result<(), ChannelError> {
        self.post(
            "editMessageReplyMarkup",
            json!({
                "chat_id": self.chat_id,
                "message_id": message_id,
                "reply_markup": Self::keyboard(controls),
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morsel_order::models::OrderStatus;
    use uuid::Uuid;

    #[test]
    fn keyboard_rows_carry_callback_tokens() {
        let order_id = Uuid::new_v4();
        let controls = controls_for(OrderStatus::Pending, order_id);
        let keyboard = ChatBotChannel::keyboard(&controls);

        let rows = keyboard["inline_keyboard"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0][0]["callback_data"],
            format!("approve:{}", order_id.simple())
        );
    }
}
