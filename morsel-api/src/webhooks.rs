use axum::{extract::State, Json};
use morsel_notify::InboundCommand;
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatBotWebhook {
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub data: String,
    pub from: CallbackSender,
    pub message: Option<CallbackMessage>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackSender {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackMessage {
    pub message_id: i64,
}

/// POST /v1/webhooks/chatbot
/// Receive tapped-control callbacks from the chat-bot gateway.
///
/// Always answers 200: command failures become acknowledgments for the
/// sender, never webhook errors; a crashing webhook would make the gateway
/// retry-storm us.
pub async fn handle_chatbot_webhook(
    State(state): State<AppState>,
    Json(payload): Json<ChatBotWebhook>,
) -> Json<serde_json::Value> {
    let Some(callback) = payload.callback_query else {
        // Message updates, joins etc. are not ours to handle
        return Json(json!({ "ok": true, "ignored": true }));
    };

    tracing::info!(callback_id = %callback.id, data = %callback.data, "inbound chat-bot command");

    let ack = state
        .commands
        .handle(InboundCommand {
            token: callback.data,
            message_id: callback.message.map(|m| m.message_id),
            sender_id: callback.from.id.to_string(),
        })
        .await;

    Json(json!({ "ok": true, "text": ack.text }))
}
