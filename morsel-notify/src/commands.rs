use crate::channels::chatbot::BotGateway;
use crate::controls::controls_for;
use crate::render::short_id;
use morsel_order::lifecycle::{OrderError, OrderLifecycle};
use morsel_order::models::OrderStatus;
use std::sync::Arc;
use uuid::Uuid;

/// Actions a chat-bot user can trigger from a notification message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Approve,
    Reject,
    Preparing,
    OnTheWay,
    Delivered,
    Call,
    StatusInfo,
}

impl CommandAction {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "approve" => Some(CommandAction::Approve),
            "reject" => Some(CommandAction::Reject),
            "preparing" => Some(CommandAction::Preparing),
            "on_the_way" => Some(CommandAction::OnTheWay),
            "delivered" => Some(CommandAction::Delivered),
            "call" => Some(CommandAction::Call),
            "status_info" => Some(CommandAction::StatusInfo),
            _ => None,
        }
    }

    /// Target lifecycle status; None for the side-channel actions
    pub fn target_status(&self) -> Option<OrderStatus> {
        match self {
            CommandAction::Approve => Some(OrderStatus::Confirmed),
            CommandAction::Reject => Some(OrderStatus::Cancelled),
            CommandAction::Preparing => Some(OrderStatus::Preparing),
            CommandAction::OnTheWay => Some(OrderStatus::Delivering),
            CommandAction::Delivered => Some(OrderStatus::Delivered),
            CommandAction::Call | CommandAction::StatusInfo => None,
        }
    }
}

/// Normalized inbound command; both wire encodings parse into this
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotCommand {
    pub action: CommandAction,
    pub order_id: Uuid,
}

impl BotCommand {
    /// Accepts the compact `action:orderId` form and the legacy
    /// `order_<keyword>_<orderId>` form without a version flag.
    pub fn parse(token: &str) -> Result<Self, CommandParseError> {
        if let Some(rest) = token.strip_prefix("order_") {
            return parse_legacy(token, rest);
        }

        let (action_part, id_part) = token
            .split_once(':')
            .ok_or_else(|| CommandParseError::Malformed(token.to_string()))?;

        if action_part.is_empty()
            || !action_part.chars().all(|c| c.is_ascii_lowercase() || c == '_')
        {
            return Err(CommandParseError::Malformed(token.to_string()));
        }
        if id_part.is_empty()
            || !id_part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(CommandParseError::Malformed(token.to_string()));
        }

        let action = CommandAction::from_token(action_part)
            .ok_or_else(|| CommandParseError::UnknownAction(action_part.to_string()))?;
        let order_id = Uuid::parse_str(id_part)
            .map_err(|_| CommandParseError::BadOrderId(id_part.to_string()))?;

        Ok(BotCommand { action, order_id })
    }
}

/// Keyword table for the legacy encoding, longest-first so multi-word
/// keywords win over their prefixes.
const LEGACY_KEYWORDS: &[(&str, CommandAction)] = &[
    ("status_info", CommandAction::StatusInfo),
    ("on_the_way", CommandAction::OnTheWay),
    ("delivering", CommandAction::OnTheWay),
    ("confirmed", CommandAction::Approve),
    ("cancelled", CommandAction::Reject),
    ("delivered", CommandAction::Delivered),
    ("preparing", CommandAction::Preparing),
    ("approve", CommandAction::Approve),
    ("reject", CommandAction::Reject),
    ("status", CommandAction::StatusInfo),
    ("call", CommandAction::Call),
];

/// The only place the legacy wire format is understood; everything past the
/// parser sees the normalized `BotCommand`.
fn parse_legacy(token: &str, rest: &str) -> Result<BotCommand, CommandParseError> {
    for (keyword, action) in LEGACY_KEYWORDS {
        if let Some(id_part) = rest
            .strip_prefix(keyword)
            .and_then(|tail| tail.strip_prefix('_'))
        {
            let order_id = Uuid::parse_str(id_part)
                .map_err(|_| CommandParseError::BadOrderId(id_part.to_string()))?;
            return Ok(BotCommand {
                action: *action,
                order_id,
            });
        }
    }
    Err(CommandParseError::Malformed(token.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum CommandParseError {
    #[error("Malformed command token: {0}")]
    Malformed(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid order reference: {0}")]
    BadOrderId(String),
}

/// Inbound webhook payload after transport-level unwrapping
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub token: String,
    /// The chat message carrying the tapped control, when the transport
    /// provides it; used to refresh the control keyboard in place
    pub message_id: Option<i64>,
    /// External user id of the sender, recorded as the audit actor
    pub sender_id: String,
}

/// Short human-readable reply shown to the sender; the webhook always
/// acknowledges, whatever happened underneath
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acknowledgment {
    pub text: String,
}

impl Acknowledgment {
    fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Applies inbound chat-bot commands to the order lifecycle.
///
/// Every failure path turns into an acknowledgment; this handler must never
/// crash the webhook that hosts it.
pub struct CommandHandler {
    lifecycle: Arc<OrderLifecycle>,
    bot: Arc<dyn BotGateway>,
}

impl CommandHandler {
    pub fn new(lifecycle: Arc<OrderLifecycle>, bot: Arc<dyn BotGateway>) -> Self {
        Self { lifecycle, bot }
    }

    pub async fn handle(&self, inbound: InboundCommand) -> Acknowledgment {
        let command = match BotCommand::parse(&inbound.token) {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!(token = %inbound.token, error = %err, "rejected inbound command");
                return Acknowledgment::new("Sorry, I could not read that command.");
            }
        };

        match command.action {
            CommandAction::Call => self.contact_card(command.order_id).await,
            CommandAction::StatusInfo => self.status_line(command.order_id).await,
            action => match action.target_status() {
                Some(target) => self.apply_transition(command.order_id, target, &inbound).await,
                None => Acknowledgment::new("Nothing to do."),
            },
        }
    }

    /// Side-channel action: surface contact info, mutate nothing
    async fn contact_card(&self, order_id: Uuid) -> Acknowledgment {
        match self.lifecycle.get_order(order_id).await {
            Ok(order) => Acknowledgment::new(format!(
                "Call {}: {}",
                order.customer.name, order.customer.phone.0
            )),
            Err(OrderError::NotFound(_)) => Acknowledgment::new("Order not found."),
            Err(err) => {
                tracing::warn!(order_id = %order_id, error = %err, "contact lookup failed");
                Acknowledgment::new("Something went wrong, try again later.")
            }
        }
    }

    async fn status_line(&self, order_id: Uuid) -> Acknowledgment {
        match self.lifecycle.get_order(order_id).await {
            Ok(order) => Acknowledgment::new(format!(
                "Order #{} is {}.",
                short_id(order.id),
                order.status
            )),
            Err(OrderError::NotFound(_)) => Acknowledgment::new("Order not found."),
            Err(err) => {
                tracing::warn!(order_id = %order_id, error = %err, "status lookup failed");
                Acknowledgment::new("Something went wrong, try again later.")
            }
        }
    }

    async fn apply_transition(
        &self,
        order_id: Uuid,
        target: OrderStatus,
        inbound: &InboundCommand,
    ) -> Acknowledgment {
        let actor = format!("channel:{}", inbound.sender_id);
        match self.lifecycle.update_status(order_id, target, &actor).await {
            Ok(order) => {
                // Refresh the keyboard so only currently-legal controls stay
                // active on the original message
                if let Some(message_id) = inbound.message_id {
                    let controls = controls_for(order.status, order.id);
                    if let Err(err) = self.bot.update_controls(message_id, &controls).await {
                        tracing::warn!(
                            order_id = %order_id,
                            error = %err,
                            "failed to refresh chat controls"
                        );
                    }
                }
                Acknowledgment::new(format!(
                    "Order #{} marked {}.",
                    short_id(order.id),
                    order.status
                ))
            }
            Err(OrderError::NotFound(_)) => Acknowledgment::new("Order not found."),
            Err(OrderError::InvalidTransition { from, .. }) => {
                Acknowledgment::new(format!("Can't do that from {from}."))
            }
            Err(OrderError::Conflict(_)) => {
                Acknowledgment::new("Someone else just updated this order, try again.")
            }
            Err(err) => {
                tracing::warn!(order_id = %order_id, error = %err, "inbound command failed");
                Acknowledgment::new("Something went wrong, try again later.")
            }
        }
    }
}
