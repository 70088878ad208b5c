use morsel_order::models::OrderStatus;
use serde::Serialize;
use uuid::Uuid;

/// One tappable control embedded in a chat-bot message
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub token: String,
}

impl Control {
    fn new(label: &str, action: &str, order_id: Uuid) -> Self {
        Self {
            label: label.to_string(),
            token: format!("{action}:{}", order_id.simple()),
        }
    }
}

/// Controls that are legal for an order in the given status.
///
/// This is the presentation-side state machine over the transition graph:
/// after each successful command the previously sent message is edited down
/// to this set, so stale controls go inert. Terminal states collapse to a
/// status display plus the permanent call-customer action.
pub fn controls_for(status: OrderStatus, order_id: Uuid) -> Vec<Control> {
    let call = Control::new("Call customer", "call", order_id);

    match status {
        OrderStatus::Pending => vec![
            Control::new("Approve", "approve", order_id),
            Control::new("Reject", "reject", order_id),
            call,
        ],
        OrderStatus::Confirmed => vec![
            Control::new("Start preparing", "preparing", order_id),
            Control::new("Reject", "reject", order_id),
            call,
        ],
        OrderStatus::Preparing | OrderStatus::Ready | OrderStatus::Assigned => vec![
            Control::new("On the way", "on_the_way", order_id),
            call,
        ],
        OrderStatus::PickedUp | OrderStatus::Delivering | OrderStatus::Arrived => vec![
            Control::new("Delivered", "delivered", order_id),
            call,
        ],
        OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded => vec![
            Control::new(&format!("Status: {status}"), "status_info", order_id),
            call,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(status: OrderStatus, order_id: Uuid) -> Vec<String> {
        controls_for(status, order_id)
            .into_iter()
            .map(|c| c.token.split(':').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn pending_offers_approve_and_reject() {
        let id = Uuid::new_v4();
        assert_eq!(tokens(OrderStatus::Pending, id), ["approve", "reject", "call"]);
    }

    #[test]
    fn preparing_retires_approve_and_activates_on_the_way() {
        let id = Uuid::new_v4();
        let actions = tokens(OrderStatus::Preparing, id);
        assert!(!actions.contains(&"approve".to_string()));
        assert_eq!(actions, ["on_the_way", "call"]);
    }

    #[test]
    fn terminal_states_collapse_to_status_and_call() {
        let id = Uuid::new_v4();
        for status in [
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            let controls = controls_for(status, id);
            assert_eq!(controls.len(), 2);
            assert!(controls[0].token.starts_with("status_info:"));
            assert!(controls[0].label.contains(status.as_str()));
            assert!(controls[1].token.starts_with("call:"));
        }
    }

    #[test]
    fn every_token_round_trips_through_the_parser() {
        let id = Uuid::new_v4();
        for status in OrderStatus::ALL {
            for control in controls_for(status, id) {
                let command = crate::commands::BotCommand::parse(&control.token).unwrap();
                assert_eq!(command.order_id, id);
            }
        }
    }
}
