use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPlacedEvent {
    pub order_id: Uuid,
    pub restaurant_id: Uuid,
    pub customer_id: String,
    pub total: f64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderStatusChangedEvent {
    pub order_id: Uuid,
    pub previous_status: String,
    pub new_status: String,
    pub actor: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SettlementRecordedEvent {
    pub order_id: Uuid,
    pub transaction_id: Uuid,
    pub gross_amount: f64,
    pub commission_amount: f64,
    pub restaurant_amount: f64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ChannelFailureEvent {
    pub order_id: Uuid,
    pub channel: String,
    pub reason: String,
    pub timestamp: i64,
}
