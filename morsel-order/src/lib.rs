pub mod commission;
pub mod events;
pub mod finance;
pub mod lifecycle;
pub mod memory;
pub mod models;
pub mod repository;

pub use events::{OrderEvent, OrderEventSink};
pub use lifecycle::{OrderError, OrderLifecycle};
pub use memory::{InMemoryOrderRepository, InMemoryTransactionRepository};
pub use models::{
    Customer, DeliveryAddress, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod,
    SettlementSnapshot, Transaction, TransactionStatus,
};
pub use repository::{OrderRepository, TransactionRepository};
