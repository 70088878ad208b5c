use morsel_catalog::CatalogRepository;
use morsel_insight::{DeliveryPredictor, Recommender};
use morsel_notify::CommandHandler;
use morsel_order::lifecycle::OrderLifecycle;
use morsel_order::repository::{OrderRepository, TransactionRepository};
use morsel_store::app_config::BusinessRules;
use morsel_store::RedisClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
    pub catalog: Arc<dyn CatalogRepository>,
    pub lifecycle: Arc<OrderLifecycle>,
    pub predictor: Arc<dyn DeliveryPredictor>,
    pub recommender: Arc<dyn Recommender>,
    pub commands: Arc<CommandHandler>,
    /// Optional so the router runs without infrastructure in tests;
    /// rate limiting and response caching fail open when absent
    pub redis: Option<Arc<RedisClient>>,
    pub business_rules: BusinessRules,
}
