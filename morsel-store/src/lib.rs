pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod order_repo;
pub mod redis_repo;
pub mod transaction_repo;

pub use app_config::Config;
pub use catalog_repo::PgCatalogRepository;
pub use database::DbClient;
pub use order_repo::PgOrderRepository;
pub use redis_repo::RedisClient;
pub use transaction_repo::PgTransactionRepository;
