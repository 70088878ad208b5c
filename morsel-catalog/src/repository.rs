use crate::product::{Product, Restaurant};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository trait for menu/catalog access
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn get_product(
        &self,
        id: Uuid,
    ) -> Result<Option<Product>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_products(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_restaurant(
        &self,
        id: Uuid,
    ) -> Result<Option<Restaurant>, Box<dyn std::error::Error + Send + Sync>>;
}
