use crate::product::{Product, Restaurant};
use crate::repository::CatalogRepository;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory catalog used by tests and local development
pub struct InMemoryCatalog {
    products: RwLock<HashMap<Uuid, Product>>,
    restaurants: RwLock<HashMap<Uuid, Restaurant>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
            restaurants: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_product(&self, product: Product) {
        self.products
            .write()
            .expect("catalog lock poisoned")
            .insert(product.id, product);
    }

    pub fn add_restaurant(&self, restaurant: Restaurant) {
        self.restaurants
            .write()
            .expect("catalog lock poisoned")
            .insert(restaurant.id, restaurant);
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn get_product(
        &self,
        id: Uuid,
    ) -> Result<Option<Product>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .products
            .read()
            .expect("catalog lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn list_products(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .products
            .read()
            .expect("catalog lock poisoned")
            .values()
            .filter(|p| p.restaurant_id == restaurant_id && p.is_active)
            .cloned()
            .collect())
    }

    async fn get_restaurant(
        &self,
        id: Uuid,
    ) -> Result<Option<Restaurant>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .restaurants
            .read()
            .expect("catalog lock poisoned")
            .get(&id)
            .cloned())
    }
}
