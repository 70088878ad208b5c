use async_trait::async_trait;
use morsel_catalog::{CatalogRepository, Product, Restaurant};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    restaurant_id: Uuid,
    name: String,
    description: Option<String>,
    category: String,
    price: f64,
    keywords: Vec<String>,
    is_active: bool,
}

impl ProductRow {
    fn into_product(self) -> Result<Product, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Product {
            id: self.id,
            restaurant_id: self.restaurant_id,
            name: self.name,
            description: self.description,
            category: self.category.parse()?,
            price: self.price,
            keywords: self.keywords,
            is_active: self.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RestaurantRow {
    id: Uuid,
    name: String,
    phone: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    is_active: bool,
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn get_product(
        &self,
        id: Uuid,
    ) -> Result<Option<Product>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT id, restaurant_id, name, description, category, price, keywords, is_active \
             FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductRow::into_product).transpose()
    }

    async fn list_products(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<Product>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, restaurant_id, name, description, category, price, keywords, is_active \
             FROM products WHERE restaurant_id = $1 AND is_active = TRUE ORDER BY name",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProductRow::into_product).collect()
    }

    async fn get_restaurant(
        &self,
        id: Uuid,
    ) -> Result<Option<Restaurant>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, RestaurantRow>(
            "SELECT id, name, phone, lat, lng, is_active FROM restaurants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Restaurant {
            id: r.id,
            name: r.name,
            phone: r.phone,
            lat: r.lat,
            lng: r.lng,
            is_active: r.is_active,
        }))
    }
}
