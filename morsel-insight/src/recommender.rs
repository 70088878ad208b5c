use crate::insight::CustomerInsight;
use crate::InsightError;
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use morsel_catalog::{CatalogRepository, Product, ProductCategory};
use morsel_order::repository::OrderRepository;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

const MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationKind {
    Complementary,
    Preference,
    Seasonal,
    Dietary,
    PriceMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub product_id: Uuid,
    pub product_name: String,
    pub reason: String,
    pub confidence: f64,
    pub kind: RecommendationKind,
}

/// Pluggable recommendation scoring, same substitution seam as the predictor
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend(
        &self,
        customer_id: &str,
        cart: &[Uuid],
        restaurant_id: Uuid,
    ) -> Result<Vec<Recommendation>, InsightError>;
}

/// Rule-based recommender merging five independent candidate sources
pub struct HeuristicRecommender {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
}

impl HeuristicRecommender {
    pub fn new(orders: Arc<dyn OrderRepository>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { orders, catalog }
    }
}

#[async_trait]
impl Recommender for HeuristicRecommender {
    async fn recommend(
        &self,
        customer_id: &str,
        cart: &[Uuid],
        restaurant_id: Uuid,
    ) -> Result<Vec<Recommendation>, InsightError> {
        let history = self
            .orders
            .list_for_customer(customer_id)
            .await
            .map_err(|e| InsightError::History(e.to_string()))?;
        let insight = CustomerInsight::from_orders(&history, Utc::now());

        let products = self
            .catalog
            .list_products(restaurant_id)
            .await
            .map_err(|e| InsightError::Catalog(e.to_string()))?;

        let cart_ids: HashSet<Uuid> = cart.iter().copied().collect();
        let cart_has_main = products
            .iter()
            .filter(|p| cart_ids.contains(&p.id))
            .any(|p| p.category.is_main_dish());

        let mut merged: HashMap<Uuid, Recommendation> = HashMap::new();
        let mut offer = |candidate: Recommendation| {
            if cart_ids.contains(&candidate.product_id) {
                return;
            }
            match merged.get(&candidate.product_id) {
                Some(existing) if existing.confidence >= candidate.confidence => {}
                _ => {
                    merged.insert(candidate.product_id, candidate);
                }
            }
        };

        let season_keywords = season_keywords(Utc::now().month());
        let price_band = CustomerInsight::average_item_price(&history)
            .map(|avg| (avg * 0.7, avg * 1.3));

        for product in &products {
            if cart_has_main && product.category == ProductCategory::Drink {
                offer(Recommendation {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    reason: "Pairs well with the main dish in your cart".to_string(),
                    confidence: 0.8,
                    kind: RecommendationKind::Complementary,
                });
            }

            if insight.favorite_categories.contains(&product.category) {
                offer(Recommendation {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    reason: format!("You often order {:?}", product.category),
                    confidence: 0.7,
                    kind: RecommendationKind::Preference,
                });
            }

            if let Some(keyword) = season_keywords
                .iter()
                .find(|keyword| product.matches_keyword(keyword))
            {
                offer(Recommendation {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    reason: format!("In season right now: {keyword}"),
                    confidence: 0.6,
                    kind: RecommendationKind::Seasonal,
                });
            }

            if let Some(tag) = insight
                .dietary_tags
                .iter()
                .find(|tag| product.matches_keyword(tag))
            {
                offer(Recommendation {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    reason: format!("Matches your {tag} preference"),
                    confidence: 0.65,
                    kind: RecommendationKind::Dietary,
                });
            }

            if let Some((low, high)) = price_band {
                if product.price >= low && product.price <= high {
                    offer(Recommendation {
                        product_id: product.id,
                        product_name: product.name.clone(),
                        reason: "In your usual price range".to_string(),
                        confidence: 0.55,
                        kind: RecommendationKind::PriceMatch,
                    });
                }
            }
        }

        let mut recommendations: Vec<Recommendation> = merged.into_values().collect();
        recommendations.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        recommendations.truncate(MAX_RESULTS);
        Ok(recommendations)
    }
}

fn season_keywords(month: u32) -> &'static [&'static str] {
    match month {
        12 | 1 | 2 => &["soup", "stew", "hot"],
        3..=5 => &["fresh", "green", "salad"],
        6..=8 => &["ice", "cold", "smoothie", "salad"],
        _ => &["pumpkin", "warm", "soup"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morsel_catalog::{InMemoryCatalog, Restaurant};
    use morsel_order::memory::InMemoryOrderRepository;
    use morsel_order::models::{
        Customer, DeliveryAddress, NewOrder, OrderItem, PaymentMethod,
    };
    use morsel_order::repository::OrderRepository as _;
    use morsel_shared::pii::Masked;

    struct Fixture {
        orders: Arc<InMemoryOrderRepository>,
        catalog: Arc<InMemoryCatalog>,
        restaurant_id: Uuid,
        main: Product,
        drink: Product,
    }

    fn fixture() -> Fixture {
        let catalog = InMemoryCatalog::new();
        let restaurant = Restaurant::new("Kebab House".to_string());
        let restaurant_id = restaurant.id;
        catalog.add_restaurant(restaurant);

        let main = Product::new(
            restaurant_id,
            "Adana Kebab".to_string(),
            ProductCategory::MainDish,
            14.0,
        );
        let drink = Product::new(
            restaurant_id,
            "Ayran".to_string(),
            ProductCategory::Drink,
            3.0,
        );
        let dessert = Product::new(
            restaurant_id,
            "Baklava".to_string(),
            ProductCategory::Dessert,
            7.0,
        );
        catalog.add_product(main.clone());
        catalog.add_product(drink.clone());
        catalog.add_product(dessert);

        Fixture {
            orders: Arc::new(InMemoryOrderRepository::new()),
            catalog: Arc::new(catalog),
            restaurant_id,
            main,
            drink,
        }
    }

    async fn seed_history(fixture: &Fixture, customer_id: &str, orders: usize) {
        for _ in 0..orders {
            let draft = NewOrder {
                customer: Customer {
                    id: customer_id.to_string(),
                    name: "Ada".to_string(),
                    phone: Masked("+90 555 000 0001".to_string()),
                    email: Masked("ada@example.com".to_string()),
                },
                restaurant_id: fixture.restaurant_id,
                items: vec![OrderItem {
                    product_id: fixture.main.id,
                    name: fixture.main.name.clone(),
                    category: ProductCategory::MainDish,
                    unit_price: fixture.main.price,
                    quantity: 1,
                    note: None,
                }],
                delivery_fee: 5.0,
                payment_method: PaymentMethod::CashOnDelivery,
                delivery_address: DeliveryAddress {
                    street: "12 Harbour St".to_string(),
                    city: "Izmir".to_string(),
                    postal_code: None,
                    lat: None,
                    lng: None,
                },
                special_instructions: None,
                estimated_delivery_at: None,
            };
            let settlement = morsel_order::commission::split(draft.subtotal(), 0.09);
            let order = morsel_order::models::Order::from_draft(draft, settlement);
            fixture.orders.insert_order(&order).await.unwrap();
        }
    }

    #[tokio::test]
    async fn main_dish_in_cart_suggests_a_drink() {
        let f = fixture();
        let recommender = HeuristicRecommender::new(f.orders.clone(), f.catalog.clone());

        let results = recommender
            .recommend("cust-1", &[f.main.id], f.restaurant_id)
            .await
            .unwrap();

        let drink = results
            .iter()
            .find(|r| r.product_id == f.drink.id)
            .expect("drink suggested");
        assert_eq!(drink.kind, RecommendationKind::Complementary);
    }

    #[tokio::test]
    async fn output_is_sorted_and_excludes_the_cart() {
        let f = fixture();
        seed_history(&f, "cust-1", 4).await;
        let recommender = HeuristicRecommender::new(f.orders.clone(), f.catalog.clone());

        let cart = vec![f.main.id];
        let results = recommender
            .recommend("cust-1", &cart, f.restaurant_id)
            .await
            .unwrap();

        assert!(results.len() <= MAX_RESULTS);
        assert!(results.iter().all(|r| !cart.contains(&r.product_id)));
        for pair in results.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.confidence)));
    }

    #[tokio::test]
    async fn no_history_still_produces_suggestions() {
        let f = fixture();
        let recommender = HeuristicRecommender::new(f.orders.clone(), f.catalog.clone());

        let results = recommender
            .recommend("fresh-customer", &[f.main.id], f.restaurant_id)
            .await
            .unwrap();

        // Complementary pairing works without any profile
        assert!(results.iter().any(|r| r.product_id == f.drink.id));
    }
}
