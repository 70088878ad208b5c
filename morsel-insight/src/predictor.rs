use crate::InsightError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use morsel_catalog::{CatalogRepository, ProductCategory};
use morsel_order::models::{DeliveryAddress, OrderItem};
use morsel_order::repository::OrderRepository;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Baseline delivery duration the heuristics normalize around
pub const BASELINE_MINUTES: f64 = 45.0;
const FALLBACK_CONFIDENCE: f64 = 0.7;
const HISTORY_WINDOW_DAYS: i64 = 30;
const MIN_HISTORY_SAMPLES: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub estimated_minutes: u32,
    pub confidence: f64,
    pub factors: FactorBreakdown,
}

impl Prediction {
    /// Fixed estimate returned when any internal signal fails
    pub fn fallback(baseline_minutes: f64) -> Self {
        Self {
            estimated_minutes: baseline_minutes.round() as u32,
            confidence: FALLBACK_CONFIDENCE,
            factors: FactorBreakdown::neutral(baseline_minutes),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FactorBreakdown {
    pub prep_minutes: f64,
    pub distance_minutes: f64,
    pub time_of_day: f64,
    pub weather: f64,
    pub load: f64,
    pub historical: f64,
    pub historical_samples: usize,
}

impl FactorBreakdown {
    fn neutral(baseline_minutes: f64) -> Self {
        Self {
            prep_minutes: baseline_minutes,
            distance_minutes: 0.0,
            time_of_day: 1.0,
            weather: 1.0,
            load: 1.0,
            historical: 1.0,
            historical_samples: 0,
        }
    }
}

/// Pluggable delivery-time estimation.
///
/// Implementations must never fail the caller: a broken signal degrades to
/// the fixed fallback estimate instead.
#[async_trait]
pub trait DeliveryPredictor: Send + Sync {
    async fn predict(
        &self,
        restaurant_id: Uuid,
        address: &DeliveryAddress,
        items: &[OrderItem],
        now: DateTime<Utc>,
    ) -> Prediction;
}

/// Rule-based predictor over live restaurant load and realized delivery
/// history. Today's concrete implementation of `DeliveryPredictor`; a learned
/// model can replace it behind the same trait.
pub struct HeuristicPredictor {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
    baseline_minutes: f64,
}

impl HeuristicPredictor {
    pub fn new(orders: Arc<dyn OrderRepository>, catalog: Arc<dyn CatalogRepository>) -> Self {
        Self::with_baseline(orders, catalog, BASELINE_MINUTES)
    }

    pub fn with_baseline(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogRepository>,
        baseline_minutes: f64,
    ) -> Self {
        Self {
            orders,
            catalog,
            baseline_minutes,
        }
    }

    async fn estimate(
        &self,
        restaurant_id: Uuid,
        address: &DeliveryAddress,
        items: &[OrderItem],
        now: DateTime<Utc>,
    ) -> Result<Prediction, InsightError> {
        let prep_minutes = prep_minutes(items);

        let restaurant = self
            .catalog
            .get_restaurant(restaurant_id)
            .await
            .map_err(|e| InsightError::Catalog(e.to_string()))?;
        let distance_minutes = match (
            restaurant.as_ref().and_then(|r| r.location()),
            address.location(),
        ) {
            (Some(from), Some(to)) => distance_minutes(from, to),
            // Without both endpoints geocoded, assume an average hop
            _ => 15.0,
        };

        let time_of_day = time_of_day_multiplier(now.hour());

        // Placeholder, not a predictive signal: stands in for a weather feed
        // that was never wired up. Kept random and clearly labeled rather
        // than silently replaced.
        let weather = rand::thread_rng().gen_range(0.9..1.3);

        let active = self
            .orders
            .count_active_for_restaurant(restaurant_id)
            .await
            .map_err(|e| InsightError::History(e.to_string()))?;
        let load = load_multiplier(active);

        let since = now - Duration::days(HISTORY_WINDOW_DAYS);
        let delivered = self
            .orders
            .list_delivered_since(restaurant_id, since)
            .await
            .map_err(|e| InsightError::History(e.to_string()))?;
        let durations: Vec<f64> = delivered
            .iter()
            .filter(|o| o.created_at.hour() == now.hour())
            .filter_map(|o| o.delivery_duration_minutes())
            .collect();
        let historical_samples = durations.len();
        let historical = if historical_samples >= MIN_HISTORY_SAMPLES {
            let mean = durations.iter().sum::<f64>() / historical_samples as f64;
            (mean / self.baseline_minutes).clamp(0.6, 1.6)
        } else {
            1.0
        };

        let base = prep_minutes + distance_minutes;
        let estimated = (base * time_of_day * weather * load * historical).clamp(10.0, 180.0);

        let sample_boost = (historical_samples.min(20) as f64 / 20.0) * 0.2;
        let weather_penalty = (weather - 1.0).abs() * 0.3;
        let load_penalty = (load - 1.0).max(0.0) * 0.2;
        let confidence = (0.7 + sample_boost - weather_penalty - load_penalty).clamp(0.5, 0.95);

        Ok(Prediction {
            estimated_minutes: estimated.round() as u32,
            confidence,
            factors: FactorBreakdown {
                prep_minutes,
                distance_minutes,
                time_of_day,
                weather,
                load,
                historical,
                historical_samples,
            },
        })
    }
}

#[async_trait]
impl DeliveryPredictor for HeuristicPredictor {
    async fn predict(
        &self,
        restaurant_id: Uuid,
        address: &DeliveryAddress,
        items: &[OrderItem],
        now: DateTime<Utc>,
    ) -> Prediction {
        match self.estimate(restaurant_id, address, items, now).await {
            Ok(prediction) => prediction,
            Err(err) => {
                tracing::warn!(
                    restaurant_id = %restaurant_id,
                    error = %err,
                    "prediction signals unavailable, using fixed fallback"
                );
                Prediction::fallback(self.baseline_minutes)
            }
        }
    }
}

fn category_prep_minutes(category: ProductCategory) -> f64 {
    match category {
        ProductCategory::MainDish => 12.0,
        ProductCategory::Soup => 8.0,
        ProductCategory::Salad => 6.0,
        ProductCategory::Side => 5.0,
        ProductCategory::Dessert => 4.0,
        ProductCategory::Drink => 2.0,
    }
}

/// Kitchen time: the slowest item dominates, extra units add a little
fn prep_minutes(items: &[OrderItem]) -> f64 {
    let slowest = items
        .iter()
        .map(|item| category_prep_minutes(item.category))
        .fold(0.0, f64::max);
    let total_units: u32 = items.iter().map(|item| item.quantity).sum();
    let extras = (total_units.saturating_sub(1) as f64 * 1.5).min(15.0);
    (slowest + extras).max(10.0)
}

fn distance_minutes(from: (f64, f64), to: (f64, f64)) -> f64 {
    (haversine_km(from, to) * 2.5 + 5.0).clamp(5.0, 40.0)
}

fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let (lat1, lng1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lng2) = (to.0.to_radians(), to.1.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = lng2 - lng1;
    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

fn time_of_day_multiplier(hour: u32) -> f64 {
    match hour {
        11..=13 => 1.3, // lunch rush
        18..=20 => 1.4, // dinner rush
        23 | 0..=4 => 0.85,
        _ => 1.0,
    }
}

fn load_multiplier(active_orders: u32) -> f64 {
    if active_orders > 10 {
        1.5
    } else if active_orders > 5 {
        1.2
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use morsel_catalog::{InMemoryCatalog, Restaurant};
    use morsel_order::memory::InMemoryOrderRepository;
    use morsel_order::models::{Customer, NewOrder, Order, OrderChange, OrderStatus, PaymentMethod};
    use morsel_order::repository::RepoError;
    use morsel_shared::pii::Masked;

    fn items() -> Vec<OrderItem> {
        vec![OrderItem {
            product_id: Uuid::new_v4(),
            name: "Iskender".to_string(),
            category: ProductCategory::MainDish,
            unit_price: 45.0,
            quantity: 2,
            note: None,
        }]
    }

    fn address() -> DeliveryAddress {
        DeliveryAddress {
            street: "12 Harbour St".to_string(),
            city: "Izmir".to_string(),
            postal_code: None,
            lat: Some(38.42),
            lng: Some(27.14),
        }
    }

    fn delivered_order(
        restaurant_id: Uuid,
        created_at: DateTime<Utc>,
        duration_minutes: i64,
    ) -> Order {
        let draft = NewOrder {
            customer: Customer {
                id: "cust-1".to_string(),
                name: "Ada".to_string(),
                phone: Masked("+90 555 000 0001".to_string()),
                email: Masked("ada@example.com".to_string()),
            },
            restaurant_id,
            items: items(),
            delivery_fee: 10.0,
            payment_method: PaymentMethod::CashOnDelivery,
            delivery_address: address(),
            special_instructions: None,
            estimated_delivery_at: None,
        };
        let settlement = morsel_order::commission::split(draft.subtotal(), 0.09);
        let mut order = Order::from_draft(draft, settlement);
        order.created_at = created_at;
        order.status = OrderStatus::Delivered;
        order.actual_delivery_at = Some(created_at + Duration::minutes(duration_minutes));
        order
    }

    async fn seed_active(repo: &InMemoryOrderRepository, restaurant_id: Uuid, count: usize) {
        for _ in 0..count {
            let draft = NewOrder {
                customer: Customer {
                    id: "other".to_string(),
                    name: "Grace".to_string(),
                    phone: Masked("+90 555 000 0002".to_string()),
                    email: Masked("grace@example.com".to_string()),
                },
                restaurant_id,
                items: items(),
                delivery_fee: 10.0,
                payment_method: PaymentMethod::CashOnDelivery,
                delivery_address: address(),
                special_instructions: None,
                estimated_delivery_at: None,
            };
            let settlement = morsel_order::commission::split(draft.subtotal(), 0.09);
            let order = Order::from_draft(draft, settlement);
            use morsel_order::repository::OrderRepository as _;
            repo.insert_order(&order).await.unwrap();
        }
    }

    #[tokio::test]
    async fn confidence_stays_inside_bounds_under_extremes() {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let restaurant = Restaurant::new("Kebab House".to_string());
        let restaurant_id = restaurant.id;
        catalog.add_restaurant(restaurant);
        seed_active(&orders, restaurant_id, 25).await;

        let predictor = HeuristicPredictor::new(orders, catalog);

        // The weather stub is random; sample repeatedly to cover its range
        for _ in 0..50 {
            let prediction = predictor
                .predict(restaurant_id, &address(), &items(), Utc::now())
                .await;
            assert!(prediction.confidence >= 0.5 && prediction.confidence <= 0.95);
            assert!(prediction.estimated_minutes >= 10);
        }
    }

    #[tokio::test]
    async fn heavy_load_applies_the_rush_multiplier() {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let restaurant = Restaurant::new("Kebab House".to_string());
        let restaurant_id = restaurant.id;
        catalog.add_restaurant(restaurant);
        seed_active(&orders, restaurant_id, 12).await;

        let predictor = HeuristicPredictor::new(orders, catalog);
        let prediction = predictor
            .predict(restaurant_id, &address(), &items(), Utc::now())
            .await;
        assert_eq!(prediction.factors.load, 1.5);
    }

    #[tokio::test]
    async fn historical_factor_needs_enough_samples() {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        let restaurant = Restaurant::new("Kebab House".to_string());
        let restaurant_id = restaurant.id;
        catalog.add_restaurant(restaurant);

        let now = Utc.with_ymd_and_hms(2024, 6, 10, 19, 0, 0).unwrap();

        // Three slow deliveries in the same hour: below the sample floor
        use morsel_order::repository::OrderRepository as _;
        for day in 1..=3 {
            let order =
                delivered_order(restaurant_id, now - Duration::days(day), 90);
            orders.insert_order(&order).await.unwrap();
        }
        let predictor =
            HeuristicPredictor::new(orders.clone(), catalog.clone());
        let prediction = predictor.predict(restaurant_id, &address(), &items(), now).await;
        assert_eq!(prediction.factors.historical, 1.0);

        // Six samples: the factor kicks in and skews slow
        for day in 4..=6 {
            let order =
                delivered_order(restaurant_id, now - Duration::days(day), 90);
            orders.insert_order(&order).await.unwrap();
        }
        let prediction = predictor.predict(restaurant_id, &address(), &items(), now).await;
        assert!(prediction.factors.historical > 1.0);
        assert_eq!(prediction.factors.historical_samples, 6);
    }

    struct BrokenOrderRepository;

    #[async_trait]
    impl morsel_order::repository::OrderRepository for BrokenOrderRepository {
        async fn insert_order(&self, _order: &Order) -> Result<(), RepoError> {
            Err("store offline".into())
        }
        async fn get_order(&self, _id: Uuid) -> Result<Option<Order>, RepoError> {
            Err("store offline".into())
        }
        async fn update_status(
            &self,
            _id: Uuid,
            _expected: OrderStatus,
            _next: OrderStatus,
            _delivered_at: Option<DateTime<Utc>>,
        ) -> Result<bool, RepoError> {
            Err("store offline".into())
        }
        async fn link_transaction(&self, _order_id: Uuid, _txn_id: Uuid) -> Result<(), RepoError> {
            Err("store offline".into())
        }
        async fn list_for_customer(&self, _customer_id: &str) -> Result<Vec<Order>, RepoError> {
            Err("store offline".into())
        }
        async fn count_active_for_restaurant(&self, _restaurant_id: Uuid) -> Result<u32, RepoError> {
            Err("store offline".into())
        }
        async fn list_delivered_since(
            &self,
            _restaurant_id: Uuid,
            _since: DateTime<Utc>,
        ) -> Result<Vec<Order>, RepoError> {
            Err("store offline".into())
        }
        async fn add_order_change(&self, _change: &OrderChange) -> Result<(), RepoError> {
            Err("store offline".into())
        }
    }

    #[tokio::test]
    async fn broken_signals_fall_back_to_the_fixed_estimate() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let predictor = HeuristicPredictor::new(Arc::new(BrokenOrderRepository), catalog);

        let prediction = predictor
            .predict(Uuid::new_v4(), &address(), &items(), Utc::now())
            .await;
        assert_eq!(prediction.estimated_minutes, 45);
        assert_eq!(prediction.confidence, 0.7);
    }
}
