use chrono::{DateTime, Duration, Timelike, Utc};
use morsel_catalog::ProductCategory;
use morsel_order::models::Order;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coarse order-time buckets used for preference profiling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeBucket {
    Breakfast,
    Lunch,
    Afternoon,
    Dinner,
    LateNight,
}

impl TimeBucket {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=10 => TimeBucket::Breakfast,
            11..=14 => TimeBucket::Lunch,
            15..=17 => TimeBucket::Afternoon,
            18..=22 => TimeBucket::Dinner,
            _ => TimeBucket::LateNight,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrequencyTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceTier {
    Budget,
    Standard,
    Premium,
}

const DIETARY_KEYWORDS: &[&str] = &[
    "vegan",
    "vegetarian",
    "gluten-free",
    "halal",
    "lactose-free",
    "spicy",
];

/// Derived customer profile, rebuilt on demand from order history.
///
/// Advisory only: it biases recommendations and is never authoritative for
/// order processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInsight {
    pub preferred_time_buckets: Vec<TimeBucket>,
    pub favorite_categories: Vec<ProductCategory>,
    pub average_order_value: f64,
    pub loyalty_score: u8,
    pub dietary_tags: Vec<String>,
    pub frequency_tier: FrequencyTier,
    pub price_tier: PriceTier,
}

impl CustomerInsight {
    /// Neutral profile for customers with no history
    pub fn default_profile() -> Self {
        Self {
            preferred_time_buckets: Vec::new(),
            favorite_categories: Vec::new(),
            average_order_value: 0.0,
            loyalty_score: 0,
            dietary_tags: Vec::new(),
            frequency_tier: FrequencyTier::Low,
            price_tier: PriceTier::Standard,
        }
    }

    pub fn from_orders(orders: &[Order], now: DateTime<Utc>) -> Self {
        if orders.is_empty() {
            return Self::default_profile();
        }

        let mut bucket_counts: HashMap<TimeBucket, usize> = HashMap::new();
        let mut category_counts: HashMap<ProductCategory, usize> = HashMap::new();
        let mut dietary_counts: HashMap<&'static str, usize> = HashMap::new();
        let mut total_value = 0.0;
        let mut recent_30d = 0usize;

        for order in orders {
            total_value += order.total;
            *bucket_counts
                .entry(TimeBucket::from_hour(order.created_at.hour()))
                .or_default() += 1;
            if now - order.created_at <= Duration::days(30) {
                recent_30d += 1;
            }
            for item in &order.items {
                *category_counts.entry(item.category).or_default() += item.quantity as usize;
                let name = item.name.to_lowercase();
                for keyword in DIETARY_KEYWORDS {
                    if name.contains(keyword) {
                        *dietary_counts.entry(keyword).or_default() += 1;
                    }
                }
            }
        }

        let mut buckets: Vec<(TimeBucket, usize)> = bucket_counts.into_iter().collect();
        buckets.sort_by(|a, b| b.1.cmp(&a.1));
        let preferred_time_buckets = buckets.into_iter().take(2).map(|(b, _)| b).collect();

        let mut categories: Vec<(ProductCategory, usize)> = category_counts.into_iter().collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1));
        let favorite_categories = categories.into_iter().take(3).map(|(c, _)| c).collect();

        // A tag is inferred only once it shows up repeatedly
        let mut dietary_tags: Vec<String> = dietary_counts
            .into_iter()
            .filter(|(_, count)| *count >= 2)
            .map(|(keyword, _)| keyword.to_string())
            .collect();
        dietary_tags.sort();

        let average_order_value = total_value / orders.len() as f64;
        let loyalty_score = (orders.len() * 5 + recent_30d * 10).min(100) as u8;

        let frequency_tier = match recent_30d {
            0..=2 => FrequencyTier::Low,
            3..=7 => FrequencyTier::Medium,
            _ => FrequencyTier::High,
        };

        let price_tier = if average_order_value < 50.0 {
            PriceTier::Budget
        } else if average_order_value < 120.0 {
            PriceTier::Standard
        } else {
            PriceTier::Premium
        };

        Self {
            preferred_time_buckets,
            favorite_categories,
            average_order_value,
            loyalty_score,
            dietary_tags,
            frequency_tier,
            price_tier,
        }
    }

    /// Mean unit price across historical line items; the anchor for the
    /// price-band recommendation heuristic
    pub fn average_item_price(orders: &[Order]) -> Option<f64> {
        let mut total = 0.0;
        let mut count = 0u32;
        for order in orders {
            for item in &order.items {
                total += item.unit_price * item.quantity as f64;
                count += item.quantity;
            }
        }
        (count > 0).then(|| total / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use morsel_catalog::ProductCategory;
    use morsel_order::models::{
        Customer, DeliveryAddress, NewOrder, OrderItem, PaymentMethod,
    };
    use morsel_shared::pii::Masked;
    use uuid::Uuid;

    fn order_at(created_at: DateTime<Utc>, item_name: &str, unit_price: f64) -> Order {
        let draft = NewOrder {
            customer: Customer {
                id: "cust-1".to_string(),
                name: "Ada".to_string(),
                phone: Masked("+90 555 000 0001".to_string()),
                email: Masked("ada@example.com".to_string()),
            },
            restaurant_id: Uuid::new_v4(),
            items: vec![OrderItem {
                product_id: Uuid::new_v4(),
                name: item_name.to_string(),
                category: ProductCategory::MainDish,
                unit_price,
                quantity: 1,
                note: None,
            }],
            delivery_fee: 10.0,
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
        let mut order = Order::from_draft(draft, settlement);
        order.created_at = created_at;
        order
    }

    #[test]
    fn empty_history_yields_neutral_profile() {
        let insight = CustomerInsight::from_orders(&[], Utc::now());
        assert_eq!(insight.loyalty_score, 0);
        assert_eq!(insight.frequency_tier, FrequencyTier::Low);
        assert_eq!(insight.price_tier, PriceTier::Standard);
        assert!(insight.favorite_categories.is_empty());
    }

    #[test]
    fn repeated_dietary_keywords_become_tags() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 19, 0, 0).unwrap();
        let orders = vec![
            order_at(now - Duration::days(3), "Vegan Burger", 12.0),
            order_at(now - Duration::days(9), "Vegan Wrap", 10.0),
            order_at(now - Duration::days(20), "Halal Chicken", 14.0),
        ];

        let insight = CustomerInsight::from_orders(&orders, now);
        assert!(insight.dietary_tags.contains(&"vegan".to_string()));
        // Single occurrence is not enough to infer a tag
        assert!(!insight.dietary_tags.contains(&"halal".to_string()));
    }

    #[test]
    fn dinner_heavy_history_prefers_dinner_bucket() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let dinner = Utc.with_ymd_and_hms(2024, 6, 7, 19, 30, 0).unwrap();
        let orders = vec![
            order_at(dinner, "Kebab", 15.0),
            order_at(dinner - Duration::days(2), "Pide", 13.0),
            order_at(dinner - Duration::days(5), "Kofte", 14.0),
        ];

        let insight = CustomerInsight::from_orders(&orders, now);
        assert_eq!(insight.preferred_time_buckets[0], TimeBucket::Dinner);
        assert_eq!(insight.frequency_tier, FrequencyTier::Medium);
    }
}
