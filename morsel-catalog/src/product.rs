use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Menu categories used for prep-time estimation and recommendations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    MainDish,
    Side,
    Salad,
    Soup,
    Drink,
    Dessert,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 6] = [
        ProductCategory::MainDish,
        ProductCategory::Side,
        ProductCategory::Salad,
        ProductCategory::Soup,
        ProductCategory::Drink,
        ProductCategory::Dessert,
    ];

    /// Whether ordering this category usually pairs with a drink
    pub fn is_main_dish(&self) -> bool {
        matches!(self, ProductCategory::MainDish)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::MainDish => "MAIN_DISH",
            ProductCategory::Side => "SIDE",
            ProductCategory::Salad => "SALAD",
            ProductCategory::Soup => "SOUP",
            ProductCategory::Drink => "DRINK",
            ProductCategory::Dessert => "DESSERT",
        }
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductCategory::ALL
            .iter()
            .find(|category| category.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown product category: {s}"))
    }
}

/// A menu product as listed by a restaurant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub price: f64,
    pub keywords: Vec<String>,
    pub is_active: bool,
}

impl Product {
    pub fn new(restaurant_id: Uuid, name: String, category: ProductCategory, price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            restaurant_id,
            name,
            description: None,
            category,
            price,
            keywords: Vec::new(),
            is_active: true,
        }
    }

    /// Case-insensitive keyword match against the name, description and tag list
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        if self.name.to_lowercase().contains(&needle) {
            return true;
        }
        if let Some(desc) = &self.description {
            if desc.to_lowercase().contains(&needle) {
                return true;
            }
        }
        self.keywords.iter().any(|k| k.to_lowercase() == needle)
    }
}

/// Restaurant master record consumed by ordering and prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub is_active: bool,
}

impl Restaurant {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            phone: None,
            lat: None,
            lng: None,
            is_active: true,
        }
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}
