pub mod insight;
pub mod predictor;
pub mod recommender;

pub use insight::{CustomerInsight, FrequencyTier, PriceTier, TimeBucket};
pub use predictor::{DeliveryPredictor, FactorBreakdown, HeuristicPredictor, Prediction};
pub use recommender::{HeuristicRecommender, Recommendation, RecommendationKind, Recommender};

#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("Order history unavailable: {0}")]
    History(String),

    #[error("Catalog unavailable: {0}")]
    Catalog(String),
}
