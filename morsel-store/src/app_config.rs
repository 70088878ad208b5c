use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub channels: ChannelsConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelsConfig {
    pub chatbot: ChatBotConfig,
    pub messaging: MessagingConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatBotConfig {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MessagingConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub endpoint: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: f64,
    #[serde(default = "default_prediction_baseline")]
    pub prediction_baseline_minutes: f64,
    #[serde(default = "default_recommendation_cache")]
    pub recommendation_cache_seconds: u64,
}

fn default_commission_rate() -> f64 {
    0.09
}

fn default_delivery_fee() -> f64 {
    15.0
}

fn default_prediction_baseline() -> f64 {
    45.0
}

fn default_recommendation_cache() -> u64 {
    300
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            commission_rate: default_commission_rate(),
            delivery_fee: default_delivery_fee(),
            prediction_baseline_minutes: default_prediction_baseline(),
            recommendation_cache_seconds: default_recommendation_cache(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Layer the environment-specific file on top (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Finally environment variables with a MORSEL prefix,
            // e.g. MORSEL__SERVER__PORT=9000
            .add_source(config::Environment::with_prefix("MORSEL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
