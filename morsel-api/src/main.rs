use morsel_api::{app, AppState};
use morsel_insight::{HeuristicPredictor, HeuristicRecommender};
use morsel_notify::{
    ChatBotChannel, CommandHandler, EmailChannel, MessagingChannel, NotificationDispatcher,
};
use morsel_notify::channel::ChannelAdapter;
use morsel_order::lifecycle::OrderLifecycle;
use morsel_store::{
    DbClient, PgCatalogRepository, PgOrderRepository, PgTransactionRepository, RedisClient,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "morsel_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = morsel_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting Morsel API on port {}", config.server.port);

    // Postgres
    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Redis
    let redis = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to connect to Redis");
    let redis = Arc::new(redis);

    // Repositories
    let orders = Arc::new(PgOrderRepository::new(db.pool.clone()));
    let transactions = Arc::new(PgTransactionRepository::new(db.pool.clone()));
    let catalog = Arc::new(PgCatalogRepository::new(db.pool.clone()));

    // Notification channels
    let chatbot = Arc::new(ChatBotChannel::new(
        config.channels.chatbot.api_base.clone(),
        config.channels.chatbot.bot_token.clone(),
        config.channels.chatbot.chat_id.clone(),
    ));
    let messaging = Arc::new(MessagingChannel::new(
        config.channels.messaging.endpoint.clone(),
        config.channels.messaging.api_key.clone(),
    ));
    let email = Arc::new(EmailChannel::new(
        config.channels.email.endpoint.clone(),
        config.channels.email.api_key.clone(),
        config.channels.email.from.clone(),
    ));
    let dispatcher = Arc::new(NotificationDispatcher::new(vec![
        chatbot.clone() as Arc<dyn ChannelAdapter>,
        messaging,
        email,
    ]));

    // Core services
    let lifecycle = Arc::new(OrderLifecycle::new(
        orders.clone(),
        transactions.clone(),
        dispatcher,
        config.business_rules.commission_rate,
    ));
    let predictor = Arc::new(HeuristicPredictor::with_baseline(
        orders.clone(),
        catalog.clone(),
        config.business_rules.prediction_baseline_minutes,
    ));
    let recommender = Arc::new(HeuristicRecommender::new(orders.clone(), catalog.clone()));
    let commands = Arc::new(CommandHandler::new(lifecycle.clone(), chatbot));

    let app_state = AppState {
        orders,
        transactions,
        catalog,
        lifecycle,
        predictor,
        recommender,
        commands,
        redis: Some(redis),
        business_rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
