use library_lending::{
    adapters::postgres::{
        PostgresBookCatalog, PostgresChargeRepository, PostgresCustomerDirectory,
        PostgresStockLedger, PostgresTransactionStore, PostgresUnitOfWork,
    },
    api::{handlers::AppState, router::create_router},
    application::lending::ServiceDependencies,
    config::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_lending=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    tracing::info!(
        port = config.port,
        daily_late_fee = %config.daily_late_fee,
        operation_timeout_secs = config.operation_timeout.as_secs(),
        "Configuration loaded"
    );

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Initialize adapters
    let service_deps = ServiceDependencies {
        book_catalog: Arc::new(PostgresBookCatalog::new(pool.clone())),
        customer_directory: Arc::new(PostgresCustomerDirectory::new(pool.clone())),
        stock_ledger: Arc::new(PostgresStockLedger::new(pool.clone())),
        transaction_store: Arc::new(PostgresTransactionStore::new(pool.clone())),
        charge_repository: Arc::new(PostgresChargeRepository::new(pool.clone())),
        unit_of_work: Arc::new(PostgresUnitOfWork::new(pool)),
        policy: config.lending_policy(),
    };

    // Create application state
    let app_state = Arc::new(AppState { service_deps });

    // Create router
    let app = create_router(app_state);

    // Server configuration
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
