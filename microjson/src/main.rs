use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use microjson::{
    config::Config,
    db::connection::create_pool,
    handlers::{self, notes::NOTES_PUBLISHER},
    middleware,
    services::{LogPublisher, PublisherRegistry},
    state::AppState,
    TxWrapper,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "microjson=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        version = %config.version,
        hostname = %config.hostname,
        database_max_connections = config.database_max_connections,
        "Loaded configuration from environment/.env"
    );

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    sqlx::migrate!("./migrations").run(&*pool).await?;

    let publishers =
        PublisherRegistry::new().register(NOTES_PUBLISHER, LogPublisher::new(NOTES_PUBLISHER));
    let notes = TxWrapper::new(pool.clone(), publishers);

    let state = AppState::new(pool, config.clone());

    let app = Router::new()
        .route("/up", get(handlers::up::up))
        .route("/api/notes", post(notes.handler(handlers::notes::create_note)))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(axum_middleware::from_fn(middleware::log_requests))
                .layer(axum_middleware::from_fn_with_state(
                    state.service.clone(),
                    middleware::version_header,
                )),
        )
        .with_state(state);

    tracing::info!("Server listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
