//! notelink-agenda - HTTP API server and link consumer for the agenda service

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notelink_agenda::{app, AppState};
use notelink_bus::{AmqpBus, ConsumerConfig, LinkConsumer, MessageBus};
use notelink_core::EventStore;
use notelink_db::EventDatabase;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   RUST_LOG    - standard env filter (default: "notelink_agenda=debug,notelink_bus=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "notelink_agenda=debug,notelink_bus=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!(log_format = %log_format, "Logging initialized");

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/notelink_agenda".to_string());
    let amqp_url =
        std::env::var("AMQP_URL").unwrap_or_else(|_| "amqp://localhost:5672".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse()
        .unwrap_or(3001);

    // Connect to database
    info!("Connecting to database...");
    let db = EventDatabase::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let events: Arc<dyn EventStore> = Arc::new(db.events.clone());

    // Connect to the message broker and start the link consumer. Queue
    // provisioning happens inside subscribe(); a failure here is fatal so a
    // misconfigured broker never runs the HTTP surface without the consumer.
    info!("Connecting to message broker...");
    let bus: Arc<dyn MessageBus> = Arc::new(AmqpBus::connect(&amqp_url).await?);
    let consumer = LinkConsumer::with_config(events.clone(), bus, ConsumerConfig::from_env());
    let subscription = consumer.subscribe().await?;
    let _consumer_handle = consumer.start(subscription);
    info!("Link consumer started");

    let state = AppState { events };
    let app = app(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Agenda service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
