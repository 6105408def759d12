//! notelink-notes - HTTP API server for the note service

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notelink_bus::{AmqpBus, LinkPublisher, MessageBus, PublisherConfig};
use notelink_core::LINK_QUEUE;
use notelink_db::NoteDatabase;
use notelink_notes::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   RUST_LOG    - standard env filter (default: "notelink_notes=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "notelink_notes=debug,tower_http=debug".into());

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
        .unwrap_or_else(|_| "postgres://localhost/notelink_notes".to_string());
    let amqp_url =
        std::env::var("AMQP_URL").unwrap_or_else(|_| "amqp://localhost:5672".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    // Connect to database
    info!("Connecting to database...");
    let db = NoteDatabase::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Connect to the message broker and make sure the link queue exists
    // before the first publish.
    info!("Connecting to message broker...");
    let bus: Arc<dyn MessageBus> = Arc::new(AmqpBus::connect(&amqp_url).await?);
    bus.declare(LINK_QUEUE).await?;
    info!(queue = LINK_QUEUE, "Message broker connected");

    let publisher = LinkPublisher::with_config(bus, PublisherConfig::from_env());

    let state = AppState {
        notes: Arc::new(db.notes.clone()),
        publisher,
    };
    let app = app(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Note service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
