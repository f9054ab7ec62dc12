use std::sync::Arc;

use support_desk::config::AppConfig;
use support_desk::storage::{DisabledStore, ImageStore, StorageClient};
use support_desk::{app, db, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let config = AppConfig::from_env().expect("Invalid configuration");

    let db_pool = db::create_pool(&config)
        .await
        .expect("Failed to create database pool.");

    let image_store: Arc<dyn ImageStore> = match &config.storage {
        Some(storage) => {
            tracing::info!("Object storage enabled (bucket '{}')", storage.bucket);
            Arc::new(StorageClient::new(storage))
        }
        None => {
            tracing::warn!("STORAGE_URL/STORAGE_KEY not found. Image uploads will be refused.");
            Arc::new(DisabledStore)
        }
    };

    let shared_state = Arc::new(AppState {
        db_pool,
        image_store,
        storage_configured: config.storage.is_some(),
        upload_policy: config.upload_policy,
    });

    tracing::info!(
        "Upload policy: max {} images, overflow {:?}, body limit {} bytes",
        config.upload_policy.max_images,
        config.upload_policy.overflow,
        config.max_upload_bytes
    );

    let router = app(shared_state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind address");
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, router)
        .await
        .expect("Server failed");
}

const DEFAULT_LOG_FILTER: &str = "info,support_desk=debug,sqlx=warn,tower_http=info";

/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to
/// one JSON object per line.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let fmt_layer = if json {
        fmt::layer().json().with_current_span(true).with_span_list(false).boxed()
    } else {
        fmt::layer().with_target(true).compact().boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), json, "support desk starting");
    Ok(())
}
