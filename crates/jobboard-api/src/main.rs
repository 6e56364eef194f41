//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jobboard_api::{create_router, metrics, ApiConfig, AppState, Stores};
use jobboard_models::{BlogPost, Company, CredentialKind, Job, Principal, Role};
use jobboard_store::{MemoryStore, SessionStore};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    if let Err(e) = run().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

async fn run() -> anyhow::Result<()> {
    info!("Starting jobboard-api");

    // Load configuration
    let config = ApiConfig::from_env();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "API config: host={}, port={}, environment={}",
        config.host, config.port, config.environment
    );

    let store = Arc::new(MemoryStore::new());
    if !config.is_production() {
        seed_demo_data(&store, &config).await?;
    }

    let state = AppState::new(config.clone(), Stores::memory(store));

    // Initialize metrics
    let metrics_enabled = std::env::var("METRICS_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    let metrics_handle = if metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("Failed to install metrics recorder")?)
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// Populate the in-memory store with a small data set for local development.
async fn seed_demo_data(store: &Arc<MemoryStore>, config: &ApiConfig) -> anyhow::Result<()> {
    let admin = Principal::new("Admin", "admin@jobboard.local", Role::Admin);
    let employer = Principal::new("Erin Employer", "erin@acme.local", Role::Employer);
    let candidate = Principal::new("Casey Candidate", "casey@jobboard.local", Role::Candidate);

    let company = Company::new("acme", "Acme Corp", employer.id.clone());
    let job = Job::new("senior-rust-engineer", "Senior Rust Engineer", company.id.clone());
    let mut post = BlogPost::new("hiring-in-2026", "Hiring in 2026", admin.id.clone());
    post.published = true;

    store.insert_company(company).await;
    store.insert_job(job).await;
    store.insert_blog_post(post).await;

    let keys = jobboard_api::SessionKeys::new(&config.session_secret);
    let ttl = chrono::Duration::from_std(config.session_ttl).context("Session TTL out of range")?;
    for user in [admin, employer, candidate] {
        let session = store.create(&user.id, CredentialKind::Api, ttl).await?;
        let token = keys.issue(&session)?;
        debug!(role = %user.role, user_id = %user.id, token = %token, "Seeded development user");
        store.insert_principal(user).await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
