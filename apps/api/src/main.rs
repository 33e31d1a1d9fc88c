mod applications;
mod attachments;
mod backend;
mod config;
mod content_store;
mod errors;
mod graphql;
mod models;
mod profiles;
mod routes;
mod saved_jobs;
mod state;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::attachments::reference::ContentUrls;
use crate::backend::GraphqlBackend;
use crate::config::{Config, ContentStoreConfig, S3Config};
use crate::content_store::{ContentStore, HttpContentStore, S3ContentStore};
use crate::graphql::GraphqlClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job board API v{}", env!("CARGO_PKG_VERSION"));

    // One HTTP client for GraphQL and content uploads; its timeout bounds every call.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let urls = ContentUrls::new(&config.content_base_url).context("CONTENT_BASE_URL")?;

    let store: Arc<dyn ContentStore> = match &config.content_store {
        ContentStoreConfig::Http => {
            info!("Content store: HTTP upload at {}", config.content_base_url);
            Arc::new(HttpContentStore::new(http.clone(), urls))
        }
        ContentStoreConfig::S3(s3) => {
            let client = build_s3_client(s3).await;
            info!("Content store: S3 bucket {}", s3.bucket);
            Arc::new(S3ContentStore::new(client, s3.bucket.clone(), urls))
        }
    };

    let backend = Arc::new(GraphqlBackend::new(GraphqlClient::new(
        http,
        config.graphql_url.clone(),
    )));
    info!("GraphQL backend at {}", config.graphql_url);

    let state = AppState::new(backend, store, config.max_upload_bytes);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &S3Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "jobboard-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
