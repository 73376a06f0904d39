//! linkboard-proxy: forwards browser requests to the remote store so the
//! service credential never ships to clients.
//!
//! Usage:
//!   linkboard-proxy --upstream-url https://db.example.com --service-key $KEY
//!   LINKBOARD_UPSTREAM_URL=... LINKBOARD_SERVICE_KEY=... linkboard-proxy

use clap::Parser;
use linkboard::cli::ProxyArgs;
use linkboard::proxy::{self, ProxyConfig};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let args = ProxyArgs::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("[proxy] Starting linkboard-proxy on {}", args.listen);
    if args.upstream_url.is_none() || args.service_key.is_none() {
        tracing::warn!(
            "[proxy] Upstream is not configured; requests will get a configuration error"
        );
    }

    let app = proxy::router(ProxyConfig {
        upstream_url: args.upstream_url,
        service_key: args.service_key,
    })
    .layer(TraceLayer::new_for_http());

    let listener = match tokio::net::TcpListener::bind(&args.listen).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("[proxy] Failed to bind {}: {}", args.listen, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("[proxy] Server error: {}", err);
        std::process::exit(1);
    }
}
