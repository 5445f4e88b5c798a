/*
 * Responsibility
 * - Config読み込み → 依存生成 (introspection client / upstream client) → Router 組み立て
 * - Middleware の適用 (token enforcement, request-id / trace など)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::handlers::proxy;
use crate::config::Config;
use crate::middleware::{self, auth::EnforcementConfig, http::HttpLimits};
use crate::services::{introspection::HttpIntrospector, proxy::UpstreamProxy};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,introspection_pep=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("configuration error")?;

    init_panic_hook(!config.app_env.is_production());

    let state = build_state(&config)?;
    let app = build_router(state, config.http_limits());

    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("failed to listen on {}", config.listen_address))?;

    tracing::info!(
        "listening on {}, proxying to {} ({:?} mode)",
        config.listen_address,
        config.upstream_url,
        config.app_env
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn build_state(config: &Config) -> Result<AppState> {
    // Separate clients so introspection and upstream timeouts stay independent.
    let introspector = HttpIntrospector::with_timeout(
        config.introspection_endpoint.clone(),
        config.introspection_timeout,
    )
    .context("failed to build introspection client")?;

    let proxy = UpstreamProxy::with_timeout(
        config.upstream_url.clone(),
        config.upstream_timeout,
        config.max_body_bytes,
    )
    .context("failed to build upstream client")?;

    let enforcement = EnforcementConfig::new(Arc::new(introspector), config.base_url.clone());

    Ok(AppState::new(Arc::new(enforcement), Arc::new(proxy)))
}

/// Every path is proxied, and every path is behind token enforcement.
pub fn build_router(state: AppState, limits: HttpLimits) -> Router {
    let router = Router::new().fallback(proxy::forward);
    let router = middleware::auth::enforce::apply(router, state.enforcement.clone());

    middleware::http::apply(router.with_state(state), limits)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
