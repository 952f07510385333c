//! bolt-daemon entry point.
//!
//! Loads config, resolves secrets, builds one controller per lock, wires
//! middleware and serves. Handlers live in `routes.rs`; shared state in
//! `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use bolt_config::{
    load_layered_yaml, report_unused_keys, secrets::resolve_secrets, BridgeConfig,
    UnusedKeyPolicy,
};
use bolt_daemon::{routes, state};
use bolt_transport::HttpLockTransport;
use clap::Parser;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[derive(Debug, Parser)]
#[command(name = "bolt-daemon", about = "Poll-reconciled door lock bridge")]
struct Args {
    /// YAML config layers, merged in order (later wins).
    #[arg(long = "config", required = true)]
    config: Vec<String>,

    /// Fail startup on config keys nothing consumes.
    #[arg(long)]
    strict_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();
    let args = Args::parse();

    let paths: Vec<&str> = args.config.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&paths).context("load config layers")?;

    let policy = if args.strict_config {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, policy)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(pointer = %pointer, "unused config key");
    }

    let cfg = BridgeConfig::from_loaded(&loaded)?;
    let secrets = resolve_secrets(&cfg)?;
    info!(
        config_hash = %loaded.config_hash,
        locks = cfg.locks.len(),
        authenticated = secrets.transport_token.is_some(),
        "config loaded"
    );

    let transport = HttpLockTransport::new(
        &cfg.transport.base_url,
        secrets.transport_token.clone(),
        Duration::from_millis(cfg.transport.request_timeout_ms),
    )
    .context("TRANSPORT_INIT: http transport")?;

    let shared = Arc::new(state::AppState::spawn_from_config(&cfg, Arc::new(transport))?);
    for lock in &cfg.locks {
        info!(
            device_id = %lock.device_id,
            name = %lock.display_name(),
            poll_interval_ms = lock.poll_interval_ms,
            auto_lock_minutes = lock.auto_lock_minutes,
            "lock controller started"
        );
    }

    state::spawn_heartbeat(
        shared.bus.clone(),
        Duration::from_secs(cfg.daemon.heartbeat_secs),
    );

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr: SocketAddr = cfg
        .daemon
        .bind_addr
        .parse()
        .with_context(|| format!("CONFIG_INVALID: /daemon/bind_addr '{}'", cfg.daemon.bind_addr))?;
    info!("bolt-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler unavailable; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
