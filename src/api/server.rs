// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{routing::get, Router};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::handlers::{health_handler, metrics_handler, SharedState};
use crate::api::metrics::MetricRegistry;
use crate::app_state::AppState;
use crate::cli::{CollectArgs, ServeArgs};
use crate::collector::Collector;
use crate::common::config::ExporterConfig;
use crate::error::Result;
use crate::nova::{NovaApi, NovaClient};

/// Install the global subscriber. Logs go to stderr so `once` can print
/// the exposition on stdout.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nova_exporter=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build the registry for `config`, warning about disabled names that
/// match no metric.
pub fn build_registry(config: &ExporterConfig) -> MetricRegistry {
    let registry = MetricRegistry::new(&config.prefix, &config.disabled_metrics);
    for name in registry.unknown_names(&config.disabled_metrics) {
        tracing::warn!("Ignoring unknown disabled metric: {name}");
    }
    registry
}

fn build_collector(args: &CollectArgs, config: &ExporterConfig) -> Result<Collector> {
    config.validate()?;
    let api: Arc<dyn NovaApi> = Arc::new(NovaClient::new(args.credentials())?);
    Ok(Collector::new(api, Arc::new(build_registry(config)), config))
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Run one poll and publish its result.
pub async fn poll_once(collector: &Collector, state: &SharedState) {
    let snapshot = collector.collect().await;
    let rendered = snapshot.render(collector.registry());

    let mut state = state.write().await;
    state.update(&snapshot, rendered, Utc::now());
    if !snapshot.up {
        tracing::warn!(
            "Poll incomplete ({} consecutive), failed sections: {}",
            state.status.consecutive_failures,
            snapshot.failures.join(", ")
        );
    }
}

/// Poll in the background every `interval`. A poll that overruns the
/// interval delays the next one instead of overlapping it.
pub fn spawn_poll_loop(
    collector: Arc<Collector>,
    state: SharedState,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            poll_once(&collector, &state).await;
        }
    })
}

/// Serve `/metrics` and `/health` until interrupted.
pub async fn run_serve_mode(args: &ServeArgs) -> Result<()> {
    let config = args.collect.exporter_config(args.interval);
    let collector = Arc::new(build_collector(&args.collect, &config)?);
    tracing::info!(
        "Starting exporter: {} metric families enabled, polling every {}s",
        collector.registry().len(),
        config.poll_interval_secs
    );

    let state = SharedState::new(RwLock::new(AppState::new()));
    let poller = spawn_poll_loop(
        collector,
        state.clone(),
        Duration::from_secs(config.poll_interval_secs),
    );

    let app = build_router(state);
    let listener = TcpListener::bind(&format!("0.0.0.0:{}", args.port)).await?;
    tracing::info!("Metrics server listening on {}", listener.local_addr()?);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    poller.abort();
    served?;
    tracing::info!("Exporter stopped");
    Ok(())
}

/// Collect once and return the exposition text.
pub async fn run_once_mode(args: &CollectArgs) -> Result<String> {
    let config = args.exporter_config(0);
    let collector = build_collector(args, &config)?;
    let snapshot = collector.collect().await;
    Ok(snapshot.render(collector.registry()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
