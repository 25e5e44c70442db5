mod cli;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use clap::Parser;
use stager_api::{HttpApi, StagerApiAdapter};
use stager_client::CcClient;
use stager_core::{CompletionService, CompletionWatcher, Dispatcher, MemoryCoordinator, Stager};
use stager_prometheus::{Encoder, PrometheusMetrics, TextEncoder};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1) Logger
    stager_observe::logger_init(&args.logger_config()?)?;

    // 2) Config
    let config = args.stager_config();
    config.validate().context("invalid stager configuration")?;
    let cc_config = args.cc_config();
    cc_config.validate().context("invalid cloud controller configuration")?;
    if config.compilers.is_empty() {
        warn!("no compilers configured, every staging request will be rejected");
    }

    // 3) Collaborators
    let coordinator = Arc::new(MemoryCoordinator::new());
    for server in &args.artifact_servers {
        coordinator.register_artifact_server(server.as_str());
    }
    let client = Arc::new(CcClient::new(&cc_config)?);
    let metrics = Arc::new(PrometheusMetrics::new()?);
    let backends = Arc::new(config.backend_router()?);

    // 4) Services
    let stager = Stager::new(coordinator.clone(), config.task_builder());
    let completion =
        CompletionService::new(client.clone(), backends.clone()).with_metrics(metrics.clone());
    let dispatcher =
        Dispatcher::new(coordinator.clone(), client, backends).with_metrics(metrics.clone());

    // 5) Completion watcher
    let shutdown = CancellationToken::new();
    let watcher = CompletionWatcher::new(coordinator, dispatcher, config.watcher_config());
    let watcher = tokio::spawn(watcher.run(shutdown.clone()));

    // 6) HTTP
    let app = HttpApi::new(Arc::new(StagerApiAdapter::new(stager, completion)))
        .router()
        .merge(metrics_router(metrics));
    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("bind {}", args.listen))?;
    info!(listen = %args.listen, domains = ?[&config.buildpack_domain, &config.docker_domain], "stager started");

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutdown requested");
            shutdown.cancel();
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await
        .context("http server")?;

    // 7) Drain in-flight completions
    shutdown.cancel();
    watcher.await.context("completion watcher panicked")??;
    info!("stager stopped");
    Ok(())
}

fn metrics_router(metrics: Arc<PrometheusMetrics>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(metrics)
}

async fn render_metrics(State(metrics): State<Arc<PrometheusMetrics>>) -> impl IntoResponse {
    match metrics.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
