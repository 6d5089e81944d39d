//! oj-daemon entry point.
//!
//! Intentionally thin: wires config, stores, the sandbox client, the worker
//! pool and its reclaimer, the heartbeat writer, and the operator HTTP
//! surface, then runs until SIGINT/SIGTERM. All route handlers live in
//! `routes.rs`; shared state lives in `state.rs`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use oj_config::Config;
use oj_daemon::{routes, state};
use oj_db::{ProblemStore, SubmissionStore};
use oj_metrics::HeartbeatWriter;
use oj_pool::{PoolConfig, WorkerPool};
use oj_queue::{QueueBroker, QueueRunner, IN_FLIGHT_KEY, PENDING_KEY};
use oj_sandbox::SandboxClient;
use oj_storage::SubmissionStorage;
use oj_worker::Processor;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    oj_config::bootstrap_dotenv();
    init_tracing();

    let config = Arc::new(Config::from_env().context("loading configuration")?);

    let pg_pool = oj_db::connect(&config.database_url).await?;
    oj_db::migrate(&pg_pool).await?;

    let submissions = SubmissionStore::new(pg_pool.clone());
    let problems = ProblemStore::new(pg_pool);
    let storage = SubmissionStorage::new(config.submission_dir.clone());
    let sandbox = SandboxClient::new(config.gojudge_url.clone())?;
    let broker = QueueBroker::connect(&config.redis_url)?;

    let submissions_repo: Arc<dyn oj_db::SubmissionRepo> = Arc::new(submissions.clone());
    let problems_repo: Arc<dyn oj_db::ProblemRepo> = Arc::new(problems);
    let sandbox_runner: Arc<dyn oj_sandbox::SandboxRunner> = Arc::new(sandbox);

    let processor = Processor::new(
        Arc::clone(&submissions_repo),
        problems_repo,
        storage,
        sandbox_runner,
        config.compile_time_limit_ms,
    );

    let worker_id = format!("{}:{}:{}", hostname(), std::process::id(), Uuid::new_v4());
    let heartbeat = Arc::new(HeartbeatWriter::new(
        &config.redis_url,
        worker_id,
        config.worker_concurrency,
    )?);

    let pool_config = PoolConfig {
        concurrency: config.worker_concurrency,
        pending_key: PENDING_KEY.to_string(),
        in_flight_key: IN_FLIGHT_KEY.to_string(),
        visibility_timeout: config.visibility_timeout,
        reclaimer_interval: config.reclaimer_interval,
        max_retries: config.max_retries,
    };

    let broker_runner: Arc<dyn QueueRunner> = Arc::new(broker.clone());
    let worker_pool = Arc::new(WorkerPool::new(
        processor,
        broker_runner,
        submissions_repo,
        Arc::clone(&heartbeat),
        pool_config,
    ));

    let cancel = CancellationToken::new();

    let mut task_handles = worker_pool.spawn(cancel.clone());
    task_handles.push(tokio::spawn({
        let heartbeat = Arc::clone(&heartbeat);
        let cancel = cancel.clone();
        let interval = config.heartbeat_interval;
        let ttl = config.heartbeat_ttl;
        async move {
            heartbeat.run(interval, ttl, cancel).await;
        }
    }));

    let app_state = Arc::new(state::AppState::new(
        Arc::clone(&config),
        broker,
        submissions,
    ));

    let app = routes::build_router(app_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr: SocketAddr = config
        .daemon_addr
        .parse()
        .context("invalid OJ_DAEMON_ADDR")?;
    info!("oj-daemon listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown_cancel = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown signal received, cancelling workers");
            shutdown_cancel.cancel();
        })
        .await
        .context("server crashed")?;

    for handle in task_handles {
        let _ = handle.await;
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown-host".to_string())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// CORS: allow only localhost origins (operator UIs run locally).
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
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
