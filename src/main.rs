use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use tokio::net::TcpListener;
use uuid_ninja::config::{config_path_from_env, load_config, AppConfig};
use uuid_ninja::observability::init_tracing;
use uuid_ninja::routing::dispatch_request;
use uuid_ninja::state::AppState;

fn main() {
    let config_path = config_path_from_env();
    let config = load_config(&config_path).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration from '{config_path}': {e}");
        eprintln!("Please copy 'config.example.yaml' to 'config.yaml' and modify as needed.");
        std::process::exit(1);
    });

    init_tracing(&config.features.log_level);
    let runtime = build_runtime(&config);

    let code = runtime.block_on(run(config));
    std::process::exit(code);
}

fn build_runtime(config: &AppConfig) -> tokio::runtime::Runtime {
    let server = &config.server;
    let mut runtime_builder = if server.runtime_worker_threads == Some(1) {
        tokio::runtime::Builder::new_current_thread()
    } else {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        if let Some(threads) = server.runtime_worker_threads {
            builder.worker_threads(threads);
        }
        if let Some(stack_kb) = server.runtime_thread_stack_size_kb {
            builder.thread_stack_size(stack_kb * 1024);
        }
        builder
    };
    runtime_builder.enable_io();
    runtime_builder.enable_time();
    if let Some(max_blocking_threads) = server.runtime_max_blocking_threads {
        runtime_builder.max_blocking_threads(max_blocking_threads);
    }
    runtime_builder.build().unwrap_or_else(|e| {
        eprintln!("Failed to initialize Tokio runtime: {e}");
        std::process::exit(1);
    })
}

/// Serve until interrupted. Returns the process exit code.
async fn run(config: AppConfig) -> i32 {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config));

    // Every v7 depends on the counter, so an unreadable store stops startup.
    let sequence = state.sequence();
    match sequence.load().await {
        Ok(current) => tracing::info!(
            sequence = sequence.name(),
            store = %state.config.sequence.store,
            current,
            "sequence ready"
        ),
        Err(err) => {
            tracing::error!(sequence = sequence.name(), "refusing to start: {err}");
            return 1;
        }
    }

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind {addr}: {err}");
            return 1;
        }
    };
    tracing::info!(
        "uuid-ninja listening on {addr} with base_path='{}'",
        state.base_path()
    );

    serve(listener, state).await;
    tracing::info!("uuid-ninja stopped");
    0
}

async fn serve(listener: TcpListener, state: Arc<AppState>) {
    let conn_builder = AutoBuilder::new(TokioExecutor::new());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let (stream, remote_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!("accept error: {err}");
                    continue;
                }
            },
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received, no longer accepting connections");
                return;
            }
        };

        if let Err(err) = stream.set_nodelay(true) {
            tracing::debug!("failed to enable TCP_NODELAY for {remote_addr}: {err}");
        }

        let io = TokioIo::new(stream);
        let conn_builder = conn_builder.clone();
        let request_state = Arc::clone(&state);
        let hyper_service = service_fn(move |request: Request<Incoming>| {
            dispatch_request(Arc::clone(&request_state), request.map(Body::new))
        });

        tokio::spawn(async move {
            if let Err(err) = conn_builder.serve_connection(io, hyper_service).await {
                tracing::debug!("failed to serve connection from {remote_addr}: {err:#}");
            }
        });
    }
}
