mod config;
mod docker;
mod error;
mod graphql;
mod state;
mod store;

use anyhow::{Context, Result};
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use crate::{
    config::{ApiConfig, LogFormat, LogOutput},
    graphql::{build_schema, ApiSchema},
    state::AppState,
};

// Combined state for axum router
#[derive(Clone)]
struct RouterState {
    app_state: AppState,
    schema: ApiSchema,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Phase 1: thread-local subscriber while the config is loading
    let basic_tracing = init_tracing_basic();

    info!("Starting Deployer API v{}", env!("CARGO_PKG_VERSION"));

    let config = ApiConfig::load()
        .context("Failed to load configuration")?;

    config.validate()
        .context("Configuration validation failed")?;

    // Phase 2: global subscriber from config
    drop(basic_tracing);
    init_tracing_from_config(&config)?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.server.bind_address);

    let state = AppState::initialize(config.clone())
        .context("Failed to initialize application state")?;

    let schema = build_schema(&state)
        .context("Failed to assemble GraphQL schema")?;

    let app = build_router(RouterState {
        app_state: state,
        schema,
    });

    let addr: SocketAddr = config.server.bind_address
        .parse()
        .context("Invalid bind address")?;

    info!("Starting HTTP server...");
    info!("  - GraphQL endpoint: http://{}/graphql", addr);
    if config.graphql.enable_graphiql {
        info!("  - GraphiQL playground: http://{}/graphiql", addr);
    }
    info!("  - Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("✓ Deployer API is ready!");
    info!("Listening on: http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

fn build_router(state: RouterState) -> Router {
    let server = &state.app_state.config.server;

    let cors = if server.enable_cors {
        let origins = server.cors_origins
            .iter()
            .filter_map(|s| s.parse::<axum::http::HeaderValue>().ok())
            .collect::<Vec<_>>();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
    } else {
        // Same-origin only
        CorsLayer::new()
    };

    let request_timeout = Duration::from_secs(server.request_timeout_secs);

    Router::new()
        .route("/health", get(health_handler))
        .route("/graphql", post(graphql_handler).get(graphql_playground))
        .route("/graphiql", get(graphql_playground))
        .route("/", get(root_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
                // 2MB request bodies
                .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
                .layer(cors)
        )
        .with_state(state)
}

async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "Deployer API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "graphql": "/graphql",
            "graphiql": "/graphiql",
            "health": "/health"
        }
    }))
}

/// Health check. The API serves without the daemon, so an unreachable
/// daemon only degrades the report.
async fn health_handler(
    State(state): State<RouterState>,
) -> impl IntoResponse {
    let docker = match state.app_state.docker.list_containers().await {
        Ok(containers) => json!({"reachable": true, "containers": containers.len()}),
        Err(e) => {
            warn!("Health check could not reach Docker: {}", e);
            json!({"reachable": false})
        }
    };
    let degraded = docker["reachable"] == false;

    (
        StatusCode::OK,
        Json(json!({
            "status": if degraded { "degraded" } else { "healthy" },
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "docker": docker
        })),
    )
}

async fn graphql_handler(
    State(state): State<RouterState>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

async fn graphql_playground(
    State(state): State<RouterState>,
) -> impl IntoResponse {
    if !state.app_state.config.graphql.enable_graphiql {
        return (StatusCode::NOT_FOUND, Html("GraphiQL is disabled".to_string()));
    }

    (
        StatusCode::OK,
        Html(GraphiQLSource::build().endpoint("/graphql").title("Deployer API").finish()),
    )
}

/// Phase 1: basic tracing from RUST_LOG or a default filter.
fn init_tracing_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,api=debug"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Phase 2: global subscriber honoring the logging section.
fn init_tracing_from_config(config: &ApiConfig) -> Result<()> {
    use std::sync::Arc;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let open = |path: &str| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file '{}'", path))
    };

    match (&config.logging.format, &config.logging.output) {
        (LogFormat::Json, LogOutput::Stdout) => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Json, LogOutput::File { path }) => {
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(Arc::new(open(path)?));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::Stdout) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        (LogFormat::Pretty, LogOutput::File { path }) => {
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(false)
                .with_writer(Arc::new(open(path)?));
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::fake::FakeDocker;
    use crate::store::Repositories;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router(docker: Arc<FakeDocker>, enable_graphiql: bool) -> Router {
        let mut config = ApiConfig::default();
        config.graphql.enable_graphiql = enable_graphiql;
        let app_state = AppState::new(config, Repositories::in_memory(), docker);
        let schema = build_schema(&app_state).unwrap();
        build_router(RouterState { app_state, schema })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_docker() {
        let docker = Arc::new(FakeDocker::new());
        docker.add_container("c1", "shop-web-1", "running");

        let response = router(docker.clone(), false)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["docker"]["containers"], 1);

        docker.set_unreachable(true);
        let response = router(docker, false)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["status"], "degraded");
    }

    #[tokio::test]
    async fn test_graphql_post() {
        let request = Request::post("/graphql")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"query":"{ projects { id } }"}"#))
            .unwrap();

        let response = router(Arc::new(FakeDocker::new()), false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"data": {"projects": []}}));
    }

    #[tokio::test]
    async fn test_graphiql_toggle() {
        let request = || Request::get("/graphiql").body(Body::empty()).unwrap();

        let disabled = router(Arc::new(FakeDocker::new()), false).oneshot(request()).await.unwrap();
        assert_eq!(disabled.status(), StatusCode::NOT_FOUND);

        let enabled = router(Arc::new(FakeDocker::new()), true).oneshot(request()).await.unwrap();
        assert_eq!(enabled.status(), StatusCode::OK);
    }
}
