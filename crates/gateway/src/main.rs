//! SAMIT API Gateway
//!
//! The main entry point for all external requests.
//! Handles:
//! - Access policy evaluation and role-based redirects
//! - Rate limiting
//! - Request routing for the job-board and language-school surfaces
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use samit_common::{
    auth::{ActorState, SessionTokens},
    config::AppConfig,
    db::DbPool,
    metrics,
    storage::{ObjectStore, S3ObjectStore},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub tokens: Arc<SessionTokens>,
    pub store: Arc<dyn ObjectStore>,
}

impl ActorState for AppState {
    fn db(&self) -> &DbPool {
        &self.db
    }

    fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    fn cookie_name(&self) -> &str {
        &self.config.auth.session_cookie
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting SAMIT API Gateway v{}", samit_common::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Metrics exporter on {}", metrics_addr);
    }

    // Session token validation (tokens are minted by the identity provider)
    let session_secret = config
        .auth
        .session_secret
        .clone()
        .ok_or_else(|| anyhow::anyhow!("auth.session_secret is required"))?;
    let tokens = Arc::new(SessionTokens::new(
        &session_secret,
        config.auth.session_ttl_secs,
    ));

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    // Object storage for resumes and legal documents
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.storage).await);

    // Create app state
    let state = AppState {
        config: config.clone(),
        db,
        tokens,
        store,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Public browse
        .route("/jobs", get(handlers::jobs::list_public))
        .route("/jobs/{slug}", get(handlers::jobs::detail))
        .route("/companies", get(handlers::organizations::list_public))
        .route("/companies/{slug}", get(handlers::organizations::public_profile))
        .route("/classes", get(handlers::classes::list_public))
        .route("/classes/{slug}", get(handlers::classes::detail))

        // Application and enrollment entry points
        .route("/apply/{slug}", post(handlers::applications::submit))
        .route("/classes/{slug}/enroll", post(handlers::classes::enroll))

        // Job-seeker dashboard
        .route("/dashboard", get(handlers::dashboard::home))
        .route("/dashboard/menu", get(handlers::dashboard::menu))
        .route(
            "/dashboard/profile",
            get(handlers::dashboard::profile).put(handlers::dashboard::update_profile),
        )
        .route("/dashboard/applications", get(handlers::applications::list_mine))
        .route(
            "/dashboard/resumes",
            get(handlers::resumes::list).post(handlers::resumes::upload),
        )
        .route("/dashboard/resumes/{id}/default", post(handlers::resumes::set_default))
        .route("/dashboard/resumes/{id}", delete(handlers::resumes::remove))
        .route("/dashboard/classes", get(handlers::classes::list_mine))
        .route(
            "/dashboard/enrollments/{id}/status",
            post(handlers::classes::update_status),
        )

        // Organization dashboard
        .route(
            "/dashboard/org",
            get(handlers::organizations::my_organization).put(handlers::organizations::update),
        )
        .route(
            "/dashboard/legal",
            get(handlers::organizations::legal_documents)
                .post(handlers::organizations::upload_legal_document),
        )
        .route(
            "/dashboard/jobs",
            get(handlers::jobs::list_mine).post(handlers::jobs::create),
        )
        .route(
            "/dashboard/jobs/{id}",
            put(handlers::jobs::update).delete(handlers::jobs::remove),
        )
        .route(
            "/dashboard/applicants",
            get(handlers::applications::list_for_organization),
        )
        .route(
            "/dashboard/applicants/{id}/status",
            post(handlers::applications::update_status),
        )

        // Admin dashboard
        .route("/dashboard/admin/overview", get(handlers::admin::overview))
        .route(
            "/dashboard/admin/organizations",
            get(handlers::admin::list_organizations),
        )
        .route(
            "/dashboard/admin/organizations/{id}/decision",
            post(handlers::admin::decide_verification),
        )
        .route("/dashboard/admin/users", get(handlers::admin::list_users))
        .route("/dashboard/admin/classes", post(handlers::admin::create_class))
        .route("/dashboard/admin/classes/{id}", put(handlers::admin::update_class))
        .route("/dashboard/admin/audit", get(handlers::admin::audit_log));

    let mut app = Router::new()
        .merge(routes)
        // Edge access policy; every page re-checks on its own
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::access::access_policy,
        ));

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        app = app.layer(axum_middleware::from_fn(
            move |request: axum::extract::Request, next: axum::middleware::Next| {
                let limiter = limiter.clone();
                async move {
                    middleware::rate_limit::rate_limit_middleware(request, next, limiter).await
                }
            },
        ));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
