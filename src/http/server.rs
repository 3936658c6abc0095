//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, metrics, limits, CORS, panics)
//! - Bind server to listener and shut down gracefully

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::blockchain::{Chain, ChainRegistry};
use crate::catalog::DataCatalog;
use crate::config::AppConfig;
use crate::http::middleware::{auth_middleware, UserDirectory};
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::PanicResponder;
use crate::http::{health, transactions};
use crate::observability::metrics;
use crate::payments::{BalanceAggregator, Credential, PaymentDispatcher, TransactionLedger};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<ChainRegistry>,
    pub dispatcher: PaymentDispatcher,
    pub aggregator: BalanceAggregator,
    pub catalog: Arc<DataCatalog>,
    pub ledger: TransactionLedger,
    /// Demo signing credentials, read once at startup.
    pub credentials: Arc<HashMap<Chain, Credential>>,
    pub started_at: Instant,
}

/// HTTP server for the BioCoin API.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    pub fn new(
        config: AppConfig,
        registry: ChainRegistry,
        ledger: TransactionLedger,
        credentials: HashMap<Chain, Credential>,
    ) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(registry);

        let state = AppState {
            config: config.clone(),
            dispatcher: PaymentDispatcher::new(registry.clone()),
            aggregator: BalanceAggregator::new(registry.clone()),
            registry,
            catalog: Arc::new(DataCatalog::from_config(&config.catalog)),
            ledger,
            credentials: Arc::new(credentials),
            started_at: Instant::now(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let users = Arc::new(UserDirectory::from_config(&config.auth));
        if users.is_empty() {
            tracing::warn!("No API users configured; all /api routes will return 401");
        }
        let api = Router::new()
            .route("/payment", post(transactions::process_payment))
            .route("/balances", get(transactions::get_balances))
            .route("/history", get(transactions::get_history))
            .route_layer(middleware::from_fn_with_state(users, auth_middleware));

        let panic_responder = PanicResponder {
            expose_errors: config.environment.exposes_errors(),
        };

        let router = Router::new()
            .route("/", get(health::root))
            .route("/health", get(health::health))
            .route("/health/detailed", get(health::detailed))
            .nest("/api/transactions", api)
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_responder))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(middleware::from_fn(track_metrics));

        let router = if config.security.permissive_cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        };

        router.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| make_request_span(request)))
                .layer(propagate_request_id_layer()),
        )
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = self.config.environment.as_str(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
