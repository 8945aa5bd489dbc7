//! mentiscope-api library - student growth & readiness service
//!
//! Assessment intake, LLM analysis fan-out, dashboard retrieval, payment
//! webhook intake and support forwarding over a single SQLite database.

use axum::http::{HeaderValue, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use config::Settings;
pub use error::{ApiError, ApiResult};

use services::{AnalysisProvider, OpenRouterClient, SupportClient};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub settings: Arc<Settings>,
    /// `None` when no LLM API key is configured
    pub analysis: Option<Arc<dyn AnalysisProvider>>,
    pub support: SupportClient,
    /// Service startup timestamp (for uptime calculation)
    pub startup_time: DateTime<Utc>,
    /// Last analysis failure, reported by `/health`
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// Create application state, building outbound clients from settings
    pub fn new(db: SqlitePool, settings: Settings) -> mentiscope_common::Result<Self> {
        let analysis: Option<Arc<dyn AnalysisProvider>> = match &settings.llm.api_key {
            Some(key) => {
                let client: Arc<dyn AnalysisProvider> = Arc::new(
                    OpenRouterClient::new(&settings.llm, key.clone())
                        .map_err(|e| mentiscope_common::Error::Config(e.to_string()))?,
                );
                Some(client)
            }
            None => None,
        };

        let support = SupportClient::new(&settings.support)
            .map_err(|e| mentiscope_common::Error::Config(e.to_string()))?;

        Ok(Self {
            db,
            settings: Arc::new(settings),
            analysis,
            support,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        })
    }

    /// Replace the analysis provider
    pub fn with_analysis_provider(mut self, provider: Arc<dyn AnalysisProvider>) -> Self {
        self.analysis = Some(provider);
        self
    }

    pub fn analysis_provider(&self) -> Option<&dyn AnalysisProvider> {
        self.analysis.as_deref()
    }

    pub async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }

    /// Forget the recorded failure once analysis succeeds again
    pub async fn clear_error(&self) {
        *self.last_error.write().await = None;
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .merge(api::assessment_routes())
        .merge(api::student_routes())
        .merge(api::action_plan_routes())
        .merge(api::payment_routes())
        .merge(api::support_routes())
        .merge(api::reference_routes());

    let router = Router::new()
        .nest("/api/v1", v1)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http());

    let router = match cors_layer(&state.settings.frontend_url) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

/// CORS restricted to the frontend origin, with credentials
fn cors_layer(frontend_url: &str) -> Option<CorsLayer> {
    let origin = match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => origin,
        Err(e) => {
            warn!("Invalid frontend URL for CORS ({}), cross-origin requests disabled", e);
            return None;
        }
    };

    info!("CORS allowed origin: {}", frontend_url);

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([origin]))
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(AllowHeaders::mirror_request()),
    )
}
