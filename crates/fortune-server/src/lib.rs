pub mod error;
mod handler;

use std::any::Any;
use std::sync::Arc;

use axum::http::{header, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};

use fortune_core::{Catalog, FortuneConfig};
use fortune_suggest::{Generator, LlmGenerator};

pub use error::ApiError;
pub use handler::{FortuneResponse, PaidSection};

pub const FORTUNE_PATH: &str = "/api/fortune";

/// Shared, read-only state for every request.
pub struct AppState {
    pub config: FortuneConfig,
    pub catalog: Catalog,
    pub generator: Arc<dyn Generator>,
    pub generation_configured: bool,
}

impl AppState {
    pub fn new(config: FortuneConfig, generator: Arc<dyn Generator>) -> Self {
        let generation_configured = config.llm.is_configured();
        Self {
            config,
            catalog: Catalog::default(),
            generator,
            generation_configured,
        }
    }

    /// State backed by the configured hosted model.
    pub fn from_config(config: FortuneConfig) -> Self {
        let generator = Arc::new(LlmGenerator::new(config.llm.clone()));
        Self::new(config, generator)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(
            FORTUNE_PATH,
            get(handler::alive)
                .post(handler::fortune)
                .options(handler::preflight)
                .fallback(handler::method_not_allowed),
        )
        .route("/healthz", get(handler::healthz))
        // CORS outermost so panic responses carry the CORS headers too.
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .with_state(state)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(%detail, "request handler panicked");
    let message = if cfg!(debug_assertions) {
        detail
    } else {
        "unexpected failure".to_string()
    };
    ApiError::Internal(message).into_response()
}
