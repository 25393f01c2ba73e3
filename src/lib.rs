pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::UploaderConfig;
use crate::infrastructure::storage::StorageHandle;
use crate::services::memory::MemoryObjectStore;
use crate::services::notifier::{Celebration, CelebrationHook, LogHook};
use crate::services::upload_widget::UploadWidget;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Headroom over `max_file_size` for multipart framing.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::session::get_session,
        api::handlers::session::select_file,
        api::handlers::session::upload,
        api::handlers::session::preview,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::session::UploadResponse,
            api::handlers::session::OutcomeKind,
            models::SessionSnapshot,
            models::UploadStatus,
        )
    ),
    tags(
        (name = "session", description = "Upload session endpoints"),
        (name = "system", description = "System endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub widget: Arc<UploadWidget>,
    pub celebration: Option<Arc<CelebrationHook>>,
    pub objects: Option<Arc<MemoryObjectStore>>,
    pub config: UploaderConfig,
}

impl AppState {
    /// Wires the widget to the configured store and hooks.
    pub fn new(storage: StorageHandle, config: UploaderConfig) -> Self {
        let mut widget = UploadWidget::new(storage.store)
            .with_key_strategy(config.key_strategy)
            .with_hook(Arc::new(LogHook));

        let celebration = config
            .celebrate
            .then(|| Arc::new(CelebrationHook::new(Celebration::default())));
        if let Some(hook) = &celebration {
            widget = widget.with_hook(hook.clone());
        }

        Self {
            widget: Arc::new(widget),
            celebration,
            objects: storage.memory,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::page::index))
        .route("/select", post(api::handlers::page::select_form))
        .route("/upload", post(api::handlers::page::upload_form))
        .route("/objects/:bucket/*key", get(api::handlers::page::serve_object))
        .route("/health", get(api::handlers::health::health_check))
        .route("/session", get(api::handlers::session::get_session))
        .route("/session/file", post(api::handlers::session::select_file))
        .route("/session/upload", post(api::handlers::session::upload))
        .route(
            crate::utils::preview::LOCAL_PREVIEW_PATH,
            get(api::handlers::session::preview),
        )
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(DefaultBodyLimit::max(
            state.config.max_file_size + MULTIPART_OVERHEAD,
        ))
        .with_state(state)
}
