use axum::{extract::Request, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::favorites::FavoriteSetReconciler;
use crate::tmdb::CatalogApi;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<dyn CatalogApi>,
    pub favorites: Arc<FavoriteSetReconciler>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CatalogApi>,
        favorites: Arc<FavoriteSetReconciler>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
            favorites,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(crate::api::api_routes())
        .fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        // The UI bundle answers every path the API does not.
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request<axum::body::Body>) -> impl IntoResponse {
    // CORS preflight for unknown paths
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
