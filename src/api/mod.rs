pub mod error;
pub mod handlers;
pub mod session;
pub mod types;

pub use error::ApiError;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/movies/popular", get(handlers::popular))
        .route("/api/movies/top_rated", get(handlers::top_rated))
        .route("/api/movies/now_playing", get(handlers::now_playing))
        .route("/api/movies/trending/:window", get(handlers::trending))
        .route("/api/movies/discover", get(handlers::discover))
        .route("/api/movies/home", get(handlers::home))
        .route("/api/movies/reviews", get(handlers::review_counts))
        .route("/api/movie/:id", get(handlers::movie_detail))
        .route(
            "/api/movie/:id/recommendations",
            get(handlers::recommendations),
        )
        .route("/api/session", post(handlers::create_session))
        .route("/api/favorites", get(handlers::list_favorites))
        .route(
            "/api/favorites/:id",
            get(handlers::favorite_status).delete(handlers::remove_favorite),
        )
        .route("/api/favorites/:id/toggle", post(handlers::toggle_favorite))
        .route("/api/reconcile", post(handlers::reconcile))
}
