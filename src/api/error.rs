use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use super::types::ErrorBody;
use crate::favorites::FavoritesError;
use crate::tmdb::TmdbError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Remote(#[from] TmdbError),
    #[error("{0}")]
    Favorites(#[from] FavoritesError),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Remote(TmdbError::Status { status: 404, .. }) => StatusCode::NOT_FOUND,
            ApiError::Remote(_) => StatusCode::BAD_GATEWAY,
            ApiError::Favorites(FavoritesError::Network(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Favorites(FavoritesError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Favorites(FavoritesError::InvalidPage(_)) => StatusCode::BAD_REQUEST,
            ApiError::Favorites(FavoritesError::SessionRequired) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", self);
        } else {
            warn!(status = status.as_u16(), "{}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
