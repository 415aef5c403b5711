pub mod reconciler;
pub mod set;

pub use reconciler::{FavoriteSetReconciler, ReconcileReport, FAVORITES_KEY};
pub use set::FavoriteSet;

use crate::db::DbError;
use crate::tmdb::TmdbError;

#[derive(Debug, thiserror::Error)]
pub enum FavoritesError {
    #[error("Remote favorites request failed: {0}")]
    Network(#[from] TmdbError),
    #[error("Failed to persist favorites: {0}")]
    Storage(#[from] DbError),
    #[error("Invalid page {0}: pages start at 1")]
    InvalidPage(u32),
    #[error("A guest session is required")]
    SessionRequired,
}

pub type FavoritesResult<T> = Result<T, FavoritesError>;
