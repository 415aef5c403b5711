use std::collections::BTreeMap;

use async_trait::async_trait;

use super::types::*;

#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
    #[error("Invalid API configuration: {0}")]
    InvalidConfig(String),
}

pub type TmdbResult<T> = Result<T, TmdbError>;

/// Account-scoped favorites of a guest session.
#[async_trait]
pub trait FavoritesApi: Send + Sync {
    async fn set_favorite(&self, session: &SessionId, movie_id: MovieId, favorite: bool) -> TmdbResult<()>;
    /// One page of the session's favorites, newest first.
    async fn favorite_movies(&self, session: &SessionId, page: u32) -> TmdbResult<PagedResult<MovieSummary>>;
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn popular(&self, page: u32) -> TmdbResult<PagedResult<MovieSummary>>;
    async fn top_rated(&self, page: u32) -> TmdbResult<PagedResult<MovieSummary>>;
    async fn now_playing(&self, page: u32) -> TmdbResult<PagedResult<MovieSummary>>;
    async fn trending(&self, window: TrendingWindow, page: u32) -> TmdbResult<PagedResult<MovieSummary>>;
    async fn discover(&self, query: &DiscoverQuery) -> TmdbResult<PagedResult<MovieSummary>>;
    async fn movie(&self, id: MovieId) -> TmdbResult<MovieDetail>;
    async fn recommendations(&self, id: MovieId, page: u32) -> TmdbResult<PagedResult<MovieSummary>>;
    /// Number of reviews for a movie. Failures count as zero.
    async fn reviews_count(&self, id: MovieId) -> u64;
    /// Review counts for a whole set of movies in one call.
    async fn reviews_counts(&self, ids: &[MovieId]) -> BTreeMap<MovieId, u64>;
    async fn create_guest_session(&self) -> TmdbResult<GuestSession>;
}
