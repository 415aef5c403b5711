use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::set::FavoriteSet;
use super::{FavoritesError, FavoritesResult};
use crate::db::KeyValueRepo;
use crate::tmdb::{FavoritesApi, MovieId, MovieSummary, PagedResult, SessionId};

/// Durable key holding the favorite set.
pub const FAVORITES_KEY: &str = "favoriteMovieIds";

/// Upper bound on pages walked while reconciling; the API serves at most 500.
const MAX_REMOTE_PAGES: u32 = 500;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Local-only ids pushed to the remote list.
    pub pushed: Vec<MovieId>,
    /// Local-only ids whose push failed. They stay in the local set.
    pub failed: Vec<MovieId>,
    /// Size of the remote list after the merge.
    pub remote_total: usize,
}

/// Keeps the favorite set in step between the remote account list of a
/// guest session and the local durable key.
///
/// Local state changes only after the remote call succeeded. Without a
/// session every change goes to the local key alone.
pub struct FavoriteSetReconciler {
    remote: Arc<dyn FavoritesApi>,
    store: Arc<dyn KeyValueRepo>,
    snapshot: ArcSwap<FavoriteSet>,
    write_lock: Mutex<()>,
}

impl FavoriteSetReconciler {
    pub async fn new(remote: Arc<dyn FavoritesApi>, store: Arc<dyn KeyValueRepo>) -> Self {
        let initial = read_favorite_set(store.as_ref()).await;
        info!("Loaded {} favorite movies", initial.len());
        Self {
            remote,
            store,
            snapshot: ArcSwap::from_pointee(initial),
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_favorite(&self, movie_id: MovieId) -> bool {
        self.snapshot.load().contains(movie_id)
    }

    pub fn snapshot(&self) -> FavoriteSet {
        FavoriteSet::clone(&self.snapshot.load())
    }

    /// Reads the durable key. Missing or unparsable values give an empty set.
    pub async fn load_favorite_set(&self) -> FavoriteSet {
        read_favorite_set(self.store.as_ref()).await
    }

    /// Flips membership of `movie_id` and returns the new state.
    ///
    /// With a session the remote list is updated first; if that fails
    /// nothing local changes and the error is returned.
    pub async fn toggle_favorite(
        &self,
        movie_id: MovieId,
        session: Option<&SessionId>,
    ) -> FavoritesResult<bool> {
        let _guard = self.write_lock.lock().await;
        let desired = !self.is_favorite(movie_id);

        let remote_applied = match session {
            Some(session) => {
                self.push(session, movie_id, desired).await?;
                true
            }
            None => {
                debug!(movie_id = %movie_id, "No guest session, updating local favorites only");
                false
            }
        };

        let mut next = self.snapshot();
        next.set(movie_id, desired);
        self.commit(next, remote_applied).await?;

        info!(movie_id = %movie_id, favorite = desired, "Toggled favorite");
        Ok(desired)
    }

    /// Unconditionally removes `movie_id` from the remote list and the local set.
    pub async fn remove_favorite(
        &self,
        movie_id: MovieId,
        session: Option<&SessionId>,
    ) -> FavoritesResult<()> {
        let session = session.ok_or(FavoritesError::SessionRequired)?;
        let _guard = self.write_lock.lock().await;

        self.push(session, movie_id, false).await?;

        let mut next = self.snapshot();
        next.set(movie_id, false);
        self.commit(next, true).await
    }

    /// One page of the session's remote favorites, newest first.
    ///
    /// Page numbers start at 1. Pages past the end come back empty with the
    /// real `total_pages`.
    pub async fn list_remote_favorites(
        &self,
        session: &SessionId,
        page: u32,
    ) -> FavoritesResult<PagedResult<MovieSummary>> {
        if page == 0 {
            return Err(FavoritesError::InvalidPage(page));
        }
        Ok(self.remote.favorite_movies(session, page).await?)
    }

    /// Merges local-only favorites into the remote list of `session`, then
    /// makes the local set a mirror of the merged remote list.
    pub async fn reconcile(&self, session: &SessionId) -> FavoritesResult<ReconcileReport> {
        let _guard = self.write_lock.lock().await;

        let remote = self.remote_ids(session).await?;
        let local = self.snapshot();
        let mut merged = remote.clone();
        let mut report = ReconcileReport::default();

        for movie_id in local.iter().filter(|id| !remote.contains(*id)) {
            match self.remote.set_favorite(session, movie_id, true).await {
                Ok(()) => report.pushed.push(movie_id),
                Err(e) => {
                    warn!(movie_id = %movie_id, "Failed to push local favorite: {}", e);
                    report.failed.push(movie_id);
                }
            }
            merged.insert(movie_id);
        }
        report.remote_total = remote.len() + report.pushed.len();

        self.commit(merged, true).await?;

        info!(
            pushed = report.pushed.len(),
            failed = report.failed.len(),
            remote_total = report.remote_total,
            "Reconciled favorites"
        );
        Ok(report)
    }

    async fn push(&self, session: &SessionId, movie_id: MovieId, favorite: bool) -> FavoritesResult<()> {
        self.remote
            .set_favorite(session, movie_id, favorite)
            .await
            .map_err(|e| {
                warn!(movie_id = %movie_id, "Failed to update favorite: {}", e);
                FavoritesError::Network(e)
            })
    }

    async fn remote_ids(&self, session: &SessionId) -> FavoritesResult<FavoriteSet> {
        let mut ids = FavoriteSet::new();
        let mut page = 1;
        loop {
            let result = self.remote.favorite_movies(session, page).await?;
            ids.extend(result.results.iter().map(|m| m.id));
            if result.results.is_empty() || page >= result.total_pages || page >= MAX_REMOTE_PAGES {
                break;
            }
            page += 1;
        }
        Ok(ids)
    }

    /// Persists `next` over the previous value. The in-memory snapshot
    /// follows a remote change even when the write fails.
    async fn commit(&self, next: FavoriteSet, remote_applied: bool) -> FavoritesResult<()> {
        let stored = self.store.put_value(FAVORITES_KEY, &next.to_json()).await;
        if stored.is_ok() || remote_applied {
            self.snapshot.store(Arc::new(next));
        }
        stored.map_err(|e| {
            warn!("Failed to persist favorites: {}", e);
            FavoritesError::Storage(e)
        })
    }
}

async fn read_favorite_set(store: &dyn KeyValueRepo) -> FavoriteSet {
    let raw = match store.get_value(FAVORITES_KEY).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return FavoriteSet::new(),
        Err(e) => {
            warn!("Failed to read favorites, starting empty: {}", e);
            return FavoriteSet::new();
        }
    };

    FavoriteSet::from_json(&raw).unwrap_or_else(|e| {
        warn!("Stored favorites are malformed, starting empty: {}", e);
        FavoriteSet::new()
    })
}
