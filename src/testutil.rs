//! In-process stand-ins for the metadata API, shared by unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::tmdb::*;

pub(crate) fn unavailable() -> TmdbError {
    TmdbError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
}

pub(crate) fn summary(id: u64) -> MovieSummary {
    MovieSummary {
        id: MovieId(id),
        title: format!("Movie {}", id),
        overview: String::new(),
        poster_path: Some(format!("/poster{}.jpg", id)),
        backdrop_path: None,
        release_date: Some("2001-09-11".to_string()),
        vote_average: 7.5,
        vote_count: 10,
        popularity: 1.0,
        genre_ids: Vec::new(),
    }
}

fn page_of(ids: &[MovieId], page: u32, page_size: usize) -> PagedResult<MovieSummary> {
    let page_size = page_size.max(1);
    PagedResult {
        page,
        results: ids
            .iter()
            .skip((page.max(1) as usize - 1) * page_size)
            .take(page_size)
            .map(|id| summary(id.0))
            .collect(),
        total_pages: ids.len().div_ceil(page_size) as u32,
        total_results: ids.len() as u64,
    }
}

/// Account favorites kept in a vector, newest first.
#[derive(Default)]
pub(crate) struct FakeRemote {
    pub favorites: Mutex<Vec<MovieId>>,
    pub failing: AtomicBool,
    pub failing_ids: Mutex<HashSet<MovieId>>,
    pub page_size: usize,
    pub list_calls: AtomicUsize,
    /// When set, every `set_favorite` waits for a permit before answering.
    pub gate: Option<Arc<Semaphore>>,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl FakeRemote {
    pub fn with(ids: &[u64], page_size: usize) -> Self {
        Self {
            favorites: Mutex::new(ids.iter().copied().map(MovieId).collect()),
            page_size,
            ..Default::default()
        }
    }

    pub fn ids(&self) -> Vec<MovieId> {
        self.favorites.lock().unwrap().clone()
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FavoritesApi for FakeRemote {
    async fn set_favorite(&self, _session: &SessionId, movie_id: MovieId, favorite: bool) -> TmdbResult<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) || self.failing_ids.lock().unwrap().contains(&movie_id) {
            return Err(unavailable());
        }
        let mut favorites = self.favorites.lock().unwrap();
        favorites.retain(|id| *id != movie_id);
        if favorite {
            favorites.insert(0, movie_id);
        }
        Ok(())
    }

    async fn favorite_movies(&self, _session: &SessionId, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(page_of(&self.favorites.lock().unwrap(), page, self.page_size))
    }
}

/// Catalog with 25 movies (ids 1..=25) served 10 per page.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    pub failing: AtomicBool,
    pub trending_windows: Mutex<Vec<TrendingWindow>>,
}

impl FakeCatalog {
    fn listing(&self, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let ids: Vec<MovieId> = (1..=25).map(MovieId).collect();
        Ok(page_of(&ids, page, 10))
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn popular(&self, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        self.listing(page)
    }

    async fn top_rated(&self, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        self.listing(page)
    }

    async fn now_playing(&self, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        self.listing(page)
    }

    async fn trending(&self, window: TrendingWindow, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        self.trending_windows.lock().unwrap().push(window);
        self.listing(page)
    }

    async fn discover(&self, query: &DiscoverQuery) -> TmdbResult<PagedResult<MovieSummary>> {
        self.listing(query.page.unwrap_or(1))
    }

    async fn movie(&self, id: MovieId) -> TmdbResult<MovieDetail> {
        if self.failing.load(Ordering::SeqCst) || id.0 > 25 {
            return Err(TmdbError::Status {
                status: 404,
                body: "not found".to_string(),
            });
        }
        Ok(MovieDetail {
            id,
            title: format!("Movie {}", id),
            tagline: None,
            overview: String::new(),
            poster_path: Some(format!("/poster{}.jpg", id)),
            backdrop_path: None,
            release_date: Some("2001-09-11".to_string()),
            runtime: Some(120),
            status: Some("Released".to_string()),
            budget: 0,
            revenue: 0,
            vote_average: 7.5,
            vote_count: 10,
            genres: Vec::new(),
            spoken_languages: Vec::new(),
            production_companies: Vec::new(),
            production_countries: Vec::new(),
        })
    }

    async fn recommendations(&self, _id: MovieId, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        self.listing(page)
    }

    async fn reviews_count(&self, id: MovieId) -> u64 {
        id.0 * 2
    }

    async fn reviews_counts(&self, ids: &[MovieId]) -> BTreeMap<MovieId, u64> {
        ids.iter().map(|id| (*id, id.0 * 2)).collect()
    }

    async fn create_guest_session(&self) -> TmdbResult<GuestSession> {
        Ok(GuestSession {
            success: true,
            guest_session_id: SessionId::parse("guest-1").unwrap(),
            expires_at: None,
        })
    }
}
