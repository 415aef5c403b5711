use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use super::api::*;
use super::types::*;

/// Review count requests in flight at once for one batch.
pub const MAX_CONCURRENT_REVIEWS: usize = 8;

/// HTTP client for a TMDB-compatible movie metadata API.
///
/// Every request carries the bearer token and `accept: application/json`.
/// The client is cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl TmdbClient {
    pub fn new(base_url: &str, token: &str, language: &str, timeout: Duration) -> TmdbResult<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| TmdbError::InvalidConfig(format!("bad API token: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> TmdbResult<T> {
        debug!(path = %path, "Making request");
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| {
                error!(path = %path, "Request error: {}", e);
                TmdbError::Http(e)
            })?;
        decode(path, response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> TmdbResult<T> {
        debug!(path = %path, "Making request");
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(path = %path, "Request error: {}", e);
                TmdbError::Http(e)
            })?;
        decode(path, response).await
    }

    async fn movie_list<T: DeserializeOwned>(&self, path: &str, page: u32) -> TmdbResult<T> {
        self.get(path, &[("language", self.language.clone()), ("page", page.to_string())])
            .await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> TmdbResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(path = %path, status = status.as_u16(), "Response error: {}", body);
        return Err(TmdbError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| TmdbError::Decode {
        path: path.to_string(),
        source,
    })
}

fn account_path(session: &SessionId, tail: &str) -> String {
    format!("/account/{}{}", urlencoding::encode(session.as_str()), tail)
}

// The mutation endpoint answers with a status object we do not need.
#[derive(serde::Deserialize)]
struct StatusResponse {}

#[async_trait]
impl FavoritesApi for TmdbClient {
    async fn set_favorite(&self, session: &SessionId, movie_id: MovieId, favorite: bool) -> TmdbResult<()> {
        let path = account_path(session, "/favorite");
        let _: StatusResponse = self.post(&path, &FavoriteRequest::movie(movie_id, favorite)).await?;
        Ok(())
    }

    async fn favorite_movies(&self, session: &SessionId, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        let path = account_path(session, "/favorite/movies");
        self.get(
            &path,
            &[
                ("language", self.language.clone()),
                ("page", page.to_string()),
                ("sort_by", "created_at.desc".to_string()),
            ],
        )
        .await
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn popular(&self, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        self.movie_list("/movie/popular", page).await
    }

    async fn top_rated(&self, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        self.movie_list("/movie/top_rated", page).await
    }

    async fn now_playing(&self, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        self.movie_list("/movie/now_playing", page).await
    }

    async fn trending(&self, window: TrendingWindow, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        let path = format!("/trending/movie/{}", window.as_str());
        self.movie_list(&path, page).await
    }

    async fn discover(&self, query: &DiscoverQuery) -> TmdbResult<PagedResult<MovieSummary>> {
        let mut params = vec![
            ("language", self.language.clone()),
            ("page", query.page.unwrap_or(1).to_string()),
        ];
        if let Some(ref genres) = query.with_genres {
            params.push(("with_genres", genres.clone()));
        }
        if let Some(ref sort_by) = query.sort_by {
            params.push(("sort_by", sort_by.clone()));
        }
        self.get("/discover/movie", &params).await
    }

    async fn movie(&self, id: MovieId) -> TmdbResult<MovieDetail> {
        let path = format!("/movie/{}", id);
        self.get(&path, &[("language", self.language.clone())]).await
    }

    async fn recommendations(&self, id: MovieId, page: u32) -> TmdbResult<PagedResult<MovieSummary>> {
        let path = format!("/movie/{}/recommendations", id);
        self.movie_list(&path, page).await
    }

    async fn reviews_count(&self, id: MovieId) -> u64 {
        let path = format!("/movie/{}/reviews", id);
        match self.movie_list::<ReviewsPage>(&path, 1).await {
            Ok(page) => page.total_results,
            Err(e) => {
                warn!("Error fetching reviews for movie {}: {}", id, e);
                0
            }
        }
    }

    async fn reviews_counts(&self, ids: &[MovieId]) -> BTreeMap<MovieId, u64> {
        let unique: BTreeSet<MovieId> = ids.iter().copied().collect();
        let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_REVIEWS));
        let mut tasks = JoinSet::new();
        for id in unique {
            let client = self.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok();
                (id, client.reviews_count(id).await)
            });
        }

        let mut counts = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, count)) => {
                    counts.insert(id, count);
                }
                Err(e) => warn!("Review count task failed: {}", e),
            }
        }
        counts
    }

    async fn create_guest_session(&self) -> TmdbResult<GuestSession> {
        self.get("/authentication/guest_session/new", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorded {
        posts: Arc<Mutex<Vec<(String, FavoriteRequest)>>>,
        queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
        reviews_in_flight: Arc<AtomicUsize>,
        reviews_peak: Arc<AtomicUsize>,
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer test-token")
            && headers.get("accept").and_then(|v| v.to_str().ok()) == Some("application/json")
    }

    async fn fake_favorite(
        State(rec): State<Recorded>,
        Path(session): Path<String>,
        headers: HeaderMap,
        Json(body): Json<FavoriteRequest>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        if !authorized(&headers) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        rec.posts.lock().unwrap().push((session, body));
        Ok(Json(serde_json::json!({"status_code": 1, "status_message": "Success."})))
    }

    async fn fake_favorite_movies(
        State(rec): State<Recorded>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        rec.queries.lock().unwrap().push(params);
        Json(serde_json::json!({
            "page": 2,
            "results": [{"id": 7, "title": "Seven"}],
            "total_pages": 3,
            "total_results": 41
        }))
    }

    async fn fake_reviews(
        State(rec): State<Recorded>,
        Path(id): Path<u64>,
    ) -> Result<Json<serde_json::Value>, StatusCode> {
        let now = rec.reviews_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        rec.reviews_peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        rec.reviews_in_flight.fetch_sub(1, Ordering::SeqCst);

        if id == 404 {
            return Err(StatusCode::NOT_FOUND);
        }
        Ok(Json(serde_json::json!({"id": id, "page": 1, "results": [], "total_results": id * 2})))
    }

    async fn spawn_fake(rec: Recorded) -> String {
        let app = Router::new()
            .route("/account/:session/favorite", post(fake_favorite))
            .route("/account/:session/favorite/movies", get(fake_favorite_movies))
            .route("/movie/:id/reviews", get(fake_reviews))
            .route("/trending/movie/:window", get(|| async { "not json" }))
            .with_state(rec);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn client(base: &str) -> TmdbClient {
        TmdbClient::new(base, "test-token", "en-US", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_set_favorite_sends_body_and_headers() {
        let rec = Recorded::default();
        let base = spawn_fake(rec.clone()).await;
        let session = SessionId::parse("abc").unwrap();

        client(&base).set_favorite(&session, MovieId(99), true).await.unwrap();

        let posts = rec.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "abc");
        assert_eq!(posts[0].1, FavoriteRequest::movie(MovieId(99), true));
    }

    #[tokio::test]
    async fn test_wrong_token_is_status_error() {
        let rec = Recorded::default();
        let base = spawn_fake(rec.clone()).await;
        let session = SessionId::parse("abc").unwrap();
        let bad = TmdbClient::new(&base, "other", "en-US", Duration::from_secs(5)).unwrap();

        let err = bad.set_favorite(&session, MovieId(1), true).await.unwrap_err();
        assert!(matches!(err, TmdbError::Status { status: 401, .. }));
        assert!(rec.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_favorite_movies_query() {
        let rec = Recorded::default();
        let base = spawn_fake(rec.clone()).await;
        let session = SessionId::parse("abc").unwrap();

        let page = client(&base).favorite_movies(&session, 2).await.unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.results[0].id, MovieId(7));

        let queries = rec.queries.lock().unwrap();
        assert_eq!(queries[0].get("page").map(String::as_str), Some("2"));
        assert_eq!(queries[0].get("language").map(String::as_str), Some("en-US"));
        assert_eq!(queries[0].get("sort_by").map(String::as_str), Some("created_at.desc"));
    }

    #[tokio::test]
    async fn test_decode_error() {
        let base = spawn_fake(Recorded::default()).await;
        let err = client(&base).trending(TrendingWindow::Day, 1).await.unwrap_err();
        assert!(matches!(err, TmdbError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_reviews_counts_batch() {
        let base = spawn_fake(Recorded::default()).await;
        let counts = client(&base)
            .reviews_counts(&[MovieId(3), MovieId(404), MovieId(3), MovieId(10)])
            .await;
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[&MovieId(3)], 6);
        assert_eq!(counts[&MovieId(10)], 20);
        assert_eq!(counts[&MovieId(404)], 0);
    }

    #[tokio::test]
    async fn test_reviews_counts_bounded_concurrency() {
        let rec = Recorded::default();
        let base = spawn_fake(rec.clone()).await;
        let ids: Vec<MovieId> = (1..=40).map(MovieId).collect();

        let counts = client(&base).reviews_counts(&ids).await;
        assert_eq!(counts.len(), 40);
        assert_eq!(counts[&MovieId(40)], 80);

        let peak = rec.reviews_peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= MAX_CONCURRENT_REVIEWS, "peak {}", peak);
        assert_eq!(rec.reviews_in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let session = SessionId::parse("abc").unwrap();
        let err = client(&format!("http://{}", addr))
            .set_favorite(&session, MovieId(1), true)
            .await
            .unwrap_err();
        assert!(matches!(err, TmdbError::Http(_)));
    }
}
