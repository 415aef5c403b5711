use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{NaiveDate, Utc};

use super::error::ApiError;
use super::session::guest_session;
use super::types::*;
use crate::favorites::{FavoritesError, ReconcileReport};
use crate::server::AppState;
use crate::tmdb::*;
use crate::util::{format_date, QueryParams};

/// Genre shown in the second home carousel (family).
const HOME_DISCOVER_GENRE: &str = "10751";
const HOME_SECTION_SIZE: usize = 8;
const RECOMMENDATIONS_SIZE: usize = 10;
/// Most ids accepted by one review count request.
pub const MAX_REVIEW_IDS: usize = 100;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn catalog_page(params: &QueryParams) -> Result<u32, ApiError> {
    match params.page().map_err(ApiError::BadRequest)? {
        0 => Err(ApiError::BadRequest("invalid page 0: pages start at 1".to_string())),
        page => Ok(page),
    }
}

fn cards(state: &AppState, page: PagedResult<MovieSummary>) -> PagedResult<MovieCard> {
    to_cards(page, &state.config.api.image_base, today())
}

fn card_list(state: &AppState, page: PagedResult<MovieSummary>, n: usize) -> Vec<MovieCard> {
    cards(state, page.truncated(n)).results
}

pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<PagedResult<MovieCard>>, ApiError> {
    let movies = state.catalog.popular(catalog_page(&params)?).await?;
    Ok(Json(cards(&state, movies)))
}

pub async fn top_rated(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<PagedResult<MovieCard>>, ApiError> {
    let movies = state.catalog.top_rated(catalog_page(&params)?).await?;
    Ok(Json(cards(&state, movies)))
}

pub async fn now_playing(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<PagedResult<MovieCard>>, ApiError> {
    let movies = state.catalog.now_playing(catalog_page(&params)?).await?;
    Ok(Json(cards(&state, movies)))
}

pub async fn trending(
    State(state): State<AppState>,
    Path(window): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Json<PagedResult<MovieCard>>, ApiError> {
    let window = window.parse::<TrendingWindow>().map_err(ApiError::BadRequest)?;
    let movies = state.catalog.trending(window, catalog_page(&params)?).await?;
    Ok(Json(cards(&state, movies)))
}

pub async fn discover(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<PagedResult<MovieCard>>, ApiError> {
    let query = DiscoverQuery {
        with_genres: params.get("with_genres").map(str::to_string),
        sort_by: params.get("sort_by").map(str::to_string),
        page: Some(catalog_page(&params)?),
    };
    let movies = state.catalog.discover(&query).await?;
    Ok(Json(cards(&state, movies)))
}

/// GET /api/movies/home?window=day|week
pub async fn home(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<HomeSections>, ApiError> {
    let window = match params.get("window") {
        Some(raw) => raw.parse::<TrendingWindow>().map_err(ApiError::BadRequest)?,
        None => TrendingWindow::Day,
    };
    let family = DiscoverQuery {
        with_genres: Some(HOME_DISCOVER_GENRE.to_string()),
        sort_by: Some("vote_count.desc".to_string()),
        page: Some(1),
    };
    let (trending, family, top_rated) = tokio::try_join!(
        state.catalog.trending(window, 1),
        state.catalog.discover(&family),
        state.catalog.top_rated(1),
    )?;

    Ok(Json(HomeSections {
        trending: card_list(&state, trending, HOME_SECTION_SIZE),
        family: card_list(&state, family, HOME_SECTION_SIZE),
        top_rated: card_list(&state, top_rated, HOME_SECTION_SIZE),
    }))
}

pub async fn movie_detail(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
) -> Result<Json<MovieDetailResponse>, ApiError> {
    let movie = state.catalog.movie(movie_id).await?;
    let poster_url = movie
        .poster_path
        .as_ref()
        .map(|p| format!("{}{}", state.config.api.image_base, p));
    let release_date_display = movie.release_date.as_deref().and_then(format_date);

    Ok(Json(MovieDetailResponse {
        movie,
        poster_url,
        release_date_display,
        is_favorite: state.favorites.is_favorite(movie_id),
    }))
}

pub async fn recommendations(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
    Query(params): Query<QueryParams>,
) -> Result<Json<PagedResult<MovieCard>>, ApiError> {
    let movies = state
        .catalog
        .recommendations(movie_id, catalog_page(&params)?)
        .await?;
    Ok(Json(cards(&state, movies.truncated(RECOMMENDATIONS_SIZE))))
}

/// GET /api/movies/reviews?ids=1,2,3
pub async fn review_counts(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<BTreeMap<MovieId, u64>>, ApiError> {
    let ids = params.movie_ids("ids").map_err(ApiError::BadRequest)?;
    if ids.len() > MAX_REVIEW_IDS {
        return Err(ApiError::BadRequest(format!(
            "too many movie ids: {} (at most {})",
            ids.len(),
            MAX_REVIEW_IDS
        )));
    }
    Ok(Json(state.catalog.reviews_counts(&ids).await))
}

pub async fn create_session(State(state): State<AppState>) -> Result<Json<GuestSession>, ApiError> {
    Ok(Json(state.catalog.create_guest_session().await?))
}

pub async fn favorite_status(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
) -> Json<FavoriteStatus> {
    Json(FavoriteStatus {
        movie_id,
        is_favorite: state.favorites.is_favorite(movie_id),
    })
}

pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
    Query(params): Query<QueryParams>,
    headers: HeaderMap,
) -> Result<Json<FavoriteStatus>, ApiError> {
    let session = guest_session(&headers, &params);
    let is_favorite = state
        .favorites
        .toggle_favorite(movie_id, session.as_ref())
        .await?;
    Ok(Json(FavoriteStatus {
        movie_id,
        is_favorite,
    }))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
    Query(params): Query<QueryParams>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let session = guest_session(&headers, &params);
    state
        .favorites
        .remove_favorite(movie_id, session.as_ref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_favorites(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
    headers: HeaderMap,
) -> Result<Json<FavoritesListing>, ApiError> {
    let Some(session) = guest_session(&headers, &params) else {
        return Ok(Json(FavoritesListing::Local {
            ids: state.favorites.snapshot().to_vec(),
        }));
    };

    let page = params.page().map_err(ApiError::BadRequest)?;
    let movies = state.favorites.list_remote_favorites(&session, page).await?;
    Ok(Json(FavoritesListing::Remote(cards(&state, movies))))
}

pub async fn reconcile(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
    headers: HeaderMap,
) -> Result<Json<ReconcileReport>, ApiError> {
    let session = guest_session(&headers, &params).ok_or(FavoritesError::SessionRequired)?;
    Ok(Json(state.favorites.reconcile(&session).await?))
}
