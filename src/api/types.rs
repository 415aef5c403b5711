use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tmdb::{MovieDetail, MovieId, MovieSummary, PagedResult};
use crate::util::{is_future_date, release_year};

/// A movie as shown on cards, carousels and list pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieCard {
    pub id: MovieId,
    pub title: String,
    pub overview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    pub vote_average: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    pub upcoming: bool,
}

impl MovieCard {
    pub fn from_summary(movie: MovieSummary, image_base: &str, today: NaiveDate) -> Self {
        let release_date = movie.release_date.filter(|d| !d.is_empty());
        Self {
            id: movie.id,
            title: movie.title,
            overview: movie.overview,
            poster_url: movie.poster_path.map(|p| format!("{}{}", image_base, p)),
            vote_average: movie.vote_average,
            release_year: release_year(release_date.as_deref()),
            upcoming: release_date
                .as_deref()
                .map(|d| is_future_date(d, today))
                .unwrap_or(false),
            release_date,
        }
    }
}

pub fn to_cards(
    page: PagedResult<MovieSummary>,
    image_base: &str,
    today: NaiveDate,
) -> PagedResult<MovieCard> {
    PagedResult {
        page: page.page,
        results: page
            .results
            .into_iter()
            .map(|m| MovieCard::from_summary(m, image_base, today))
            .collect(),
        total_pages: page.total_pages,
        total_results: page.total_results,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieDetailResponse {
    #[serde(flatten)]
    pub movie: MovieDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date_display: Option<String>,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteStatus {
    pub movie_id: MovieId,
    pub is_favorite: bool,
}

/// Favorites page. Remote listing when a guest session exists, otherwise
/// only the locally stored ids.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FavoritesListing {
    Remote(PagedResult<MovieCard>),
    Local { ids: Vec<MovieId> },
}

/// The three carousels of the home page.
#[derive(Debug, Clone, Serialize)]
pub struct HomeSections {
    pub trending: Vec<MovieCard>,
    pub family: Vec<MovieCard>,
    pub top_rated: Vec<MovieCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
