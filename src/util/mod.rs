mod date;
mod query;

pub use date::{format_date, is_future_date, release_year};
pub use query::QueryParams;
