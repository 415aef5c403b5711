pub mod api;
pub mod client;
pub mod types;

pub use api::*;
pub use client::TmdbClient;
pub use types::*;
