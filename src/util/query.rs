use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use crate::tmdb::MovieId;

#[derive(Debug, Default)]
pub struct QueryParams {
    map: HashMap<String, String>,
}

impl<'de> Deserialize<'de> for QueryParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = HashMap::<String, String>::deserialize(deserializer)?;
        Ok(QueryParams { map })
    }
}

impl QueryParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|v| v.as_str()).filter(|v| !v.is_empty())
    }

    /// The `page` parameter, 1 when absent.
    pub fn page(&self) -> Result<u32, String> {
        match self.get("page") {
            None => Ok(1),
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid page: {}", raw)),
        }
    }

    /// Comma separated movie ids from `key`. Blank entries are skipped.
    pub fn movie_ids(&self, key: &str) -> Result<Vec<MovieId>, String> {
        let Some(raw) = self.get(key) else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<MovieId>().map_err(|_| format!("invalid movie id: {}", s)))
            .collect()
    }
}
