use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::tmdb::MovieId;

/// Movies a user has marked favorite.
///
/// Serialized as a JSON array of integers in ascending order. Duplicates in
/// the input collapse on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet(BTreeSet<MovieId>);

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: MovieId) -> bool {
        self.0.contains(&id)
    }

    /// Adds or removes `id`. Returns true if membership changed.
    pub fn set(&mut self, id: MovieId, favorite: bool) -> bool {
        if favorite {
            self.0.insert(id)
        } else {
            self.0.remove(&id)
        }
    }

    pub fn insert(&mut self, id: MovieId) -> bool {
        self.0.insert(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = MovieId> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<MovieId> {
        self.iter().collect()
    }

    pub fn to_json(&self) -> String {
        // A set of integers always serializes.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl FromIterator<MovieId> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = MovieId>>(iter: I) -> Self {
        FavoriteSet(iter.into_iter().collect())
    }
}

impl Extend<MovieId> for FavoriteSet {
    fn extend<I: IntoIterator<Item = MovieId>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_format() {
        let set: FavoriteSet = [55, 12, 55].into_iter().map(MovieId).collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_json(), "[12,55]");
    }

    #[test]
    fn test_from_json_dedups() {
        let set = FavoriteSet::from_json("[3, 1, 3]").unwrap();
        assert_eq!(set.to_vec(), vec![MovieId(1), MovieId(3)]);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(FavoriteSet::from_json("not-json").is_err());
        assert!(FavoriteSet::from_json("[-4]").is_err());
        assert!(FavoriteSet::from_json("[12, 0]").is_err());
        assert!(FavoriteSet::from_json("{\"a\": 1}").is_err());
    }

    #[test]
    fn test_set_reports_change() {
        let mut set = FavoriteSet::new();
        assert!(set.set(MovieId(7), true));
        assert!(!set.set(MovieId(7), true));
        assert!(set.set(MovieId(7), false));
        assert!(!set.set(MovieId(7), false));
        assert!(set.is_empty());
    }
}
