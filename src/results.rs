//! Result envelope returned by proximity searches.

use serde::{Deserialize, Serialize};

/// Entities found by a proximity search, nearest first.
///
/// `distances[i]` is the distance in meters from the search center to
/// `results[i]`. The envelope is built once when a search finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults<T> {
    results: Vec<T>,
    distances: Vec<f64>,
    last_resolution: usize,
}

impl<T> SearchResults<T> {
    pub fn new(results: Vec<T>, distances: Vec<f64>, last_resolution: usize) -> Self {
        debug_assert_eq!(results.len(), distances.len());
        Self {
            results,
            distances,
            last_resolution,
        }
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Distance of the farthest result, or `None` when nothing was found.
    ///
    /// Pass this as the next search's minimum distance to page further out.
    pub fn last_distance(&self) -> Option<f64> {
        self.distances.last().copied()
    }

    /// Resolution of the cells searched last.
    pub fn last_resolution(&self) -> usize {
        self.last_resolution
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results paired with their distances.
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
        self.results.iter().zip(self.distances.iter().copied())
    }

    pub fn into_results(self) -> Vec<T> {
        self.results
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<f64>, usize) {
        (self.results, self.distances, self.last_resolution)
    }
}

impl<T> IntoIterator for SearchResults<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
