//! Mock release catalog for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, CatalogMovie, CatalogQuery, ReleaseCatalog};

/// Mock implementation of the ReleaseCatalog trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable movies, matched by case-insensitive title substring
/// - Script a queue of errors returned before any results
/// - Track queries for assertions
/// - Simulate latency
#[derive(Debug, Default)]
pub struct MockCatalog {
    /// Movies in catalog order.
    movies: Arc<RwLock<Vec<CatalogMovie>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<CatalogQuery>>>,
    /// Errors returned, one per search, before results are served.
    errors: Arc<RwLock<VecDeque<CatalogError>>>,
    /// Artificial latency per search.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a movie.
    pub async fn add_movie(&self, movie: CatalogMovie) {
        self.movies.write().await.push(movie);
    }

    /// Replace all movies at once.
    pub async fn set_movies(&self, movies: Vec<CatalogMovie>) {
        *self.movies.write().await = movies;
    }

    /// Queue an error for the next search that has none queued before it.
    pub async fn push_error(&self, error: CatalogError) {
        self.errors.write().await.push_back(error);
    }

    /// Delay every search by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<CatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Number of searches made.
    pub async fn search_count(&self) -> usize {
        self.queries.read().await.len()
    }
}

#[async_trait]
impl ReleaseCatalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogMovie>, CatalogError> {
        self.queries.write().await.push(query.clone());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.errors.write().await.pop_front() {
            return Err(error);
        }

        let title_lower = query.title.to_lowercase();
        let movies = self.movies.read().await;
        Ok(movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&title_lower))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_search_filters_by_title() {
        let catalog = MockCatalog::new();
        catalog.add_movie(fixtures::movie("Heat", 1995, &[])).await;
        catalog.add_movie(fixtures::movie("Alien", 1979, &[])).await;

        let results = catalog
            .search(&CatalogQuery::new("heat", Some(1995)))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Heat");
        assert_eq!(catalog.search_count().await, 1);
    }

    #[tokio::test]
    async fn test_scripted_errors_come_first() {
        let catalog = MockCatalog::new();
        catalog.add_movie(fixtures::movie("Heat", 1995, &[])).await;
        catalog.push_error(CatalogError::RateLimitExceeded).await;

        let query = CatalogQuery::new("Heat", None);
        assert!(matches!(
            catalog.search(&query).await,
            Err(CatalogError::RateLimitExceeded)
        ));
        assert_eq!(catalog.search(&query).await.unwrap().len(), 1);
        assert_eq!(catalog.recorded_queries().await, vec![query.clone(), query]);
    }
}
