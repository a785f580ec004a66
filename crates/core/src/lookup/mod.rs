//! Catalog lookup pipeline.
//!
//! Enriches each row of a scanner report (or any CSV with `path`, `title`
//! and `year`) with the best catalog match and its magnet links. Every input
//! row yields exactly one output row, in input order.

mod pipeline;
mod rate_limiter;

pub use pipeline::{LookupPipeline, LookupSummary};
pub use rate_limiter::{RateLimiter, TokenBucket};

use std::time::Duration;

use crate::catalog::CatalogMovie;

/// Columns added (or overwritten in place) by enrichment, in order.
pub const ENRICHMENT_COLUMNS: [&str; 11] = [
    "query_term",
    "catalog_title",
    "catalog_year",
    "catalog_rating",
    "catalog_imdb",
    "catalog_url",
    "qualities",
    "magnets",
    "lookup_status",
    "lookup_attempts",
    "lookup_error",
];

/// Final status of one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStatus {
    Matched,
    NoMatch,
    Failed,
    /// Already enriched; not queried again.
    Skipped,
}

impl LookupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStatus::Matched => "matched",
            LookupStatus::NoMatch => "no_match",
            LookupStatus::Failed => "failed",
            LookupStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for LookupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of looking up one row, before it is folded into the table.
#[derive(Debug, Clone)]
pub struct LookupOutcome {
    pub query_term: String,
    pub movie: Option<CatalogMovie>,
    pub status: LookupStatus,
    pub attempts: u32,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl LookupOutcome {
    /// Enrichment cell values, aligned with [`ENRICHMENT_COLUMNS`].
    pub fn cells(&self) -> [String; 11] {
        let movie = self.movie.as_ref();
        let year = movie
            .map(|m| m.year)
            .filter(|y| *y > 0)
            .map(|y| y.to_string())
            .unwrap_or_default();
        [
            self.query_term.clone(),
            movie.map(|m| m.title.clone()).unwrap_or_default(),
            year,
            movie.map(|m| m.rating.to_string()).unwrap_or_default(),
            movie.map(|m| m.imdb_code.clone()).unwrap_or_default(),
            movie.map(|m| m.url.clone()).unwrap_or_default(),
            movie.map(|m| m.qualities().join("|")).unwrap_or_default(),
            movie.map(|m| m.magnets().join("|")).unwrap_or_default(),
            self.status.as_str().to_string(),
            self.attempts.to_string(),
            self.error.clone().unwrap_or_default(),
        ]
    }
}
