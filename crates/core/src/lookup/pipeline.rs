use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use super::rate_limiter::RateLimiter;
use super::{LookupOutcome, LookupStatus, ENRICHMENT_COLUMNS};
use crate::catalog::{best_match, CatalogQuery, ReleaseCatalog};
use crate::config::LookupConfig;
use crate::metrics;
use crate::report::CsvTable;
use crate::retry::{run_with_retry, AttemptObserver, AttemptOutcome, NoopObserver, RetryPolicy};
use crate::title::{parse_path_title, YearRange};

/// Per-status row counts for one enrichment run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupSummary {
    pub matched: usize,
    pub no_match: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl LookupSummary {
    pub fn record(&mut self, status: LookupStatus) {
        match status {
            LookupStatus::Matched => self.matched += 1,
            LookupStatus::NoMatch => self.no_match += 1,
            LookupStatus::Failed => self.failed += 1,
            LookupStatus::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.matched + self.no_match + self.failed + self.skipped
    }
}

/// Looks rows up in a [`ReleaseCatalog`] and folds the results back in.
///
/// Rows already carrying magnet links are skipped unless `refresh` is set.
pub struct LookupPipeline {
    catalog: Arc<dyn ReleaseCatalog>,
    policy: RetryPolicy,
    concurrency: usize,
    limiter: Option<Arc<RateLimiter>>,
    observer: Arc<dyn AttemptObserver>,
    refresh: bool,
    years: YearRange,
}

impl LookupPipeline {
    /// Sequential pipeline with default retry policy and no rate limit.
    pub fn new(catalog: Arc<dyn ReleaseCatalog>) -> Self {
        Self {
            catalog,
            policy: RetryPolicy::default(),
            concurrency: 1,
            limiter: None,
            observer: Arc::new(NoopObserver),
            refresh: false,
            years: YearRange::default(),
        }
    }

    /// Build from lookup configuration. The rate limiter is only attached
    /// when more than one lookup may be in flight.
    pub fn from_config(catalog: Arc<dyn ReleaseCatalog>, config: &LookupConfig) -> Self {
        let slow_after = Duration::try_from_secs_f64(config.slow_after_secs)
            .ok()
            .filter(|d| !d.is_zero());
        let policy = RetryPolicy::from_config(&config.retry).with_slow_after(slow_after);

        let pipeline = Self::new(catalog)
            .with_policy(policy)
            .with_concurrency(config.concurrency)
            .with_refresh(config.refresh);

        if config.concurrency > 1 {
            pipeline.with_rate_limit(config.requests_per_minute)
        } else {
            pipeline
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_rate_limit(mut self, requests_per_minute: u32) -> Self {
        self.limiter = Some(Arc::new(RateLimiter::new(requests_per_minute)));
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn AttemptObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn is_rate_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Query the catalog with retries and pick the best match.
    pub async fn lookup(&self, query: &CatalogQuery) -> LookupOutcome {
        let term = query.term();
        let catalog = self.catalog.as_ref();
        let limiter = self.limiter.as_deref();

        let report = run_with_retry(
            &self.policy,
            &term,
            self.observer.as_ref(),
            move |_| async move {
                if let Some(limiter) = limiter {
                    limiter.acquire().await;
                }
                match catalog.search(query).await {
                    Ok(movies) => AttemptOutcome::Success(movies),
                    Err(err) if err.is_retryable() => AttemptOutcome::RetryableFailure(err),
                    Err(err) => AttemptOutcome::TerminalFailure(err),
                }
            },
        )
        .await;

        let (movie, status, error) = match report.outcome {
            Ok(movies) => {
                let movie = best_match(&movies, query.year).cloned();
                let status = if movie.is_some() {
                    LookupStatus::Matched
                } else {
                    LookupStatus::NoMatch
                };
                (movie, status, None)
            }
            Err(err) => (None, LookupStatus::Failed, Some(err.to_string())),
        };

        debug!(
            query = %term,
            status = %status,
            attempts = report.attempts,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Lookup finished"
        );

        LookupOutcome {
            query_term: term,
            movie,
            status,
            attempts: report.attempts,
            elapsed: report.elapsed,
            error,
        }
    }

    /// Catalog query for one table row.
    ///
    /// Uses the `title` and `year` cells when present; an empty title is
    /// derived from `path` with the title parser.
    pub fn row_query(&self, table: &CsvTable, row: usize) -> CatalogQuery {
        let year = table
            .get(row, "year")
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|y| self.years.contains(*y));

        let title = normalize_title(table.get(row, "title"));
        if !title.is_empty() {
            return CatalogQuery::new(title, year);
        }

        let path = Path::new(table.get(row, "path"));
        let mut query = CatalogQuery::from(&parse_path_title(path, !path.is_file(), self.years));
        query.year = year.or(query.year);
        query
    }

    /// Enrich every row of `table` in place.
    ///
    /// Enrichment columns are appended when missing and overwritten when
    /// present. Row count and order never change.
    pub async fn enrich(&self, table: &mut CsvTable) -> LookupSummary {
        let columns: Vec<usize> = ENRICHMENT_COLUMNS
            .iter()
            .map(|name| table.ensure_column(name))
            .collect();
        let status_col = columns[8];

        let mut summary = LookupSummary::default();
        let mut pending = Vec::new();

        for row in 0..table.len() {
            if !self.refresh && !table.get(row, "magnets").trim().is_empty() {
                if table.get(row, "lookup_status").is_empty() {
                    table.set(row, status_col, LookupStatus::Skipped.as_str());
                }
                summary.record(LookupStatus::Skipped);
                metrics::ROWS_ENRICHED
                    .with_label_values(&[LookupStatus::Skipped.as_str()])
                    .inc();
                continue;
            }
            pending.push((row, self.row_query(table, row)));
        }

        info!(
            rows = table.len(),
            pending = pending.len(),
            skipped = summary.skipped,
            concurrency = self.concurrency,
            catalog = self.catalog.name(),
            "Starting catalog lookups"
        );

        for (row, outcome) in self.run_all(pending).await {
            for (col, value) in columns.iter().zip(outcome.cells()) {
                table.set(row, *col, value);
            }
            summary.record(outcome.status);
            metrics::ROWS_ENRICHED
                .with_label_values(&[outcome.status.as_str()])
                .inc();
        }

        info!(
            matched = summary.matched,
            no_match = summary.no_match,
            failed = summary.failed,
            skipped = summary.skipped,
            "Lookup complete"
        );

        summary
    }

    /// Run lookups, returning outcomes in row order.
    async fn run_all(&self, pending: Vec<(usize, CatalogQuery)>) -> Vec<(usize, LookupOutcome)> {
        if self.concurrency <= 1 {
            let mut outcomes = Vec::with_capacity(pending.len());
            for (row, query) in pending {
                outcomes.push((row, self.lookup(&query).await));
            }
            return outcomes;
        }

        let mut outcomes: Vec<(usize, LookupOutcome)> = stream::iter(pending)
            .map(|(row, query)| async move { (row, self.lookup(&query).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        outcomes.sort_by_key(|(row, _)| *row);
        outcomes
    }
}

/// Turn release-style separators into spaces and collapse whitespace.
fn normalize_title(title: &str) -> String {
    title
        .split(|c: char| c == '.' || c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use crate::testing::{fixtures, MockCatalog};

    fn table(rows: &[[&str; 3]]) -> CsvTable {
        let mut table = CsvTable::new(vec!["path".into(), "title".into(), "year".into()]);
        for row in rows {
            table.push_row(row.iter().map(|s| s.to_string()).collect());
        }
        table
    }

    fn pipeline(catalog: Arc<MockCatalog>) -> LookupPipeline {
        LookupPipeline::new(catalog).with_policy(RetryPolicy::no_retry().with_max_retries(2))
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Some.Movie_Name  2"), "Some Movie Name 2");
        assert_eq!(normalize_title("  "), "");
    }

    #[test]
    fn test_row_query_prefers_title_column() {
        let p = pipeline(Arc::new(MockCatalog::new()));
        let t = table(&[["/lib/x/y.mkv", "Heat", "1995"]]);
        assert_eq!(p.row_query(&t, 0), CatalogQuery::new("Heat", Some(1995)));
    }

    #[test]
    fn test_row_query_derives_title_from_path() {
        let p = pipeline(Arc::new(MockCatalog::new()));
        let t = table(&[["/lib/Some.Movie.2004.DVDRip.XviD", "", ""]]);
        assert_eq!(p.row_query(&t, 0), CatalogQuery::new("Some Movie", Some(2004)));
    }

    #[test]
    fn test_row_query_ignores_implausible_year() {
        let p = pipeline(Arc::new(MockCatalog::new()));
        let t = table(&[["/a", "Heat", "19"]]);
        assert_eq!(p.row_query(&t, 0).year, None);
    }

    #[tokio::test]
    async fn test_lookup_matched() {
        let mock = Arc::new(MockCatalog::new());
        mock.add_movie(fixtures::movie("Heat", 1995, &[("1080p", "bluray", "AAA")]))
            .await;

        let outcome = pipeline(mock.clone())
            .lookup(&CatalogQuery::new("Heat", Some(1995)))
            .await;
        assert_eq!(outcome.status, LookupStatus::Matched);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.movie.unwrap().year, 1995);
        assert_eq!(mock.recorded_queries().await[0].term(), "Heat 1995");
    }

    #[tokio::test]
    async fn test_lookup_no_match() {
        let mock = Arc::new(MockCatalog::new());
        let outcome = pipeline(mock)
            .lookup(&CatalogQuery::new("Nothing", None))
            .await;
        assert_eq!(outcome.status, LookupStatus::NoMatch);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_lookup_retries_then_fails() {
        let mock = Arc::new(MockCatalog::new());
        for _ in 0..3 {
            mock.push_error(CatalogError::Timeout("deadline".into())).await;
        }

        let outcome = pipeline(mock.clone())
            .lookup(&CatalogQuery::new("Heat", None))
            .await;
        assert_eq!(outcome.status, LookupStatus::Failed);
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.error.unwrap().contains("timed out"));
        assert_eq!(mock.search_count().await, 3);
    }

    #[tokio::test]
    async fn test_lookup_terminal_error_not_retried() {
        let mock = Arc::new(MockCatalog::new());
        mock.push_error(CatalogError::ParseError("bad".into())).await;

        let outcome = pipeline(mock.clone())
            .lookup(&CatalogQuery::new("Heat", None))
            .await;
        assert_eq!(outcome.status, LookupStatus::Failed);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(mock.search_count().await, 1);
    }

    #[tokio::test]
    async fn test_enrich_appends_columns_and_keeps_order() {
        let mock = Arc::new(MockCatalog::new());
        mock.add_movie(fixtures::movie("Heat", 1995, &[("1080p", "bluray", "AAA")]))
            .await;
        let mut t = table(&[
            ["/lib/Heat (1995)/heat.avi", "Heat", "1995"],
            ["/lib/Unknown/u.avi", "Unknown Film", ""],
        ]);

        let summary = pipeline(mock).enrich(&mut t).await;
        assert_eq!(summary.matched, 1);
        assert_eq!(summary.no_match, 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.headers().len(), 3 + ENRICHMENT_COLUMNS.len());
        assert_eq!(t.get(0, "path"), "/lib/Heat (1995)/heat.avi");
        assert_eq!(t.get(0, "lookup_status"), "matched");
        assert!(t.get(0, "magnets").starts_with("magnet:?xt=urn:btih:AAA"));
        assert_eq!(t.get(1, "lookup_status"), "no_match");
        assert_eq!(t.get(1, "magnets"), "");
    }

    #[tokio::test]
    async fn test_enrich_skips_rows_with_magnets() {
        let mock = Arc::new(MockCatalog::new());
        let mut t = table(&[["/a", "Heat", "1995"]]);
        let magnets = t.ensure_column("magnets");
        t.set(0, magnets, "magnet:?xt=urn:btih:OLD");

        let summary = pipeline(mock.clone()).enrich(&mut t).await;
        assert_eq!(summary.skipped, 1);
        assert_eq!(mock.search_count().await, 0);
        assert_eq!(t.get(0, "magnets"), "magnet:?xt=urn:btih:OLD");
        assert_eq!(t.get(0, "lookup_status"), "skipped");
        // existing column keeps its position
        assert_eq!(t.column("magnets"), Some(3));
    }

    #[tokio::test]
    async fn test_refresh_requeries_everything() {
        let mock = Arc::new(MockCatalog::new());
        let mut t = table(&[["/a", "Heat", "1995"]]);
        let magnets = t.ensure_column("magnets");
        t.set(0, magnets, "magnet:?xt=urn:btih:OLD");

        let summary = pipeline(mock.clone()).with_refresh(true).enrich(&mut t).await;
        assert_eq!(summary.no_match, 1);
        assert_eq!(mock.search_count().await, 1);
        assert_eq!(t.get(0, "magnets"), "");
    }

    #[tokio::test]
    async fn test_concurrent_enrich_restores_order() {
        let mock = Arc::new(MockCatalog::new());
        for (i, title) in ["A", "B", "C", "D", "E"].iter().enumerate() {
            mock.add_movie(fixtures::movie(title, 2000 + i as u16, &[("720p", "web", title)]))
                .await;
        }
        let mut t = table(&[
            ["/a", "A", "2000"],
            ["/b", "B", "2001"],
            ["/c", "C", "2002"],
            ["/d", "D", "2003"],
            ["/e", "E", "2004"],
        ]);

        let p = pipeline(mock).with_concurrency(3).with_rate_limit(6000);
        let summary = p.enrich(&mut t).await;
        assert_eq!(summary.matched, 5);
        for (row, title) in ["A", "B", "C", "D", "E"].iter().enumerate() {
            assert_eq!(t.get(row, "catalog_title"), *title);
        }
    }

    #[test]
    fn test_from_config_attaches_limiter_only_when_concurrent() {
        let mut config = LookupConfig::default();
        let p = LookupPipeline::from_config(Arc::new(MockCatalog::new()), &config);
        assert_eq!(p.concurrency(), 1);
        assert!(!p.is_rate_limited());

        config.concurrency = 4;
        let p = LookupPipeline::from_config(Arc::new(MockCatalog::new()), &config);
        assert_eq!(p.concurrency(), 4);
        assert!(p.is_rate_limited());
    }

    #[test]
    fn test_from_config_slow_after_out_of_range_disables_slow_retry() {
        let mut config = LookupConfig::default();
        let p = LookupPipeline::from_config(Arc::new(MockCatalog::new()), &config);
        assert_eq!(p.policy.slow_after, Some(Duration::from_secs(9)));

        for value in [0.0, -3.0, f64::INFINITY, f64::NAN, 1e300] {
            config.slow_after_secs = value;
            let p = LookupPipeline::from_config(Arc::new(MockCatalog::new()), &config);
            assert_eq!(p.policy.slow_after, None, "{value}");
        }
    }
}
