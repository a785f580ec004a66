pub mod catalog;
pub mod config;
pub mod lookup;
pub mod metrics;
pub mod report;
pub mod retry;
pub mod scanner;
pub mod testing;
pub mod title;

pub use catalog::{CatalogError, CatalogMovie, CatalogQuery, ReleaseCatalog, YtsClient};
pub use config::{
    load_config, load_config_from_str, load_layered_config, validate_config, Config, ConfigError,
};
pub use lookup::{LookupPipeline, LookupStatus, LookupSummary};
pub use report::{CsvTable, ReportError};
pub use retry::{AttemptObserver, AttemptOutcome, RetryPolicy, TracingObserver};
pub use scanner::{scan_library, ScanError, ScanReport, ScanRules};
pub use title::{parse_title, ParsedTitle, TitleMatch, YearRange};
