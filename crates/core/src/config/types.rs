use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Library scan configuration.
///
/// Every list here is a complete set: a value supplied by a config file,
/// the environment or a CLI flag replaces the default list, it is never
/// merged with it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Files smaller than this many MiB are flagged as low quality.
    #[serde(default = "default_tiny_mib")]
    pub tiny_mib: u64,
    /// Tokens that mark a release as acceptable quality.
    #[serde(default = "default_good_tokens")]
    pub good_tokens: Vec<String>,
    /// Tokens that mark a known poor-quality encode.
    #[serde(default = "default_low_quality_tokens")]
    pub low_quality_tokens: Vec<String>,
    /// Extensions (no dot) treated as video files.
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
    /// Extensions (no dot) treated as subtitles.
    #[serde(default = "default_subtitle_extensions")]
    pub subtitle_extensions: Vec<String>,
    /// Directory names never descended into.
    #[serde(default = "default_junk_dirs")]
    pub junk_dirs: Vec<String>,
    /// How directory names are compared against `junk_dirs`.
    #[serde(default)]
    pub junk_match: JunkMatch,
    /// Prune dot-prefixed directories.
    #[serde(default = "default_true")]
    pub skip_hidden: bool,
    /// Traverse symlinked directories.
    #[serde(default = "default_true")]
    pub follow_symlinks: bool,
    /// Good/low-quality token precedence.
    #[serde(default)]
    pub precedence: Precedence,
    /// Do not report lost leaves sitting below a folder that holds a movie.
    #[serde(default)]
    pub skip_accessory_leaves: bool,
    /// Earliest plausible release year.
    #[serde(default = "default_min_year")]
    pub min_year: u16,
    /// Latest plausible release year (default: current year + 1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_year: Option<u16>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tiny_mib: default_tiny_mib(),
            good_tokens: default_good_tokens(),
            low_quality_tokens: default_low_quality_tokens(),
            video_extensions: default_video_extensions(),
            subtitle_extensions: default_subtitle_extensions(),
            junk_dirs: default_junk_dirs(),
            junk_match: JunkMatch::default(),
            skip_hidden: true,
            follow_symlinks: true,
            precedence: Precedence::default(),
            skip_accessory_leaves: false,
            min_year: default_min_year(),
            max_year: None,
        }
    }
}

/// Junk directory comparison mode (always case-insensitive).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JunkMatch {
    /// Directory name equals a junk entry.
    #[default]
    Exact,
    /// Directory name contains a junk entry.
    Substring,
}

/// How good tokens interact with low-quality flags.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    /// A good token suppresses both size and token flags.
    #[default]
    GoodTokenWins,
    /// A good token suppresses only the size flag.
    StrictLowQuality,
}

fn default_true() -> bool {
    true
}

fn default_tiny_mib() -> u64 {
    700
}

fn default_min_year() -> u16 {
    1888
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_good_tokens() -> Vec<String> {
    strings(&["720p", "1024p", "1080p", "1440p", "2160p", "4K", "UHD", "REMUX"])
}

fn default_low_quality_tokens() -> Vec<String> {
    strings(&[
        "DivX", "XviD", "CAM", "TS", "TC", "DVDScr", "DVDRip", "R5", "360p", "480p", "HDCAM",
        "SDTV", "PDTV",
    ])
}

fn default_video_extensions() -> Vec<String> {
    strings(&[
        "mkv", "mp4", "avi", "m4v", "mov", "wmv", "mpg", "mpeg", "ts", "m2ts", "vob", "iso",
    ])
}

fn default_subtitle_extensions() -> Vec<String> {
    strings(&["srt", "sub", "idx", "ass", "ssa", "vtt"])
}

fn default_junk_dirs() -> Vec<String> {
    strings(&[
        // system metadata
        ".appledouble",
        ".ds_store",
        "@eadir",
        "recycle.bin",
        "lost+found",
        ".git",
        // accessory media folders
        "subs",
        "subtitles",
        "extras",
        "featurettes",
        "trailers",
        "art",
        "artwork",
        "posters",
        "covers",
        "metadata",
        "plex versions",
        ".actors",
        "other",
        // sample content
        "sample",
        "samples",
    ])
}

/// Release catalog (YTS) client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// API base URL (e.g., "https://yts.mx/api/v2")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 12)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum movies requested per query (default: 10)
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            limit: default_limit(),
        }
    }
}

fn default_base_url() -> String {
    "https://yts.mx/api/v2".to_string()
}

fn default_timeout() -> u64 {
    12
}

fn default_limit() -> u32 {
    10
}

/// Lookup pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupConfig {
    /// Parallel lookups; 1 means strictly sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Shared request budget when running concurrently.
    #[serde(default = "default_rpm")]
    pub requests_per_minute: u32,
    /// A successful response slower than this is retried while attempts remain.
    #[serde(default = "default_slow_after")]
    pub slow_after_secs: f64,
    /// Re-query rows that already carry magnets.
    #[serde(default)]
    pub refresh: bool,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            requests_per_minute: default_rpm(),
            slow_after_secs: default_slow_after(),
            refresh: false,
            retry: RetryConfig::default(),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

fn default_rpm() -> u32 {
    60
}

fn default_slow_after() -> f64 {
    9.0
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Random extra delay, as a fraction of the computed delay (0.0 - 1.0).
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    750
}

fn default_max_delay() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.25
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_retry_delay(),
            max_delay_ms: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
        }
    }
}

/// Report output locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_low_quality_file")]
    pub low_quality_file: String,
    #[serde(default = "default_lost_file")]
    pub lost_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            low_quality_file: default_low_quality_file(),
            lost_file: default_lost_file(),
        }
    }
}

impl OutputConfig {
    pub fn low_quality_path(&self) -> PathBuf {
        self.dir.join(&self.low_quality_file)
    }

    pub fn lost_path(&self) -> PathBuf {
        self.dir.join(&self.lost_file)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_low_quality_file() -> String {
    "low_quality_movies.csv".to_string()
}

fn default_lost_file() -> String {
    "lost_movies.csv".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.scan.tiny_mib, 700);
        assert_eq!(config.scan.precedence, Precedence::GoodTokenWins);
        assert_eq!(config.scan.junk_match, JunkMatch::Exact);
        assert!(config.scan.skip_hidden);
        assert_eq!(config.catalog.base_url, "https://yts.mx/api/v2");
        assert_eq!(config.catalog.timeout_secs, 12);
        assert_eq!(config.lookup.concurrency, 1);
        assert_eq!(config.lookup.retry.max_retries, 3);
        assert_eq!(config.output.dir, PathBuf::from("data"));
    }

    #[test]
    fn test_token_list_replaces_default() {
        let toml = r#"
[scan]
good_tokens = ["BluRay"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scan.good_tokens, vec!["BluRay"]);
        // Untouched lists keep their defaults
        assert!(config.scan.low_quality_tokens.contains(&"XviD".to_string()));
    }

    #[test]
    fn test_deserialize_precedence_and_junk_match() {
        let toml = r#"
[scan]
precedence = "strict_low_quality"
junk_match = "substring"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scan.precedence, Precedence::StrictLowQuality);
        assert_eq!(config.scan.junk_match, JunkMatch::Substring);
    }

    #[test]
    fn test_deserialize_retry_section() {
        let toml = r#"
[lookup]
concurrency = 4

[lookup.retry]
max_retries = 5
jitter = 0.0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.lookup.concurrency, 4);
        assert_eq!(config.lookup.retry.max_retries, 5);
        assert_eq!(config.lookup.retry.jitter, 0.0);
        assert_eq!(config.lookup.retry.initial_delay_ms, 750); // default
    }

    #[test]
    fn test_output_paths() {
        let output = OutputConfig {
            dir: PathBuf::from("/reports"),
            ..OutputConfig::default()
        };
        assert_eq!(
            output.low_quality_path(),
            PathBuf::from("/reports/low_quality_movies.csv")
        );
        assert_eq!(output.lost_path(), PathBuf::from("/reports/lost_movies.csv"));
    }
}
