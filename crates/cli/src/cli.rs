use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use media_hygiene_core::config::Precedence;
use media_hygiene_core::Config;

/// Find low-quality and lost movies in a library and look up replacements.
#[derive(Debug, Parser)]
#[command(name = "media-hygiene", version, about)]
pub struct Cli {
    /// TOML configuration file (falls back to $MEDIA_HYGIENE_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log every lookup attempt and debug output from the workspace crates
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Write Prometheus metrics in text format to this file on exit
    #[arg(long, global = true, value_name = "FILE")]
    pub metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a library root and write the low-quality and lost CSV reports
    Scan(ScanArgs),
    /// Enrich a report CSV with catalog matches and magnet links
    Lookup(LookupArgs),
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Root directory of the movie library
    #[arg(long, value_name = "DIR")]
    pub root: PathBuf,

    /// Directory for the CSV reports
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Files below this many MiB are flagged
    #[arg(long, value_name = "N")]
    pub tiny_mib: Option<u64>,

    /// Tokens that clear a file of low-quality flags
    #[arg(long, value_delimiter = ',', value_name = "a,b")]
    pub good_tokens: Option<Vec<String>>,

    /// Tokens that mark a low-quality encode
    #[arg(long = "lowq-tokens", value_delimiter = ',', value_name = "a,b")]
    pub low_quality_tokens: Option<Vec<String>>,

    #[arg(long, value_delimiter = ',', value_name = "a,b")]
    pub video_exts: Option<Vec<String>>,

    #[arg(long, value_delimiter = ',', value_name = "a,b")]
    pub subtitle_exts: Option<Vec<String>>,

    /// Directory names never descended into (replaces the built-in list;
    /// an empty value keeps it)
    #[arg(long, value_delimiter = ',', value_name = "a,b")]
    pub ignore_dirs: Option<Vec<String>>,

    /// A good token only cancels the size flag
    #[arg(long)]
    pub strict_lowq: bool,

    /// Skip lost leaves below a folder that already holds a movie
    #[arg(long)]
    pub skip_accessory_leaves: bool,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// Report CSV to enrich
    #[arg(long, value_name = "FILE")]
    pub from_csv: PathBuf,

    /// Output CSV (defaults to rewriting the input in place)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Retries per query after the first attempt
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Parallel lookups
    #[arg(long, value_name = "N", conflicts_with = "sequential")]
    pub concurrency: Option<usize>,

    /// Look up one row at a time
    #[arg(long)]
    pub sequential: bool,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Retry a successful response slower than this many seconds
    #[arg(long, value_name = "SECS")]
    pub slow_after: Option<f64>,

    /// Re-query rows that already have magnets
    #[arg(long)]
    pub refresh: bool,
}

impl ScanArgs {
    /// Apply flags on top of the loaded configuration. Lists replace the
    /// configured list wholesale.
    pub fn apply(&self, config: &mut Config) {
        let scan = &mut config.scan;
        if let Some(mib) = self.tiny_mib {
            scan.tiny_mib = mib;
        }
        if let Some(tokens) = list(&self.good_tokens) {
            scan.good_tokens = tokens;
        }
        if let Some(tokens) = list(&self.low_quality_tokens) {
            scan.low_quality_tokens = tokens;
        }
        if let Some(exts) = list(&self.video_exts) {
            scan.video_extensions = exts;
        }
        if let Some(exts) = list(&self.subtitle_exts) {
            scan.subtitle_extensions = exts;
        }
        if let Some(dirs) = list(&self.ignore_dirs).filter(|dirs| !dirs.is_empty()) {
            scan.junk_dirs = dirs;
        }
        if self.strict_lowq {
            scan.precedence = Precedence::StrictLowQuality;
        }
        if self.skip_accessory_leaves {
            scan.skip_accessory_leaves = true;
        }
        if let Some(dir) = &self.out_dir {
            config.output.dir = dir.clone();
        }
    }
}

impl LookupArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(retries) = self.retries {
            config.lookup.retry.max_retries = retries;
        }
        if self.sequential {
            config.lookup.concurrency = 1;
        } else if let Some(concurrency) = self.concurrency {
            config.lookup.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.catalog.timeout_secs = timeout;
        }
        if let Some(slow_after) = self.slow_after {
            config.lookup.slow_after_secs = slow_after;
        }
        if self.refresh {
            config.lookup.refresh = true;
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| self.from_csv.clone())
    }
}

/// Trimmed, non-empty entries of a comma-separated flag.
fn list(values: &Option<Vec<String>>) -> Option<Vec<String>> {
    values.as_ref().map(|values| {
        values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("media-hygiene").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_scan_flags_replace_lists() {
        let cli = parse(&[
            "scan",
            "--root",
            "/movies",
            "--good-tokens",
            "1080p, 2160p",
            "--ignore-dirs",
            "extras",
            "--tiny-mib",
            "500",
            "--strict-lowq",
        ]);
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };

        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.scan.good_tokens, vec!["1080p", "2160p"]);
        assert_eq!(config.scan.junk_dirs, vec!["extras"]);
        assert_eq!(config.scan.tiny_mib, 500);
        assert_eq!(config.scan.precedence, Precedence::StrictLowQuality);
        assert_eq!(
            config.scan.video_extensions,
            Config::default().scan.video_extensions
        );
    }

    #[test]
    fn test_empty_ignore_dirs_keeps_configured_set() {
        let cli = parse(&["scan", "--root", "/m", "--ignore-dirs", ""]);
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.scan.junk_dirs, Config::default().scan.junk_dirs);
    }

    #[test]
    fn test_scan_out_dir_overrides_output() {
        let cli = parse(&["scan", "--root", "/m", "--out-dir", "/tmp/reports"]);
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.output.dir, PathBuf::from("/tmp/reports"));
    }

    #[test]
    fn test_lookup_defaults_to_in_place() {
        let cli = parse(&["lookup", "--from-csv", "low.csv"]);
        let Command::Lookup(args) = cli.command else {
            panic!("expected lookup");
        };
        assert_eq!(args.output_path(), PathBuf::from("low.csv"));

        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.lookup.concurrency, 1);
        assert!(!config.lookup.refresh);
    }

    #[test]
    fn test_lookup_overrides() {
        let cli = parse(&[
            "--verbose",
            "lookup",
            "--from-csv",
            "lost.csv",
            "--output",
            "out.csv",
            "--retries",
            "5",
            "--concurrency",
            "4",
            "--timeout",
            "3",
            "--slow-after",
            "1.5",
            "--refresh",
        ]);
        assert!(cli.verbose);
        let Command::Lookup(args) = cli.command else {
            panic!("expected lookup");
        };
        assert_eq!(args.output_path(), PathBuf::from("out.csv"));

        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.lookup.retry.max_retries, 5);
        assert_eq!(config.lookup.concurrency, 4);
        assert_eq!(config.catalog.timeout_secs, 3);
        assert_eq!(config.lookup.slow_after_secs, 1.5);
        assert!(config.lookup.refresh);
    }

    #[test]
    fn test_sequential_conflicts_with_concurrency() {
        let result = Cli::try_parse_from([
            "media-hygiene",
            "lookup",
            "--from-csv",
            "a.csv",
            "--sequential",
            "--concurrency",
            "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sequential_forces_one() {
        let cli = parse(&["lookup", "--from-csv", "a.csv", "--sequential"]);
        let Command::Lookup(args) = cli.command else {
            panic!("expected lookup");
        };
        let mut config = Config::default();
        config.lookup.concurrency = 8;
        args.apply(&mut config);
        assert_eq!(config.lookup.concurrency, 1);
    }

    #[test]
    fn test_root_is_required() {
        assert!(Cli::try_parse_from(["media-hygiene", "scan"]).is_err());
    }
}
