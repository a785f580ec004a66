//! Immutable classification rules.
//!
//! Built once from [`ScanConfig`]; every `with_*` override consumes the
//! value and returns a new one with that set replaced wholesale.

use std::collections::HashSet;

use crate::config::{JunkMatch, Precedence, ScanConfig};
use crate::title::YearRange;

const MIB: u64 = 1024 * 1024;

/// Normalized scanner rules.
#[derive(Debug, Clone)]
pub struct ScanRules {
    tiny_mib: u64,
    good_tokens: Vec<String>,
    low_quality_tokens: Vec<String>,
    video_extensions: HashSet<String>,
    subtitle_extensions: HashSet<String>,
    junk_dirs: Vec<String>,
    junk_match: JunkMatch,
    skip_hidden: bool,
    follow_symlinks: bool,
    precedence: Precedence,
    skip_accessory_leaves: bool,
    years: YearRange,
}

impl ScanRules {
    pub fn from_config(config: &ScanConfig) -> Self {
        let years = match config.max_year {
            Some(max) => YearRange::new(config.min_year, max),
            None => YearRange::up_to_next_year(config.min_year),
        };

        Self {
            tiny_mib: config.tiny_mib,
            good_tokens: normalize_tokens(&config.good_tokens),
            low_quality_tokens: normalize_tokens(&config.low_quality_tokens),
            video_extensions: normalize_extensions(&config.video_extensions),
            subtitle_extensions: normalize_extensions(&config.subtitle_extensions),
            junk_dirs: normalize_tokens(&config.junk_dirs),
            junk_match: config.junk_match,
            skip_hidden: config.skip_hidden,
            follow_symlinks: config.follow_symlinks,
            precedence: config.precedence,
            skip_accessory_leaves: config.skip_accessory_leaves,
            years,
        }
    }

    // Overrides

    pub fn with_tiny_mib(mut self, mib: u64) -> Self {
        self.tiny_mib = mib;
        self
    }

    pub fn with_good_tokens<S: AsRef<str>>(mut self, tokens: &[S]) -> Self {
        self.good_tokens = normalize_tokens(tokens);
        self
    }

    pub fn with_low_quality_tokens<S: AsRef<str>>(mut self, tokens: &[S]) -> Self {
        self.low_quality_tokens = normalize_tokens(tokens);
        self
    }

    pub fn with_video_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.video_extensions = normalize_extensions(extensions);
        self
    }

    pub fn with_subtitle_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.subtitle_extensions = normalize_extensions(extensions);
        self
    }

    pub fn with_junk_dirs<S: AsRef<str>>(mut self, dirs: &[S]) -> Self {
        self.junk_dirs = normalize_tokens(dirs);
        self
    }

    pub fn with_precedence(mut self, precedence: Precedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_skip_accessory_leaves(mut self, skip: bool) -> Self {
        self.skip_accessory_leaves = skip;
        self
    }

    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    // Accessors

    pub fn tiny_mib(&self) -> u64 {
        self.tiny_mib
    }

    pub fn tiny_bytes(&self) -> u64 {
        self.tiny_mib.saturating_mul(MIB)
    }

    pub fn precedence(&self) -> Precedence {
        self.precedence
    }

    pub fn follow_symlinks(&self) -> bool {
        self.follow_symlinks
    }

    pub fn skip_accessory_leaves(&self) -> bool {
        self.skip_accessory_leaves
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn good_tokens(&self) -> &[String] {
        &self.good_tokens
    }

    pub fn low_quality_tokens(&self) -> &[String] {
        &self.low_quality_tokens
    }

    // Predicates

    pub fn is_video(&self, extension: &str) -> bool {
        self.video_extensions.contains(&extension.to_lowercase())
    }

    pub fn is_subtitle(&self, extension: &str) -> bool {
        self.subtitle_extensions.contains(&extension.to_lowercase())
    }

    /// Whether a directory with this name should be pruned from the walk.
    pub fn is_pruned_dir(&self, name: &str) -> bool {
        if self.skip_hidden && name.starts_with('.') {
            return true;
        }
        let lower = name.trim().to_lowercase();
        match self.junk_match {
            JunkMatch::Exact => self.junk_dirs.iter().any(|j| *j == lower),
            JunkMatch::Substring => self.junk_dirs.iter().any(|j| lower.contains(j.as_str())),
        }
    }

    /// Good tokens found in any of the given names.
    pub fn matched_good_tokens(&self, names: &[&str]) -> Vec<String> {
        matched_tokens(&self.good_tokens, names)
    }

    /// Low-quality tokens found in any of the given names.
    pub fn matched_low_quality_tokens(&self, names: &[&str]) -> Vec<String> {
        matched_tokens(&self.low_quality_tokens, names)
    }
}

impl Default for ScanRules {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

/// Case-insensitive substring matches, sorted and de-duplicated.
fn matched_tokens(tokens: &[String], names: &[&str]) -> Vec<String> {
    let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    let mut found: Vec<String> = tokens
        .iter()
        .filter(|t| lowered.iter().any(|n| n.contains(t.as_str())))
        .cloned()
        .collect();
    found.sort();
    found.dedup();
    found
}

fn normalize_tokens<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> HashSet<String> {
    extensions
        .iter()
        .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
