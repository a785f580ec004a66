//! Title and year extraction from library folder and file names.
//!
//! Two strategies, tried in order:
//! 1. Structured: `Title (YYYY)` on the folder name, then on the file stem.
//! 2. Fallback: strip quality/source tokens, sizes, release groups and
//!    punctuation to get a free-text search term.
//!
//! Parsing never fails; the fallback always yields a non-empty term.

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex_lite::Regex;

static STRUCTURED_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<title>.+?)\s*\((?P<year>\d{4})\)").unwrap());

static SEPARATORS_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[._]+").unwrap());

static BRACKETS_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)|\{[^}]*\}").unwrap());

static YEAR_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

static SIZE_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d+(?:[.,]\d+)?\s*(?:MB|MiB|GB|GiB)\b").unwrap());

static QUALITY_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:",
        r"480p|576p|720p|1024p|1080p|1440p|2160p|4k|uhd|hdr10|hdr|dolby vision|",
        r"x264|x265|xvid|divx|h ?26[45]|avc|hevc|",
        r"dvdrip|dvdscr|brrip|bdrip|blu-?ray|web-?dl|web dl|web-?rip|hdrip|tvrip|pdtv|sdtv|",
        r"r5|cams?|hdcam|ts|tc|telesync|telecine|",
        r"proper|repack|extended|limited|uncut|remux|",
        r"dts-?hd|dts|truehd|atmos|aac|ac-?3|eac3|mp3|",
        r"multi|subs?|subtitles|dubbed|eng|ita|spa|fre|ger|deu|rus|hin",
        r")\b"
    ))
    .unwrap()
});

static TRAILING_GROUP_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+[-–—]\s*[A-Za-z0-9][A-Za-z0-9-]*$").unwrap());

static SPACES_RX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Inclusive range of plausible release years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub min: u16,
    pub max: u16,
}

impl YearRange {
    pub fn new(min: u16, max: u16) -> Self {
        Self { min, max }
    }

    /// `min` through next calendar year.
    pub fn up_to_next_year(min: u16) -> Self {
        let next = chrono::Utc::now().year() + 1;
        Self {
            min,
            max: u16::try_from(next).unwrap_or(u16::MAX),
        }
    }

    pub fn contains(&self, year: u16) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::up_to_next_year(1888)
    }
}

/// Which strategy produced a title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleMatch {
    /// `Title (YYYY)` matched.
    Structured { title: String, year: u16 },
    /// Normalized free text, with a year if one could be found.
    Fallback { term: String, year: Option<u16> },
}

/// Parsed title with search helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle(pub TitleMatch);

impl ParsedTitle {
    pub fn title(&self) -> &str {
        match &self.0 {
            TitleMatch::Structured { title, .. } => title,
            TitleMatch::Fallback { term, .. } => term,
        }
    }

    pub fn year(&self) -> Option<u16> {
        match &self.0 {
            TitleMatch::Structured { year, .. } => Some(*year),
            TitleMatch::Fallback { year, .. } => *year,
        }
    }

    /// Free-text search term (title only, no year).
    pub fn query_term(&self) -> &str {
        self.title()
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.0, TitleMatch::Structured { .. })
    }
}

/// Derive a title from a folder name and, optionally, a file stem inside it.
pub fn parse_title(folder: &str, file_stem: Option<&str>, years: YearRange) -> ParsedTitle {
    if let Some(m) = structured_match(folder, years) {
        return ParsedTitle(m);
    }
    if let Some(m) = file_stem.and_then(|stem| structured_match(stem, years)) {
        return ParsedTitle(m);
    }

    let (folder_title, folder_year) = clean_title_and_year(folder, years);
    let (stem_title, stem_year) = file_stem
        .map(|stem| clean_title_and_year(stem, years))
        .unwrap_or_default();

    let term = [folder_title, stem_title]
        .into_iter()
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| raw_term(folder, file_stem));

    ParsedTitle(TitleMatch::Fallback {
        term,
        year: folder_year.or(stem_year),
    })
}

/// Derive a title from a path: a file uses its parent folder and its stem,
/// a directory uses its own name.
pub fn parse_path_title(path: &std::path::Path, is_dir: bool, years: YearRange) -> ParsedTitle {
    let name_of = |p: &std::path::Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };

    if is_dir {
        return parse_title(&name_of(path), None, years);
    }

    let folder = path.parent().map(name_of).unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_title(&folder, Some(&stem), years)
}

fn structured_match(name: &str, years: YearRange) -> Option<TitleMatch> {
    let caps = STRUCTURED_RX.captures(name)?;
    let year: u16 = caps.name("year")?.as_str().parse().ok()?;
    if !years.contains(year) {
        return None;
    }
    let title = normalize_separators(caps.name("title")?.as_str());
    if title.is_empty() {
        return None;
    }
    Some(TitleMatch::Structured { title, year })
}

/// Strip release noise from a name, returning the cleaned title and any year.
///
/// The year is taken only when it is not the first word, so titles such
/// as "2001 A Space Odyssey" or "1917" keep their number.
pub fn clean_title_and_year(text: &str, years: YearRange) -> (String, Option<u16>) {
    let s = SIZE_RX.replace_all(text, " ");
    let s = SEPARATORS_RX.replace_all(&s, " ");
    let s = BRACKETS_RX.replace_all(&s, " ").into_owned();

    let token_idx = QUALITY_RX.find(&s).map(|m| m.start());
    let year_match = YEAR_RX
        .find_iter(&s)
        .filter(|m| !s[..m.start()].trim().is_empty())
        .find_map(|m| {
            m.as_str()
                .parse::<u16>()
                .ok()
                .filter(|y| years.contains(*y))
                .map(|y| (m.start(), y))
        });

    let cut = [token_idx, year_match.map(|(idx, _)| idx)]
        .into_iter()
        .flatten()
        .min();
    let head = match cut {
        Some(idx) => &s[..idx],
        None => s.as_str(),
    };

    let head = QUALITY_RX.replace_all(head, " ");
    let head = TRAILING_GROUP_RX.replace_all(&head, " ");
    let title = strip_punctuation(&head);

    (title, year_match.map(|(_, y)| y))
}

fn normalize_separators(s: &str) -> String {
    let s = SEPARATORS_RX.replace_all(s, " ");
    SPACES_RX
        .replace_all(&s, " ")
        .trim_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string()
}

fn strip_punctuation(s: &str) -> String {
    let kept: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || c == '\'' || c == '&' {
                c
            } else {
                ' '
            }
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn raw_term(folder: &str, file_stem: Option<&str>) -> String {
    [Some(folder), file_stem]
        .into_iter()
        .flatten()
        .map(normalize_separators)
        .find(|t| !t.is_empty())
        .unwrap_or_else(|| "untitled".to_string())
}
