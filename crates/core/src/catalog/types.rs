//! Types for catalog queries and results.

use serde::{Deserialize, Serialize};

use crate::title::ParsedTitle;

/// What to search a catalog for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

impl CatalogQuery {
    pub fn new(title: impl Into<String>, year: Option<u16>) -> Self {
        Self {
            title: title.into(),
            year,
        }
    }

    /// Free-text term sent to the catalog: `"{title} {year}"` or just the title.
    pub fn term(&self) -> String {
        match self.year {
            Some(year) => format!("{} {}", self.title, year),
            None => self.title.clone(),
        }
    }
}

impl From<&ParsedTitle> for CatalogQuery {
    fn from(parsed: &ParsedTitle) -> Self {
        Self::new(parsed.query_term(), parsed.year())
    }
}

/// A movie returned by a catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMovie {
    pub id: u64,
    pub title: String,
    /// Release year, 0 if unknown.
    pub year: u16,
    pub rating: f32,
    pub imdb_code: String,
    pub url: String,
    pub formats: Vec<ReleaseFormat>,
}

impl CatalogMovie {
    /// Magnet links for every format with a known hash, in catalog order.
    pub fn magnets(&self) -> Vec<String> {
        self.formats
            .iter()
            .filter_map(|f| f.magnet(&self.title))
            .collect()
    }

    /// `quality.type` labels, sorted and de-duplicated.
    pub fn qualities(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.formats.iter().map(ReleaseFormat::label).collect();
        labels.sort();
        labels.dedup();
        labels
    }
}

/// One downloadable format of a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseFormat {
    /// e.g. "720p", "1080p", "2160p", "3D".
    pub quality: String,
    /// e.g. "bluray", "web".
    pub release_type: String,
    /// Human-readable size as reported.
    pub size: String,
    pub size_bytes: u64,
    pub seeds: u32,
    pub peers: u32,
    /// BitTorrent info hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl ReleaseFormat {
    pub fn label(&self) -> String {
        format!("{}.{}", self.quality, self.release_type)
    }

    /// `magnet:?xt=urn:btih:{hash}&dn={title.quality.type}`; `None` without a hash.
    pub fn magnet(&self, title: &str) -> Option<String> {
        let hash = self.hash.as_deref().filter(|h| !h.is_empty())?;
        let name = format!("{}.{}.{}", title, self.quality, self.release_type);
        Some(format!(
            "magnet:?xt=urn:btih:{}&dn={}",
            hash,
            urlencoding::encode(&name)
        ))
    }
}

/// Prefer the first movie whose year matches, else the first movie.
pub fn best_match(movies: &[CatalogMovie], year: Option<u16>) -> Option<&CatalogMovie> {
    year.and_then(|y| movies.iter().find(|m| m.year == y))
        .or_else(|| movies.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(quality: &str, kind: &str, hash: Option<&str>) -> ReleaseFormat {
        ReleaseFormat {
            quality: quality.to_string(),
            release_type: kind.to_string(),
            size: "1.7 GB".to_string(),
            size_bytes: 0,
            seeds: 10,
            peers: 2,
            hash: hash.map(String::from),
        }
    }

    fn movie(id: u64, year: u16) -> CatalogMovie {
        CatalogMovie {
            id,
            title: "Heat".to_string(),
            year,
            rating: 8.3,
            imdb_code: "tt0113277".to_string(),
            url: format!("https://yts.mx/movies/heat-{}", year),
            formats: vec![],
        }
    }

    #[test]
    fn test_query_term() {
        assert_eq!(CatalogQuery::new("Heat", Some(1995)).term(), "Heat 1995");
        assert_eq!(CatalogQuery::new("Heat", None).term(), "Heat");
    }

    #[test]
    fn test_magnet_format() {
        let f = format("1080p", "bluray", Some("ABCDEF"));
        assert_eq!(
            f.magnet("Heat").unwrap(),
            "magnet:?xt=urn:btih:ABCDEF&dn=Heat.1080p.bluray"
        );

        let f = format("720p", "web", Some("123"));
        assert_eq!(
            f.magnet("The Thing").unwrap(),
            "magnet:?xt=urn:btih:123&dn=The%20Thing.720p.web"
        );
    }

    #[test]
    fn test_magnet_requires_hash() {
        assert!(format("720p", "web", None).magnet("Heat").is_none());
        assert!(format("720p", "web", Some("")).magnet("Heat").is_none());
    }

    #[test]
    fn test_movie_qualities_and_magnets() {
        let mut m = movie(1, 1995);
        m.formats = vec![
            format("1080p", "bluray", Some("B")),
            format("720p", "bluray", None),
            format("1080p", "bluray", Some("C")),
        ];
        assert_eq!(m.qualities(), vec!["1080p.bluray", "720p.bluray"]);
        assert_eq!(m.magnets().len(), 2);
    }

    #[test]
    fn test_best_match_prefers_year() {
        let movies = vec![movie(1, 2020), movie(2, 1995), movie(3, 1995)];
        assert_eq!(best_match(&movies, Some(1995)).unwrap().id, 2);
        assert_eq!(best_match(&movies, Some(1980)).unwrap().id, 1);
        assert_eq!(best_match(&movies, None).unwrap().id, 1);
        assert!(best_match(&[], Some(1995)).is_none());
    }
}
