//! Testing utilities and mock implementations.
//!
//! [`MockCatalog`] stands in for the YTS client so the lookup pipeline can
//! be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use media_hygiene_core::testing::{fixtures, MockCatalog};
//!
//! let catalog = MockCatalog::new();
//! catalog.add_movie(fixtures::movie("Heat", 1995, &[("1080p", "bluray", "AAA")])).await;
//! catalog.push_error(CatalogError::Timeout("slow".into())).await;
//! ```

mod mock_catalog;

pub use mock_catalog::MockCatalog;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::fs;
    use std::path::Path;

    use crate::catalog::{CatalogMovie, ReleaseFormat};

    const MIB: u64 = 1024 * 1024;

    /// Create a catalog movie with one format per `(quality, type, hash)`.
    pub fn movie(title: &str, year: u16, formats: &[(&str, &str, &str)]) -> CatalogMovie {
        CatalogMovie {
            id: u64::from(year) * 1000 + title.len() as u64,
            title: title.to_string(),
            year,
            rating: 7.5,
            imdb_code: format!("tt{:07}", u64::from(year) * 10 + title.len() as u64),
            url: format!(
                "https://yts.mx/movies/{}-{}",
                title.to_lowercase().replace(' ', "-"),
                year
            ),
            formats: formats
                .iter()
                .map(|(quality, kind, hash)| release_format(quality, kind, hash))
                .collect(),
        }
    }

    /// Create a release format with reasonable defaults.
    pub fn release_format(quality: &str, kind: &str, hash: &str) -> ReleaseFormat {
        ReleaseFormat {
            quality: quality.to_string(),
            release_type: kind.to_string(),
            size: "1.5 GB".to_string(),
            size_bytes: 1536 * MIB,
            seeds: 40,
            peers: 4,
            hash: (!hash.is_empty()).then(|| hash.to_string()),
        }
    }

    /// Create a sparse file of `size_mib` MiB under `root`, with parents.
    pub fn video_file(root: &Path, relative: &str, size_mib: u64) {
        sized_file(root, relative, size_mib * MIB);
    }

    /// Create a sparse file of exactly `size` bytes under `root`, with parents.
    pub fn sized_file(root: &Path, relative: &str, size: u64) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let file = fs::File::create(&path).unwrap();
        file.set_len(size).unwrap();
    }

    /// Create an empty directory under `root`.
    pub fn dir(root: &Path, relative: &str) {
        fs::create_dir_all(root.join(relative)).unwrap();
    }
}
