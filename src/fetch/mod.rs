// src/fetch/mod.rs

use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub mod http;

pub use http::HttpFetcher;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The host answered with a non-success status.
    #[error("{url} answered HTTP {status}")]
    Unavailable { url: String, status: u16 },

    #[error("GET {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("writing {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchError::Unavailable { .. })
    }
}

/// Single-attempt download of `url` to `dest`. Returns the written path.
pub trait Fetch {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<PathBuf, FetchError>;
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<PathBuf, FetchError> {
        (**self).fetch(url, dest)
    }
}

/// Write downloaded bytes, creating the parent directory if needed.
pub(crate) fn write_body(dest: &Path, body: &[u8]) -> Result<PathBuf, FetchError> {
    let io_err = |source| FetchError::Io {
        path: dest.to_path_buf(),
        source,
    };
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(dest, body).map_err(io_err)?;
    Ok(dest.to_path_buf())
}
