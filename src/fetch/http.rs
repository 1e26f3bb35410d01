use super::{write_body, Fetch, FetchError};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP downloader. One GET per call, no retries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .context("building HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<PathBuf, FetchError> {
        debug!(%url, dest = %dest.display(), "downloading");
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url.as_str()).send().map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Unavailable {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp.bytes().map_err(transport)?;
        let path = write_body(dest, &bytes)?;
        debug!(%url, bytes = bytes.len(), "downloaded");
        Ok(path)
    }
}
