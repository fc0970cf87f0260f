use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use base64::Engine;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ArtConfig;

#[derive(Error, Debug)]
pub enum ArtError {
    #[error("Failed to fetch album art from '{0}'")]
    FetchFailed(String),
    #[error("HTTP request failed, {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to read cached album art at '{}', {source}", path.display())]
    CacheRead { path: PathBuf, source: std::io::Error },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Body(Vec<u8>),
    /// Server answered with a non-success status
    Status(u16),
}

pub trait ArtFetcher {
    async fn get(&self, url: &str) -> Result<Fetched, ArtError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ArtError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl ArtFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Fetched, ArtError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(Fetched::Status(status.as_u16()));
        }

        Ok(Fetched::Body(response.bytes().await?.to_vec()))
    }
}

/// Album art cache. Every file in the cache directory is named after the md5 of the art url and holds
/// the base64 encoded image, exactly what ends up in the `image=` property. Entries are
/// never invalidated.
#[derive(Debug)]
pub struct ArtCache<'a> {
    config: &'a ArtConfig,
}

impl<'a> ArtCache<'a> {
    pub fn new(config: &'a ArtConfig) -> Self {
        Self { config }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.config.cache_dir.join(format!("{:x}", md5::compute(url)))
    }

    pub async fn get_art_base64(
        &self,
        fetcher: &impl ArtFetcher,
        url: &str,
    ) -> Result<String, ArtError> {
        let path = self.path_for(url);
        match tokio::fs::read_to_string(&path).await {
            Ok(cached) => {
                debug!(url, path = %path.display(), "Album art cache hit");
                return Ok(cached);
            }
            // A cache directory that can not exist is a miss as well
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {}
            Err(source) => return Err(ArtError::CacheRead { path, source }),
        }

        let image = self.download(fetcher, url).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&image);

        if ensure_dir(&self.config.cache_dir).await {
            if let Err(err) = tokio::fs::write(&path, &encoded).await {
                warn!(err = ?err, path = %path.display(), "Failed to write album art to cache");
            }
        }

        Ok(encoded)
    }

    async fn download(&self, fetcher: &impl ArtFetcher, url: &str) -> Result<Vec<u8>, ArtError> {
        match fetcher.get(url).await {
            Ok(Fetched::Body(body)) => return Ok(body),
            Ok(Fetched::Status(status)) => {
                debug!(url, status, "Album art request failed, trying fallback host");
            }
            Err(err) => {
                debug!(url, err = ?err, "Album art request failed, trying fallback host");
            }
        }

        let Some(fallback) = self.fallback_url(url) else {
            return Err(ArtError::FetchFailed(url.to_owned()));
        };

        match fetcher.get(&fallback).await {
            Ok(Fetched::Body(body)) => Ok(body),
            Ok(Fetched::Status(status)) => {
                warn!(url, fallback = fallback.as_str(), status, "Album art fallback request failed");
                Err(ArtError::FetchFailed(url.to_owned()))
            }
            Err(err) => {
                warn!(url, fallback = fallback.as_str(), err = ?err, "Album art fallback request failed");
                Err(ArtError::FetchFailed(url.to_owned()))
            }
        }
    }

    /// `https://open.spotify.com/image/<id>` becomes `<fallback_url><id>`
    pub fn fallback_url(&self, url: &str) -> Option<String> {
        url.split('/')
            .nth(self.config.fallback_segment)
            .filter(|segment| !segment.is_empty())
            .map(|segment| format!("{}{segment}", self.config.fallback_url))
    }
}

/// `create_dir_all` can fail even though the directory is there, e.g. when another
/// invocation created it at the same time.
async fn ensure_dir(dir: &Path) -> bool {
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => true,
        Err(err) => {
            debug!(err = ?err, dir = %dir.display(), "Failed to create album art cache directory");
            tokio::fs::metadata(dir).await.is_ok_and(|meta| meta.is_dir())
        }
    }
}
