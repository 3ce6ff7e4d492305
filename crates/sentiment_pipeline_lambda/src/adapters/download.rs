//! Remote dataset download seam.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use crate::error::StageError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches a remote URL into a local scratch file.
pub trait Downloader {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), StageError>;
}

/// Blocking HTTP downloader that streams the response body to disk.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for HttpDownloader {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), StageError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|error| {
                StageError::Transfer(format!("failed to download '{url}': {error}"))
            })?;

        let mut file = File::create(destination).map_err(|error| {
            StageError::Transfer(format!(
                "failed to create '{}': {error}",
                destination.display()
            ))
        })?;
        response.copy_to(&mut file).map_err(|error| {
            StageError::Transfer(format!("failed to stream '{url}' to disk: {error}"))
        })?;
        Ok(())
    }
}
