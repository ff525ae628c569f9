//! Exchange HTTP source.
//!
//! The catalog is the exchange's historical-series listing page; every
//! `COTAHIST_*.ZIP` token found in it is an advertised file. Files are
//! downloaded from `{download_base_url}/{file_name}`. One attempt per call;
//! the orchestrators decide what a failure means for the batch.

use super::{RemoteCatalog, SeriesSource, SourceError};
use crate::naming::{classify, is_source_archive};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const TOKEN: &[u8] = b"cotahist_";

/// Annual archives run to a few hundred MB.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

pub struct B3HttpSource {
    client: reqwest::blocking::Client,
    catalog_url: String,
    download_base_url: String,
}

impl B3HttpSource {
    pub fn new(catalog_url: &str, download_base_url: &str) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| SourceError::CatalogUnavailable(format!("http client: {e}")))?;

        Ok(Self {
            client,
            catalog_url: catalog_url.to_string(),
            download_base_url: download_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn download_url(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.download_base_url)
    }

    fn get(&self, url: &str) -> Result<Vec<u8>, String> {
        let resp = self.client.get(url).send().map_err(|e| e.to_string())?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format!("HTTP {status} for {url}"));
        }
        resp.bytes().map(|b| b.to_vec()).map_err(|e| e.to_string())
    }
}

impl SeriesSource for B3HttpSource {
    fn name(&self) -> &str {
        "b3_http"
    }

    fn list_available(&self) -> Result<RemoteCatalog, SourceError> {
        let page = self
            .get(&self.catalog_url)
            .map_err(SourceError::CatalogUnavailable)?;
        let file_names = scan_file_names(&page);
        if file_names.is_empty() {
            return Err(SourceError::CatalogUnavailable(format!(
                "no series files advertised at {}",
                self.catalog_url
            )));
        }

        let catalog = RemoteCatalog::from_file_names(&file_names);
        info!(
            annual = catalog.annual.len(),
            monthly = catalog.monthly.len(),
            daily = catalog.daily.len(),
            "remote catalog listed"
        );
        Ok(catalog)
    }

    fn fetch(&self, file_name: &str) -> Result<Vec<u8>, SourceError> {
        let url = self.download_url(file_name);
        let started = Instant::now();
        let bytes = self.get(&url).map_err(|reason| SourceError::FetchFailed {
            file_name: file_name.to_string(),
            reason,
        })?;
        debug!(
            file_name,
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched"
        );
        Ok(bytes)
    }
}

/// Every distinct `COTAHIST_*.ZIP` file name in `page`, in order of first
/// appearance. Tokens that do not classify are ignored.
pub fn scan_file_names(page: &[u8]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut cursor = 0;
    while cursor + TOKEN.len() <= page.len() {
        if !page[cursor..cursor + TOKEN.len()].eq_ignore_ascii_case(TOKEN) {
            cursor += 1;
            continue;
        }
        let len = page[cursor..]
            .iter()
            .take_while(|&&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.'))
            .count();
        // The run is pure ASCII.
        let candidate = String::from_utf8_lossy(&page[cursor..cursor + len]).into_owned();
        cursor += len;

        if is_source_archive(&candidate)
            && classify(&candidate).is_some()
            && !names.contains(&candidate)
        {
            names.push(candidate);
        }
    }
    names
}
