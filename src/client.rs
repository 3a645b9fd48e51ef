// src/client.rs

//! Build service API access
//!
//! `DocumentFetcher` is the seam between snapshot construction and the
//! network. `ApiClient` is the blocking HTTP implementation used by the
//! command line tool; tests substitute an in-memory fetcher.

use crate::account::Account;
use crate::error::{Error, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests (30 seconds)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches raw API documents by resource path
pub trait DocumentFetcher: Send + Sync {
    /// GET `path` (e.g. `/source/Moblin:Base`) under `account` and return the body
    fn get(&self, account: &Account, path: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP client for the build service API
///
/// One request per call, no caching and no retries.
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("factory-status/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl DocumentFetcher for ApiClient {
    fn get(&self, account: &Account, path: &str) -> Result<Vec<u8>> {
        let url = resource_url(account.api_url(), path);
        debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(creds) = account.credentials() {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().map_err(|e| Error::RemoteFetch {
            path: url.clone(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(Error::RemoteFetch {
                path: url,
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response.bytes().map_err(|e| Error::RemoteFetch {
            path: url.clone(),
            reason: format!("Failed to read response: {}", e),
        })?;

        Ok(bytes.to_vec())
    }
}

/// Join an API URL and a resource path with exactly one slash
fn resource_url(api_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        api_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
