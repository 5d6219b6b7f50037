//! Blocking HTTP loader.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_NONE_MATCH, USER_AGENT};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::activity::LoaderStatus;

use super::loader::{LoaderResult, TileLoader};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const AGENT: &str = concat!("tilescape/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum HttpLoaderError {
    #[error("Failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// [`TileLoader`] for `http://` and `https://` URLs. Other schemes are left
/// to the next loader.
#[derive(Debug, Clone)]
pub struct HttpTileLoader {
    client: Client,
}

impl HttpTileLoader {
    pub fn new() -> Result<Self, HttpLoaderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpLoaderError> {
        let client = Client::builder().timeout(Duration::from_secs(timeout_secs)).build()?;
        Ok(Self { client })
    }
}

impl TileLoader for HttpTileLoader {
    fn load(&self, url: &str, etag: Option<&str>) -> LoaderResult {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return LoaderResult::noop();
        }

        let mut request = self.client.get(url).header(USER_AGENT, AGENT);
        if let Some(tag) = etag {
            request = request.header(IF_NONE_MATCH, tag);
        }

        let response = match request.send() {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "tile request failed");
                return LoaderResult::failed(classify_transport_error(&e)).with_error_code(e.to_string());
            }
        };

        let status = response.status();
        let new_etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if status == StatusCode::NOT_MODIFIED {
            let mut result = LoaderResult::not_modified();
            result.etag = new_etag.or_else(|| etag.map(str::to_string));
            return result;
        }

        if !status.is_success() {
            return LoaderResult::failed(classify_status(status)).with_error_code(status.as_u16().to_string());
        }

        match response.bytes() {
            Ok(body) => {
                let mut result = LoaderResult::ok(body);
                result.etag = new_etag;
                result
            }
            Err(e) => LoaderResult::failed(classify_transport_error(&e)).with_error_code(e.to_string()),
        }
    }
}

/// Map a non-success HTTP status to a loader status.
pub fn classify_status(status: StatusCode) -> LoaderStatus {
    match status {
        StatusCode::BAD_REQUEST => LoaderStatus::Error400,
        StatusCode::NOT_FOUND => LoaderStatus::Error404,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => LoaderStatus::ErrorTimeout,
        s if s.is_success() => LoaderStatus::Ok,
        _ => LoaderStatus::ErrorOther,
    }
}

fn classify_transport_error(error: &reqwest::Error) -> LoaderStatus {
    if error.is_timeout() {
        LoaderStatus::ErrorTimeout
    } else if error.is_connect() || error.is_request() || error.is_body() {
        LoaderStatus::ErrorNetwork
    } else {
        LoaderStatus::ErrorOther
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::BAD_REQUEST), LoaderStatus::Error400);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), LoaderStatus::Error404);
        assert_eq!(classify_status(StatusCode::GATEWAY_TIMEOUT), LoaderStatus::ErrorTimeout);
        assert_eq!(classify_status(StatusCode::INTERNAL_SERVER_ERROR), LoaderStatus::ErrorOther);
        assert_eq!(classify_status(StatusCode::OK), LoaderStatus::Ok);
    }

    #[test]
    fn test_other_schemes_are_not_handled() {
        let loader = HttpTileLoader::new().unwrap();
        let result = loader.load("file:///tmp/0/0/0.png", None);
        assert_eq!(result.status, LoaderStatus::Noop);
    }
}
