//! Loader collaborator contract.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::activity::LoaderStatus;

/// What a loader returns for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderResult {
    pub status: LoaderStatus,
    pub data: Option<Bytes>,
    /// Validation tag to send with the next request for the same URL.
    pub etag: Option<String>,
    /// Loader specific code, e.g. the HTTP status.
    pub error_code: Option<String>,
}

impl LoaderResult {
    pub fn ok(data: impl Into<Bytes>) -> Self {
        Self {
            status: LoaderStatus::Ok,
            data: Some(data.into()),
            etag: None,
            error_code: None,
        }
    }

    /// The copy identified by the request etag is still current.
    pub fn not_modified() -> Self {
        Self::failed(LoaderStatus::Ok)
    }

    /// The loader does not handle this URL.
    pub fn noop() -> Self {
        Self::failed(LoaderStatus::Noop)
    }

    pub fn failed(status: LoaderStatus) -> Self {
        Self {
            status,
            data: None,
            etag: None,
            error_code: None,
        }
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }
}

/// Fetches the bytes behind a resolved tile URL.
///
/// Implementations do their own transport and report the outcome as a
/// [`LoaderResult`]; they never panic on transport failure. A loader that
/// does not recognise a URL returns [`LoaderStatus::Noop`] so the next loader
/// in a [`LoaderChain`] gets a chance.
pub trait TileLoader: Send + Sync {
    fn load(&self, url: &str, etag: Option<&str>) -> LoaderResult;
}

impl<F> TileLoader for F
where
    F: Fn(&str, Option<&str>) -> LoaderResult + Send + Sync,
{
    fn load(&self, url: &str, etag: Option<&str>) -> LoaderResult {
        self(url, etag)
    }
}

/// Tries loaders in order and returns the first result that is not
/// [`LoaderStatus::Noop`].
#[derive(Clone, Default)]
pub struct LoaderChain {
    loaders: Vec<Arc<dyn TileLoader>>,
}

impl fmt::Debug for LoaderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderChain").field("loaders", &self.loaders.len()).finish()
    }
}

impl LoaderChain {
    pub fn new(loaders: Vec<Arc<dyn TileLoader>>) -> Self {
        Self { loaders }
    }

    pub fn single(loader: Arc<dyn TileLoader>) -> Self {
        Self { loaders: vec![loader] }
    }

    pub fn push(&mut self, loader: Arc<dyn TileLoader>) {
        self.loaders.push(loader);
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl TileLoader for LoaderChain {
    /// With no loader handling the URL the result is `ErrorOther` with error
    /// code `"unhandled"`.
    fn load(&self, url: &str, etag: Option<&str>) -> LoaderResult {
        for loader in &self.loaders {
            let result = loader.load(url, etag);
            if result.status != LoaderStatus::Noop {
                return result;
            }
        }
        LoaderResult::failed(LoaderStatus::ErrorOther).with_error_code("unhandled")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Loader answering from a fixed table; unknown URLs return 404.
    #[derive(Default)]
    pub struct MockLoader {
        pub responses: Mutex<HashMap<String, LoaderResult>>,
        pub requests: Mutex<Vec<String>>,
        pub etags: Mutex<Vec<Option<String>>>,
    }

    impl MockLoader {
        pub fn respond(&self, url: &str, result: LoaderResult) {
            self.responses.lock().insert(url.to_string(), result);
        }

        pub fn request_count(&self, url: &str) -> usize {
            self.requests.lock().iter().filter(|u| u.as_str() == url).count()
        }
    }

    impl TileLoader for MockLoader {
        fn load(&self, url: &str, etag: Option<&str>) -> LoaderResult {
            self.requests.lock().push(url.to_string());
            self.etags.lock().push(etag.map(str::to_string));
            self.responses
                .lock()
                .get(url)
                .cloned()
                .unwrap_or_else(|| LoaderResult::failed(LoaderStatus::Error404))
        }
    }

    #[test]
    fn test_closure_loader() {
        let loader = |url: &str, _etag: Option<&str>| LoaderResult::ok(url.as_bytes().to_vec());
        let result = loader.load("abc", None);
        assert_eq!(result.data, Some(Bytes::from_static(b"abc")));
    }

    #[test]
    fn test_chain_skips_noop() {
        let skip: Arc<dyn TileLoader> = Arc::new(|_: &str, _: Option<&str>| LoaderResult::noop());
        let answer: Arc<dyn TileLoader> =
            Arc::new(|_: &str, _: Option<&str>| LoaderResult::ok(vec![7u8]).with_etag("v1"));
        let chain = LoaderChain::new(vec![skip, answer]);

        let result = chain.load("https://x/0/0/0.png", None);
        assert_eq!(result.status, LoaderStatus::Ok);
        assert_eq!(result.etag.as_deref(), Some("v1"));
    }

    #[test]
    fn test_chain_stops_at_first_failure() {
        let fail: Arc<dyn TileLoader> = Arc::new(|_: &str, _: Option<&str>| LoaderResult::failed(LoaderStatus::Error404));
        let answer: Arc<dyn TileLoader> = Arc::new(|_: &str, _: Option<&str>| LoaderResult::ok(vec![1u8]));
        let chain = LoaderChain::new(vec![fail, answer]);
        assert_eq!(chain.load("u", None).status, LoaderStatus::Error404);
    }

    #[test]
    fn test_empty_chain_is_unhandled() {
        let chain = LoaderChain::default();
        let result = chain.load("u", None);
        assert_eq!(result.status, LoaderStatus::ErrorOther);
        assert_eq!(result.error_code.as_deref(), Some("unhandled"));
    }

    #[test]
    fn test_mock_loader_records_requests() {
        let mock = MockLoader::default();
        mock.respond("a", LoaderResult::ok(vec![1u8]));
        assert_eq!(mock.load("a", None).status, LoaderStatus::Ok);
        assert_eq!(mock.load("b", None).status, LoaderStatus::Error404);
        assert_eq!(mock.request_count("a"), 1);
    }
}
