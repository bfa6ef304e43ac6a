//! Testing utilities including mock implementations.
//!
//! Deterministic stand-ins for the network and OCR collaborators, plus
//! a scripted extractor for exercising the fallback state machine
//! without any platform logic. Useful for testing applications built on
//! this library without real network or OCR calls.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::{ExtractError, ExtractResult, FetchError, FetchResult, OcrError};
use crate::traits::extractor::Extractor;
use crate::traits::fetcher::{FetchRequest, FetchResponse, Fetcher};
use crate::traits::ocr::OcrEngine;
use crate::types::content::{OcrResult, RawContent};
use crate::types::url::{Platform, SourceUrl};

/// A mock fetcher with predefined responses by URL.
///
/// Unconfigured URLs return HTTP 404. All fetched URLs are recorded for
/// assertions.
#[derive(Default)]
pub struct MockFetcher {
    responses: Arc<RwLock<HashMap<String, FetchResponse>>>,
    statuses: Arc<RwLock<HashMap<String, u16>>>,
    redirects: Arc<RwLock<HashMap<String, String>>>,
    images: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a response for a URL.
    pub fn with_response(self, url: impl Into<String>, response: FetchResponse) -> Self {
        self.responses.write().unwrap().insert(url.into(), response);
        self
    }

    /// Serve a bare status code for a URL (e.g. 429, 403).
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        self.statuses.write().unwrap().insert(url.into(), status);
        self
    }

    /// Resolve a short link to a destination URL.
    pub fn with_redirect(self, url: impl Into<String>, destination: impl Into<String>) -> Self {
        self.redirects
            .write()
            .unwrap()
            .insert(url.into(), destination.into());
        self
    }

    /// Serve image bytes for a URL.
    pub fn with_image(self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.images.write().unwrap().insert(url.into(), bytes);
        self
    }

    /// All URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    fn record(&self, url: &str) {
        self.calls.write().unwrap().push(url.to_string());
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult<FetchResponse> {
        self.record(&request.url);

        if let Some(status) = self.statuses.read().unwrap().get(&request.url) {
            return Err(FetchError::Status {
                code: *status,
                url: request.url.clone(),
            });
        }
        match self.responses.read().unwrap().get(&request.url) {
            Some(response) => Ok(response.clone()),
            None => Err(FetchError::Status {
                code: 404,
                url: request.url.clone(),
            }),
        }
    }

    async fn fetch_bytes(&self, request: &FetchRequest) -> FetchResult<Vec<u8>> {
        self.record(&request.url);
        match self.images.read().unwrap().get(&request.url) {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(FetchError::Status {
                code: 404,
                url: request.url.clone(),
            }),
        }
    }

    async fn resolve_redirect(&self, url: &str) -> FetchResult<String> {
        self.record(url);
        match self.redirects.read().unwrap().get(url) {
            Some(destination) => Ok(destination.clone()),
            // No configured redirect: the URL resolves to itself.
            None => Ok(url.to_string()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock OCR engine returning predefined results.
#[derive(Default)]
pub struct MockOcr {
    results: Arc<RwLock<Vec<OcrResult>>>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockOcr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results returned by every `recognize` call, truncated to the
    /// batch size.
    pub fn with_results(self, results: Vec<OcrResult>) -> Self {
        *self.results.write().unwrap() = results;
        self
    }

    /// Make every `recognize` call fail.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of `recognize` calls made (batches, not images).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn recognize(&self, images: &[Vec<u8>]) -> Result<Vec<OcrResult>, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(OcrError::Engine("mock OCR configured to fail".into()));
        }
        let results = self.results.read().unwrap();
        Ok(results.iter().take(images.len()).cloned().collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// An extractor that replays a script of results, for fallback tests.
///
/// Each `extract` call consumes the next scripted step; an exhausted
/// script yields transient errors.
pub struct ScriptedExtractor {
    platform: Platform,
    script: Mutex<VecDeque<ExtractResult<RawContent>>>,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Append a successful extraction producing one text block.
    pub fn then_text(self, text: impl Into<String>) -> Self {
        let mut content = RawContent::new();
        content.push_text(text.into());
        self.script.lock().unwrap().push_back(Ok(content));
        self
    }

    /// Append a failing extraction.
    pub fn then_error(self, error: ExtractError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Number of `extract` calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn extract(
        &self,
        _source: &SourceUrl,
        _fetcher: &dyn Fetcher,
    ) -> ExtractResult<RawContent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExtractError::transient("scripted extractor exhausted")))
    }
}
