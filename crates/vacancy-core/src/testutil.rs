//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::AppError;
use crate::models::{BlobTarget, JobListing, Page, Source};
use crate::traits::{Extractor, Fetcher, Sink};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// A scripted response for one URL.
struct Script {
    /// Queue of responses. Each call pops the first element; the last one repeats.
    responses: Vec<Result<String, AppError>>,
    delay: Duration,
}

/// Mock fetcher that serves scripted responses per URL.
///
/// Unknown URLs fail with a connection error, like an unreachable host.
#[derive(Clone, Default)]
pub struct MockFetcher {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    calls: Arc<Mutex<HashMap<String, usize>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_delayed_page(url, html, Duration::ZERO)
    }

    pub fn with_delayed_page(self, url: &str, html: &str, delay: Duration) -> Self {
        self.script(url, vec![Ok(html.to_string())], delay)
    }

    pub fn with_error(self, url: &str, error: AppError) -> Self {
        self.script(url, vec![Err(error)], Duration::ZERO)
    }

    pub fn with_responses(self, url: &str, responses: Vec<Result<String, AppError>>) -> Self {
        self.script(url, responses, Duration::ZERO)
    }

    fn script(self, url: &str, responses: Vec<Result<String, AppError>>, delay: Duration) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), Script { responses, delay });
        self
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    /// Fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_response(&self, url: &str) -> (Result<String, AppError>, Duration) {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;

        let mut scripts = self.scripts.lock().unwrap();
        let Some(script) = scripts.get_mut(url) else {
            return (
                Err(AppError::NetworkError(format!("Connection failed: {url}"))),
                Duration::ZERO,
            );
        };
        let response = if script.responses.len() > 1 {
            script.responses.remove(0)
        } else {
            match script.responses.first() {
                Some(Ok(html)) => Ok(html.clone()),
                Some(Err(e)) => Err(clone_error(e)),
                None => Ok("<html><body>default</body></html>".to_string()),
            }
        };
        (response, script.delay)
    }
}

fn clone_error(error: &AppError) -> AppError {
    match error {
        AppError::HttpError(m) => AppError::HttpError(m.clone()),
        AppError::NetworkError(m) => AppError::NetworkError(m.clone()),
        AppError::Timeout(s) => AppError::Timeout(*s),
        AppError::Cancelled => AppError::Cancelled,
        other => AppError::HttpError(other.to_string()),
    }
}

/// Decrements the in-flight counter when a fetch finishes or its future is
/// dropped by a timeout or cancellation.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (response, delay) = self.next_response(url);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor that returns fixed listings or a fixed error.
#[derive(Clone)]
pub struct MockExtractor {
    result: Result<Vec<JobListing>, String>,
    pub calls: Arc<Mutex<usize>>,
    /// (url, host, html) of the most recent call.
    pub last_page: Arc<Mutex<Option<(String, String, String)>>>,
}

impl MockExtractor {
    pub fn new(listings: Vec<JobListing>) -> Self {
        Self {
            result: Ok(listings),
            calls: Arc::new(Mutex::new(0)),
            last_page: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_error(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: Arc::new(Mutex::new(0)),
            last_page: Arc::new(Mutex::new(None)),
        }
    }
}

impl Extractor for MockExtractor {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        *self.calls.lock().unwrap() += 1;
        *self.last_page.lock().unwrap() = Some((
            page.url.to_string(),
            page.host.to_string(),
            page.html.to_string(),
        ));
        self.result.clone().map_err(AppError::Extraction)
    }
}

/// Extractor that panics, for fault-isolation tests.
#[derive(Clone, Copy)]
pub struct PanickingExtractor;

impl Extractor for PanickingExtractor {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn extract(&self, _page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        panic!("index out of range in row 3")
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Sink that records uploads in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    pub uploads: Arc<Mutex<Vec<(BlobTarget, Vec<u8>)>>>,
    fail_with: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(message.to_string()),
        }
    }
}

impl Sink for MemorySink {
    async fn upload(&self, target: &BlobTarget, payload: &[u8]) -> Result<(), AppError> {
        if let Some(message) = &self.fail_with {
            return Err(AppError::Sink(message.clone()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((target.clone(), payload.to_vec()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Build a source named `id` with host label `"Host {id}"`.
pub fn mock_source(id: &str, url: &str, extractor: impl Extractor) -> Source {
    Source::new(id, url, format!("Host {id}"), Arc::new(extractor))
}
