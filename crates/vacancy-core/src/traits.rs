use std::future::Future;

use crate::error::AppError;
use crate::models::{BlobTarget, JobListing, Page};

/// Fetches raw HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Turns one source's markup into listings.
///
/// Implementations are pure: they read only the page they are given. An empty
/// vec means the source currently has no postings. Any markup mismatch is
/// reported as [`AppError::Extraction`]; the dispatcher turns it into a
/// processing-error listing.
pub trait Extractor: Send + Sync + 'static {
    /// Stable identifier, as used in sources files.
    fn name(&self) -> &'static str;

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError>;
}

/// Persists the serialized snapshot.
pub trait Sink: Send + Sync {
    fn upload(
        &self,
        target: &BlobTarget,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}
