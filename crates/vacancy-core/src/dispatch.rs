//! Fan-out/fan-in over the configured sources.
//!
//! ```text
//! sources ──┬── fetch ──┐                ┌── extract ──┐
//!           ├── fetch ──┼── barrier ─────┼── extract ──┼── Aggregate
//!           └── fetch ──┘   (wait all)   └── extract ──┘
//! ```
//!
//! Each source travels with its own fetch result from start to finish, so
//! adding or reordering sources cannot misalign fetches and extractors.
//! One source failing never cancels or skips another.

use std::any::Any;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::models::{Aggregate, Document, FetchError, FetchResult, JobListing, Page, Source};
use crate::traits::Fetcher;

/// Runs one fetch per source concurrently, then every extractor, in source order.
pub struct Dispatcher<F>
where
    F: Fetcher,
{
    fetcher: F,
    sources: Arc<[Source]>,
    config: PipelineConfig,
}

impl<F> Dispatcher<F>
where
    F: Fetcher,
{
    pub fn new(fetcher: F, sources: Arc<[Source]>, config: PipelineConfig) -> Self {
        Self {
            fetcher,
            sources,
            config,
        }
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Fetch every source, wait for all of them, then extract.
    ///
    /// Never fails: per-source faults show up as processing-error listings.
    pub async fn dispatch(&self, cancel: &CancellationToken) -> Aggregate {
        let fetched = self.fetch_all(cancel).await;
        let batches = extract_all(fetched).await;
        let aggregate = Aggregate::from_batches(batches);

        tracing::info!(
            listings = aggregate.listing_count(),
            failed = aggregate.error_count(),
            "Extraction complete"
        );
        aggregate
    }

    /// Fan out one fetch per source and join on all of them.
    ///
    /// The returned pairs are in source order, whatever order the fetches
    /// finished in.
    pub async fn fetch_all(&self, cancel: &CancellationToken) -> Vec<(Source, FetchResult)> {
        let semaphore = Semaphore::new(self.config.max_concurrency.max(1));

        tracing::info!(
            sources = self.sources.len(),
            concurrency = self.config.max_concurrency,
            "Dispatching fetches"
        );

        let pending = self.sources.iter().map(|source| {
            let semaphore = &semaphore;
            async move {
                let fetched = self.fetch_source(source, semaphore, cancel).await;
                (source.clone(), fetched)
            }
        });
        let fetched = join_all(pending).await;

        let failed = fetched.iter().filter(|(_, r)| r.is_err()).count();
        tracing::info!(
            fetched = fetched.len() - failed,
            failed,
            "All fetches settled"
        );
        fetched
    }

    async fn fetch_source(
        &self,
        source: &Source,
        semaphore: &Semaphore,
        cancel: &CancellationToken,
    ) -> FetchResult {
        // Cancellation wins over a ready permit or a ready response.
        let _permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(fetch_error(source, AppError::Cancelled)),
            permit = semaphore.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => return Err(fetch_error(source, "fetch pool closed")),
            },
        };

        let mut attempt = 0;
        loop {
            match self.fetch_attempt(&source.url, cancel).await {
                Ok(body) => {
                    tracing::info!(source = %source.id, bytes = body.len(), "Fetched document");
                    return Ok(Document {
                        url: source.url.clone(),
                        body,
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.backoff_for_attempt(attempt);
                    tracing::debug!(
                        source = %source.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying fetch"
                    );
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = cancel.cancelled() => {
                            return Err(fetch_error(source, AppError::Cancelled));
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(source = %source.id, url = %source.url, error = %e, "Fetch failed");
                    return Err(fetch_error(source, e));
                }
            }
        }
    }

    async fn fetch_attempt(&self, url: &str, cancel: &CancellationToken) -> Result<String, AppError> {
        let timeout = self.config.fetch_timeout;
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AppError::Cancelled),
            result = tokio::time::timeout(timeout, self.fetcher.fetch(url)) => {
                result.unwrap_or(Err(AppError::Timeout(timeout.as_millis() as u64)))
            }
        }
    }
}

fn fetch_error(source: &Source, cause: impl ToString) -> FetchError {
    FetchError {
        url: source.url.clone(),
        message: cause.to_string(),
    }
}

/// Run every extractor on a blocking task and collect the batches in source order.
///
/// A panicking extractor surfaces as a join error and becomes that source's
/// processing-error listing.
async fn extract_all(fetched: Vec<(Source, FetchResult)>) -> Vec<Vec<JobListing>> {
    let tasks = fetched.into_iter().map(|(source, fetched)| {
        let url = source.url.clone();
        let id = source.id.clone();
        let handle = tokio::task::spawn_blocking(move || isolate_extraction(&source, fetched));
        async move {
            match handle.await {
                Ok(listings) => listings,
                Err(e) => {
                    let diagnostic = if e.is_panic() {
                        format!("extractor panicked: {}", panic_message(e.into_panic()))
                    } else {
                        format!("extraction task failed: {e}")
                    };
                    tracing::warn!(source = %id, error = %diagnostic, "Extraction aborted");
                    vec![JobListing::processing_error(&url, diagnostic)]
                }
            }
        }
    });
    join_all(tasks).await
}

/// The single place where per-source faults become processing-error listings.
///
/// A fetch error short-circuits to an error listing without touching the
/// extractor, so error text is never parsed as markup.
pub fn isolate_extraction(source: &Source, fetched: FetchResult) -> Vec<JobListing> {
    let document = match fetched {
        Ok(document) => document,
        Err(e) => return vec![JobListing::processing_error(&source.url, e.to_string())],
    };

    let page = Page {
        url: &document.url,
        host: &source.host,
        html: &document.body,
    };

    match source.extractor.extract(&page) {
        Ok(listings) => {
            tracing::debug!(
                source = %source.id,
                extractor = source.extractor.name(),
                listings = listings.len(),
                "Extracted listings"
            );
            listings
        }
        Err(e) => {
            tracing::warn!(
                source = %source.id,
                extractor = source.extractor.name(),
                error = %e,
                "Extraction failed"
            );
            vec![JobListing::processing_error(
                &source.url,
                format!("{} extractor: {e}", source.extractor.name()),
            )]
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
