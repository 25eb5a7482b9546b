use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::traits::Extractor;

/// Host label used for the synthetic listing that stands in for a failed source.
pub const PROCESSING_ERROR_HOST: &str = "Processing Error";

/// Container the snapshot is uploaded into.
pub const SNAPSHOT_CONTAINER: &str = "scrapeddata";

/// Blob name of the snapshot; every run overwrites it.
pub const SNAPSHOT_BLOB: &str = "raw-output";

/// One posting. Every field is optional; sources publish wildly different subsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub applink: Option<String>,
    pub salary: Option<String>,
    pub title: Option<String>,
    pub closebydate: Option<String>,
    pub description: Option<String>,
    pub othernotes: Option<String>,
    pub emailcontact: Option<String>,
}

impl Detail {
    /// True when no field could be discovered at all.
    pub fn is_empty(&self) -> bool {
        self == &Detail::default()
    }
}

/// Postings grouped under the organization that published them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    pub host: String,
    pub details: Vec<Detail>,
}

impl JobListing {
    pub fn new(host: impl Into<String>, details: Vec<Detail>) -> Self {
        Self {
            host: host.into(),
            details,
        }
    }

    /// The uniform stand-in for a source whose fetch or extraction failed.
    ///
    /// Always carries exactly one detail: the failing URL as `applink` and
    /// the diagnostic as `description`.
    pub fn processing_error(url: &str, diagnostic: impl Into<String>) -> Self {
        Self {
            host: PROCESSING_ERROR_HOST.to_string(),
            details: vec![Detail {
                applink: Some(url.to_string()),
                description: Some(diagnostic.into()),
                ..Detail::default()
            }],
        }
    }

    pub fn is_processing_error(&self) -> bool {
        self.host == PROCESSING_ERROR_HOST
    }
}

/// The flattened output of one run, in source registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub hosts: Vec<JobListing>,
}

impl Aggregate {
    /// Concatenate per-source batches without merging or deduplicating.
    pub fn from_batches<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = Vec<JobListing>>,
    {
        Self {
            hosts: batches.into_iter().flatten().collect(),
        }
    }

    /// Encode to the snapshot JSON schema.
    pub fn to_json(&self) -> Result<Vec<u8>, AppError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn listing_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn error_count(&self) -> usize {
        self.hosts.iter().filter(|l| l.is_processing_error()).count()
    }
}

/// A configured career page.
///
/// Immutable once built; the dispatcher shares the whole list behind an `Arc`.
#[derive(Clone)]
pub struct Source {
    pub id: String,
    pub url: String,
    /// Display name for listings from single-organization pages.
    pub host: String,
    pub extractor: Arc<dyn Extractor>,
}

impl Source {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        host: impl Into<String>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            host: host.into(),
            extractor,
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("host", &self.host)
            .field("extractor", &self.extractor.name())
            .finish()
    }
}

/// A successfully retrieved page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub url: String,
    pub body: String,
}

/// A fetch that did not produce a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub url: String,
    pub message: String,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch of {} failed: {}", self.url, self.message)
    }
}

/// Outcome of fetching one source. Never raised, always handed to extraction.
pub type FetchResult = Result<Document, FetchError>;

/// What an extractor gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub url: &'a str,
    pub host: &'a str,
    pub html: &'a str,
}

/// Where the snapshot goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobTarget {
    pub container: String,
    pub blob: String,
}

impl Default for BlobTarget {
    fn default() -> Self {
        Self {
            container: SNAPSHOT_CONTAINER.to_string(),
            blob: SNAPSHOT_BLOB.to_string(),
        }
    }
}

/// Compute a SHA-256 hash of a byte payload, returned as 64-char hex.
pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
