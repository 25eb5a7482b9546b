pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod run;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod traits;

pub use config::PipelineConfig;
pub use dispatch::{Dispatcher, isolate_extraction};
pub use error::AppError;
pub use models::{
    Aggregate, BlobTarget, Detail, Document, FetchError, FetchResult, JobListing, Page,
    PROCESSING_ERROR_HOST, Source, compute_hash,
};
pub use run::{RunReport, run_once};
pub use traits::{Extractor, Fetcher, Sink};
