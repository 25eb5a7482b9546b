use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::dispatch::Dispatcher;
use crate::error::AppError;
use crate::models::{BlobTarget, compute_hash};
use crate::traits::{Fetcher, Sink};

/// Summary of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub sources: usize,
    pub listings: usize,
    pub failed_sources: usize,
    pub bytes: usize,
    /// SHA-256 of the uploaded payload.
    pub payload_hash: String,
}

/// Run the full pipeline once: dispatch → aggregate → serialize → upload.
///
/// Source-level faults never fail the run. Only an aggregate that cannot be
/// encoded, or a sink failure, is returned as an error.
pub async fn run_once<F, S>(
    dispatcher: &Dispatcher<F>,
    sink: &S,
    target: &BlobTarget,
    cancel: &CancellationToken,
) -> Result<RunReport, AppError>
where
    F: Fetcher,
    S: Sink,
{
    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, sources = dispatcher.sources().len(), "Run started");

    let aggregate = dispatcher.dispatch(cancel).await;
    let payload = aggregate.to_json()?;
    let payload_hash = compute_hash(&payload);

    sink.upload(target, &payload).await?;

    let report = RunReport {
        run_id,
        sources: dispatcher.sources().len(),
        listings: aggregate.listing_count(),
        failed_sources: aggregate.error_count(),
        bytes: payload.len(),
        payload_hash,
    };
    tracing::info!(
        %run_id,
        listings = report.listings,
        failed_sources = report.failed_sources,
        bytes = report.bytes,
        container = %target.container,
        blob = %target.blob,
        "Run complete"
    );
    Ok(report)
}
