use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use vacancy_client::FsSink;
use vacancy_core::models::{Aggregate, BlobTarget, JobListing, PROCESSING_ERROR_HOST, Source};
use vacancy_core::testutil::{MemorySink, PanickingExtractor, mock_source};
use vacancy_core::{Dispatcher, compute_hash, run_once};

use crate::integration::common::*;

fn hosts(aggregate: &Aggregate) -> Vec<&str> {
    aggregate.hosts.iter().map(|l| l.host.as_str()).collect()
}

fn without_errors(aggregate: &Aggregate) -> Vec<JobListing> {
    aggregate
        .hosts
        .iter()
        .filter(|l| !l.is_processing_error())
        .cloned()
        .collect()
}

#[tokio::test]
async fn full_pipeline_preserves_source_order() {
    let aggregate = dispatcher(fixture_fetcher(), &fixture_specs())
        .dispatch(&CancellationToken::new())
        .await;

    assert_eq!(
        hosts(&aggregate),
        [
            "Millbrook Hardware",
            "Riverside Animal Clinic",
            "Lakeview Diner",
            "Northfield Public Library",
            "Mercy Valley Hospital",
            "Bay Ferries",
        ]
    );
    assert_eq!(aggregate.error_count(), 0);

    let library = &aggregate.hosts[3].details;
    assert_eq!(library.len(), 2);
    assert_eq!(library[0].title.as_deref(), Some("Circulation Clerk"));
    assert_eq!(
        library[0].applink.as_deref(),
        Some("https://www.northfield-library.example/jobs/circulation-clerk.pdf")
    );

    let ferries = &aggregate.hosts[5].details;
    assert_eq!(ferries.len(), 2);
    assert_eq!(ferries[0].salary.as_deref(), Some("USD 21 per hour"));
    assert_eq!(
        ferries[1].applink.as_deref(),
        Some("https://jobs.regional-board.example/p/32")
    );
    assert_eq!(
        ferries[1].description.as_deref(),
        Some("Sell tickets at the main terminal.")
    );
}

#[tokio::test]
async fn order_holds_when_fetches_finish_out_of_order() {
    use std::time::Duration;

    let fetcher = fixture_fetcher()
        .with_delayed_page(VALLEY_URL, VALLEY_BOARD, Duration::from_millis(150))
        .with_delayed_page(LIBRARY_URL, LIBRARY, Duration::from_millis(50));

    let slow = dispatcher(fetcher, &fixture_specs())
        .dispatch(&CancellationToken::new())
        .await;
    let fast = dispatcher(fixture_fetcher(), &fixture_specs())
        .dispatch(&CancellationToken::new())
        .await;

    assert_eq!(slow, fast);
}

#[tokio::test]
async fn markup_drift_is_isolated_to_one_source() {
    let baseline = dispatcher(fixture_fetcher(), &fixture_specs())
        .dispatch(&CancellationToken::new())
        .await;

    let drifted = fixture_fetcher().with_page(HOSPITAL_URL, HOSPITAL_REDESIGNED);
    let aggregate = dispatcher(drifted, &fixture_specs())
        .dispatch(&CancellationToken::new())
        .await;

    assert_eq!(aggregate.error_count(), 1);
    let error = &aggregate.hosts[4];
    assert_eq!(error.host, PROCESSING_ERROR_HOST);
    assert_eq!(error.details.len(), 1);
    assert_eq!(error.details[0].applink.as_deref(), Some(HOSPITAL_URL));
    assert!(
        error.details[0]
            .description
            .as_deref()
            .unwrap()
            .contains("job_cards extractor")
    );

    let expected: Vec<JobListing> = baseline
        .hosts
        .iter()
        .filter(|l| l.host != "Mercy Valley Hospital")
        .cloned()
        .collect();
    assert_eq!(without_errors(&aggregate), expected);
}

#[tokio::test]
async fn panicking_extractor_is_isolated() {
    let boom_url = "https://boom.example/jobs";
    let mut list: Vec<Source> = sources(&fixture_specs()).to_vec();
    list.insert(1, mock_source("boom", boom_url, PanickingExtractor));
    let list: Arc<[Source]> = list.into();

    let fetcher = fixture_fetcher().with_page(boom_url, "<table></table>");
    let aggregate = Dispatcher::new(fetcher, list, test_config())
        .dispatch(&CancellationToken::new())
        .await;

    let errors: Vec<_> = aggregate
        .hosts
        .iter()
        .filter(|l| l.is_processing_error())
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].details[0].applink.as_deref(), Some(boom_url));
    assert!(
        errors[0].details[0]
            .description
            .as_deref()
            .unwrap()
            .contains("extractor panicked")
    );
    // The error sits between the table rows and the library listing.
    assert_eq!(aggregate.hosts[3].host, PROCESSING_ERROR_HOST);
    assert_eq!(aggregate.hosts[4].host, "Northfield Public Library");
    assert_eq!(aggregate.listing_count(), 7);
}

#[tokio::test]
async fn zero_postings_contribute_nothing() {
    let fetcher = fixture_fetcher().with_page(HOSPITAL_URL, HOSPITAL_EMPTY);
    let aggregate = dispatcher(fetcher, &fixture_specs())
        .dispatch(&CancellationToken::new())
        .await;

    assert_eq!(aggregate.error_count(), 0);
    assert!(!hosts(&aggregate).contains(&"Mercy Valley Hospital"));
    assert_eq!(aggregate.listing_count(), 5);
}

#[tokio::test]
async fn repeated_runs_upload_identical_bytes() {
    let dispatcher = dispatcher(fixture_fetcher(), &fixture_specs());
    let sink = MemorySink::new();
    let target = BlobTarget::default();
    let cancel = CancellationToken::new();

    let first = run_once(&dispatcher, &sink, &target, &cancel).await.unwrap();
    let second = run_once(&dispatcher, &sink, &target, &cancel).await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.payload_hash, second.payload_hash);

    let uploads = sink.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].1, uploads[1].1);
    assert_eq!(uploads[0].0.container, "scrapeddata");
    assert_eq!(uploads[0].0.blob, "raw-output");

    let parsed: Aggregate = serde_json::from_slice(&uploads[0].1).unwrap();
    assert_eq!(parsed.listing_count(), 6);
}

#[tokio::test]
async fn fs_sink_holds_latest_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let sink = FsSink::new(dir.path());
    let target = BlobTarget::default();
    let cancel = CancellationToken::new();

    let full = dispatcher(fixture_fetcher(), &fixture_specs());
    run_once(&full, &sink, &target, &cancel).await.unwrap();

    let emptied = dispatcher(
        fixture_fetcher().with_page(HOSPITAL_URL, HOSPITAL_EMPTY),
        &fixture_specs(),
    );
    let report = run_once(&emptied, &sink, &target, &cancel).await.unwrap();

    let written = std::fs::read(dir.path().join("scrapeddata").join("raw-output")).unwrap();
    assert_eq!(compute_hash(&written), report.payload_hash);
    assert_eq!(report.listings, 5);
    assert_eq!(report.failed_sources, 0);
    assert_eq!(report.sources, 4);
}

#[tokio::test]
async fn output_schema_uses_nulls() {
    let aggregate = dispatcher(fixture_fetcher(), &fixture_specs())
        .dispatch(&CancellationToken::new())
        .await;
    let value: serde_json::Value = serde_json::from_slice(&aggregate.to_json().unwrap()).unwrap();

    let transporter = &value["hosts"][4]["details"][1];
    assert_eq!(transporter["title"], "Patient Transporter");
    assert!(transporter["applink"].is_null());
    assert!(transporter["closebydate"].is_null());
    assert_eq!(transporter["emailcontact"], "transport@mercy-valley.example");

    let keys: Vec<_> = transporter.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys.len(), 7);
}
