use tokio_util::sync::CancellationToken;
use vacancy_client::ExtractorKind;
use vacancy_core::models::PROCESSING_ERROR_HOST;

use crate::integration::common::*;

#[tokio::test]
async fn table_rows_map_to_fixed_columns() {
    let specs = [spec(
        "valley",
        VALLEY_URL,
        "Valley Chamber Jobs Board",
        ExtractorKind::TabularBoard,
    )];
    let aggregate = dispatcher(fixture_fetcher(), &specs)
        .dispatch(&CancellationToken::new())
        .await;

    assert_eq!(aggregate.hosts.len(), 3);
    let expected = [
        (
            "Millbrook Hardware",
            "Bookkeeper",
            "https://jobs.valley-chamber.example/postings/1001",
            "2026-11-02",
            "$24/hr",
        ),
        (
            "Riverside Animal Clinic",
            "Veterinary Technician",
            "https://apply.riverside-vet.example/tech",
            "2026-11-15",
            "$19 - $23/hr",
        ),
        (
            "Lakeview Diner",
            "Line Cook",
            "https://jobs.valley-chamber.example/postings/1003",
            "Open until filled",
            "DOE",
        ),
    ];
    for (listing, (host, title, applink, closes, salary)) in aggregate.hosts.iter().zip(expected) {
        assert_eq!(listing.host, host);
        assert_eq!(listing.details.len(), 1);
        let d = &listing.details[0];
        assert_eq!(d.title.as_deref(), Some(title));
        assert_eq!(d.applink.as_deref(), Some(applink));
        assert_eq!(d.closebydate.as_deref(), Some(closes));
        assert_eq!(d.salary.as_deref(), Some(salary));
        assert!(d.description.is_none());
    }
}

#[tokio::test]
async fn unreachable_source_becomes_one_error_listing() {
    let dead_url = "http://127.0.0.1:9/jobs";
    let mut specs = fixture_specs();
    specs.insert(
        2,
        spec("dead", dead_url, "Closed Port Inc", ExtractorKind::JobCards),
    );

    let fetcher = FixtureOrNetwork::new(
        fixture_fetcher(),
        &[VALLEY_URL, LIBRARY_URL, HOSPITAL_URL, REGIONAL_URL],
    );
    let aggregate = dispatcher(fetcher, &specs)
        .dispatch(&CancellationToken::new())
        .await;

    assert_eq!(aggregate.error_count(), 1);
    let error = &aggregate.hosts[4];
    assert_eq!(error.host, PROCESSING_ERROR_HOST);
    assert_eq!(error.details[0].applink.as_deref(), Some(dead_url));
    let diagnostic = error.details[0].description.as_deref().unwrap();
    assert!(
        diagnostic.starts_with("fetch of http://127.0.0.1:9/jobs failed"),
        "unexpected diagnostic: {diagnostic}"
    );

    let baseline = dispatcher(fixture_fetcher(), &fixture_specs())
        .dispatch(&CancellationToken::new())
        .await;
    let intact: Vec<_> = aggregate
        .hosts
        .iter()
        .filter(|l| !l.is_processing_error())
        .cloned()
        .collect();
    assert_eq!(intact, baseline.hosts);
}

#[tokio::test]
async fn cancelled_run_still_produces_a_snapshot() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let aggregate = dispatcher(fixture_fetcher(), &fixture_specs())
        .dispatch(&cancel)
        .await;

    assert_eq!(aggregate.hosts.len(), 4);
    assert!(aggregate.hosts.iter().all(|l| l.is_processing_error()));
    assert!(
        aggregate.hosts[0].details[0]
            .description
            .as_deref()
            .unwrap()
            .contains("cancelled")
    );
}

#[tokio::test]
async fn default_registry_builds_and_dispatches() {
    let specs = vacancy_client::default_sources();
    // Nothing is served, so every source settles as a fetch failure.
    let aggregate = dispatcher(vacancy_core::testutil::MockFetcher::new(), &specs)
        .dispatch(&CancellationToken::new())
        .await;

    assert_eq!(aggregate.error_count(), specs.len());
    for (listing, spec) in aggregate.hosts.iter().zip(&specs) {
        assert_eq!(listing.details[0].applink.as_deref(), Some(spec.url.as_str()));
    }
}
