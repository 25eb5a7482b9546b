use std::sync::Arc;
use std::time::Duration;

use vacancy_client::{ExtractorKind, ReqwestFetcher, SourceSpec, build_sources};
use vacancy_core::error::AppError;
use vacancy_core::models::Source;
use vacancy_core::testutil::MockFetcher;
use vacancy_core::traits::Fetcher;
use vacancy_core::{Dispatcher, PipelineConfig};

pub const VALLEY_BOARD: &str = include_str!("../fixtures/valley_board.html");
pub const LIBRARY: &str = include_str!("../fixtures/library.html");
pub const HOSPITAL: &str = include_str!("../fixtures/hospital.html");
pub const HOSPITAL_EMPTY: &str = include_str!("../fixtures/hospital_empty.html");
pub const HOSPITAL_REDESIGNED: &str = include_str!("../fixtures/hospital_redesigned.html");
pub const REGIONAL_BOARD: &str = include_str!("../fixtures/regional_board.html");

pub const VALLEY_URL: &str = "https://jobs.valley-chamber.example/openings";
pub const LIBRARY_URL: &str = "https://www.northfield-library.example/about/jobs";
pub const HOSPITAL_URL: &str = "https://careers.mercy-valley.example/";
pub const REGIONAL_URL: &str = "https://jobs.regional-board.example/";

pub fn spec(id: &str, url: &str, host: &str, kind: ExtractorKind) -> SourceSpec {
    SourceSpec {
        id: id.into(),
        url: url.into(),
        host: host.into(),
        extractor: kind,
    }
}

/// The four fixture sources, in registration order.
pub fn fixture_specs() -> Vec<SourceSpec> {
    vec![
        spec("valley", VALLEY_URL, "Valley Chamber Jobs Board", ExtractorKind::TabularBoard),
        spec("library", LIBRARY_URL, "Northfield Public Library", ExtractorKind::HeadingList),
        spec("hospital", HOSPITAL_URL, "Mercy Valley Hospital", ExtractorKind::JobCards),
        spec("regional", REGIONAL_URL, "Regional Jobs Board", ExtractorKind::JsonLd),
    ]
}

/// Serves every fixture page at its source URL.
pub fn fixture_fetcher() -> MockFetcher {
    MockFetcher::new()
        .with_page(VALLEY_URL, VALLEY_BOARD)
        .with_page(LIBRARY_URL, LIBRARY)
        .with_page(HOSPITAL_URL, HOSPITAL)
        .with_page(REGIONAL_URL, REGIONAL_BOARD)
}

pub fn sources(specs: &[SourceSpec]) -> Arc<[Source]> {
    build_sources(specs).unwrap()
}

/// Fast settings so failure paths don't slow the suite down.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        max_concurrency: 4,
        fetch_timeout: Duration::from_secs(5),
        max_retries: 0,
        retry_backoff: Duration::from_millis(10),
    }
}

pub fn dispatcher<F: Fetcher>(fetcher: F, specs: &[SourceSpec]) -> Dispatcher<F> {
    Dispatcher::new(fetcher, sources(specs), test_config())
}

/// Fixture pages for known URLs, a real HTTP client for everything else.
#[derive(Clone)]
pub struct FixtureOrNetwork {
    pub fixtures: MockFetcher,
    pub fixture_urls: Vec<String>,
    pub network: ReqwestFetcher,
}

impl FixtureOrNetwork {
    pub fn new(fixtures: MockFetcher, fixture_urls: &[&str]) -> Self {
        Self {
            fixtures,
            fixture_urls: fixture_urls.iter().map(|u| u.to_string()).collect(),
            network: ReqwestFetcher::with_timeout(Duration::from_secs(5)).unwrap(),
        }
    }
}

impl Fetcher for FixtureOrNetwork {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        if self.fixture_urls.iter().any(|u| u == url) {
            self.fixtures.fetch(url).await
        } else {
            self.network.fetch(url).await
        }
    }
}
