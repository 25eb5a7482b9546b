use std::time::Duration;

use reqwest::Client;
use url::Url;
use vacancy_core::error::AppError;
use vacancy_core::traits::Fetcher;

/// HTTP fetcher using reqwest.
///
/// Downloads raw HTML from career pages with a fixed User-Agent and a
/// client-level timeout. The dispatcher applies its own per-attempt timeout
/// on top, so this one is only a backstop.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_ms: u64,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(60))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let timeout_ms = timeout.as_millis() as u64;
        let client = Client::builder()
            .user_agent("Vacancy/0.1 (job board aggregator)")
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_ms,
        })
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        validate_url(url)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_ms)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))
    }
}

/// Only absolute `http`/`https` URLs are fetched.
fn validate_url(url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::HttpError(format!("Invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::HttpError(format!(
                "URL scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    if parsed.host_str().is_none() {
        return Err(AppError::HttpError("URL has no host".to_string()));
    }

    Ok(())
}
