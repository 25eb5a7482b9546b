use scraper::Html;
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing, Page};
use vacancy_core::traits::Extractor;

use super::dom::{first_text, link_of, mailto_address, require, selector, single_host};

/// Card grid: one `.job-card` block per opening inside a `.job-board` container.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobCards;

impl Extractor for JobCards {
    fn name(&self) -> &'static str {
        "job_cards"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        let doc = Html::parse_document(page.html);
        let board = require(&doc, ".job-board, [data-job-board]", "job board container")?;

        let card = selector(".job-card")?;
        let title = selector(".job-title, h2, h3")?;
        let salary = selector(".salary")?;
        let closing = selector(".closing-date, .deadline")?;
        let summary = selector(".summary")?;
        let department = selector(".department")?;
        let apply = selector("a.apply[href]")?;
        let any_link = selector("a[href]")?;
        let mailto = selector(r#"a[href^="mailto:"]"#)?;

        let details = board
            .select(&card)
            .map(|c| Detail {
                title: first_text(c, &title),
                applink: c
                    .select(&apply)
                    .next()
                    .or_else(|| {
                        c.select(&any_link).find(|a| {
                            mailto_address(a.value().attr("href").unwrap_or_default()).is_none()
                        })
                    })
                    .and_then(|a| link_of(a, page.url)),
                salary: first_text(c, &salary),
                closebydate: first_text(c, &closing),
                description: first_text(c, &summary),
                othernotes: first_text(c, &department),
                emailcontact: c
                    .select(&mailto)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(mailto_address),
            })
            .collect();

        Ok(single_host(page.host, details))
    }
}
