use scraper::Html;
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing, Page};
use vacancy_core::traits::Extractor;

use super::dom::{
    first_text, link_of, mailto_address, non_empty, require, selector, single_host, strip_label,
    text_of,
};

/// Notice board where applications go by email: `.notice` blocks with an
/// `h4` title, a `mailto:` contact and a few paragraphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailtoNotices;

impl Extractor for MailtoNotices {
    fn name(&self) -> &'static str {
        "mailto_notices"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        let doc = Html::parse_document(page.html);
        let board = require(&doc, ".vacancies, #vacancies", "vacancies board")?;

        let notice = selector(".notice")?;
        let title = selector("h4, h3")?;
        let links = selector("a[href]")?;
        let paragraphs = selector("p")?;

        let details = board
            .select(&notice)
            .map(|n| {
                let mut detail = Detail {
                    title: first_text(n, &title),
                    ..Detail::default()
                };

                for a in n.select(&links) {
                    let href = a.value().attr("href").unwrap_or_default();
                    match mailto_address(href) {
                        Some(address) if detail.emailcontact.is_none() => {
                            detail.emailcontact = Some(address);
                        }
                        Some(_) => {}
                        None if detail.applink.is_none() => detail.applink = link_of(a, page.url),
                        None => {}
                    }
                }

                let mut notes = Vec::new();
                for p in n.select(&paragraphs) {
                    let text = text_of(p);
                    if let Some(salary) = strip_label(&text, &["salary", "pay"]) {
                        detail.salary = non_empty(salary);
                    } else if let Some(closing) =
                        strip_label(&text, &["closing date", "closing", "deadline"])
                    {
                        detail.closebydate = non_empty(closing);
                    } else if text.is_empty() {
                        continue;
                    } else if detail.description.is_none() {
                        detail.description = Some(text);
                    } else {
                        notes.push(text);
                    }
                }
                detail.othernotes = non_empty(notes.join(" "));
                detail
            })
            .collect();

        Ok(single_host(page.host, details))
    }
}
