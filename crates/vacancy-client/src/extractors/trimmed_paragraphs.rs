use scraper::Html;
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing, Page};
use vacancy_core::traits::Extractor;

use super::dom::{
    after_prefix, child_elements, collapse, link_of, non_empty, require, selector, single_host,
    strip_label, text_of,
};

/// Intro paragraphs before the first posting.
const LEADING_PARAGRAPHS: usize = 2;
/// Footer paragraphs after the last posting.
const TRAILING_PARAGRAPHS: usize = 1;

const CLOSING_LABELS: &[&str] = &["closes", "closing date", "deadline"];

/// Free-form `#content` area where each paragraph is one posting, sandwiched
/// between a fixed intro and a fixed footer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimmedParagraphs;

impl Extractor for TrimmedParagraphs {
    fn name(&self) -> &'static str {
        "trimmed_paragraphs"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        let doc = Html::parse_document(page.html);
        let content = require(&doc, "#content", "content area")?;

        let paragraphs: Vec<_> = child_elements(content)
            .filter(|el| el.value().name() == "p")
            .collect();
        let framing = LEADING_PARAGRAPHS + TRAILING_PARAGRAPHS;
        if paragraphs.len() < framing {
            return Err(AppError::extraction(format!(
                "expected at least {framing} paragraphs in #content, found {}",
                paragraphs.len()
            )));
        }
        let postings = &paragraphs[LEADING_PARAGRAPHS..paragraphs.len() - TRAILING_PARAGRAPHS];

        let anchor = selector("a[href]")?;
        let strong = selector("strong, b")?;
        let em = selector("em, i")?;

        let details = postings
            .iter()
            .map(|p| {
                let link = p.select(&anchor).next();
                let title = link
                    .or_else(|| p.select(&strong).next())
                    .map(text_of)
                    .and_then(non_empty);

                let closing_note = p
                    .select(&em)
                    .map(text_of)
                    .find(|n| strip_label(n, CLOSING_LABELS).is_some());
                let closebydate = closing_note
                    .as_deref()
                    .and_then(|n| strip_label(n, CLOSING_LABELS))
                    .and_then(non_empty);

                let mut body = text_of(*p);
                if let Some(note) = &closing_note {
                    body = body.replace(note.as_str(), "");
                }
                let body = match &title {
                    Some(t) => after_prefix(body.trim(), t),
                    None => body,
                };

                Detail {
                    title,
                    applink: link.and_then(|a| link_of(a, page.url)),
                    closebydate,
                    description: non_empty(collapse([body.as_str()])),
                    ..Detail::default()
                }
            })
            .collect();

        Ok(single_host(page.host, details))
    }
}
