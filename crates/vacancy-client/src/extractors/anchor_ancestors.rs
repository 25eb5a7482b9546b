use std::collections::HashSet;

use scraper::{ElementRef, Html};
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing, Page};
use vacancy_core::traits::Extractor;

use super::dom::{first_text, has_class, link_of, non_empty, require, selector, single_host, text_of};

/// Careers page where each opening is a link to `/job...` and its other
/// fields sit somewhere in the surrounding row.
///
/// Every job link climbs to its nearest row-like ancestor (`li`, `tr` or
/// `.job-row`); the row is read once even if it holds several job links.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorAncestors;

fn is_row(el: ElementRef<'_>) -> bool {
    matches!(el.value().name(), "li" | "tr") || has_class(el, "job-row")
}

fn row_of(anchor: ElementRef<'_>) -> Option<ElementRef<'_>> {
    anchor.ancestors().filter_map(ElementRef::wrap).find(|el| is_row(*el))
}

impl Extractor for AnchorAncestors {
    fn name(&self) -> &'static str {
        "anchor_ancestors"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        let doc = Html::parse_document(page.html);
        let scope = require(&doc, "#careers, .careers, main", "careers section")?;

        let job_link = selector(r#"a[href*="/job"]"#)?;
        let pay = selector(".pay, .salary")?;
        let deadline = selector(".deadline, .closing")?;
        let location = selector(".location")?;
        let summary = selector(".summary")?;

        let mut seen = HashSet::new();
        let mut details = Vec::new();
        for anchor in scope.select(&job_link) {
            let Some(row) = row_of(anchor) else {
                continue;
            };
            if !seen.insert(row.id()) {
                continue;
            }
            details.push(Detail {
                title: non_empty(text_of(anchor)),
                applink: link_of(anchor, page.url),
                salary: first_text(row, &pay),
                closebydate: first_text(row, &deadline),
                othernotes: first_text(row, &location),
                description: first_text(row, &summary),
                ..Detail::default()
            });
        }

        Ok(single_host(page.host, details))
    }
}
