use scraper::{ElementRef, Html};
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing, Page};
use vacancy_core::traits::Extractor;

use super::dom::{
    following_elements, has_class, link_of, non_empty, require, selector, single_host,
    strip_label, text_of,
};

/// Collapsible list: a `button.accordion` per job, its details in the `.panel`
/// that follows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accordion;

/// The `.panel` belonging to a toggle: its next element sibling, if that is one.
fn panel_for(toggle: ElementRef<'_>) -> Option<ElementRef<'_>> {
    following_elements(toggle)
        .next()
        .filter(|el| has_class(*el, "panel"))
}

impl Extractor for Accordion {
    fn name(&self) -> &'static str {
        "accordion"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        let doc = Html::parse_document(page.html);
        let group = require(&doc, ".accordion-group", "accordion group")?;

        let toggle = selector("button.accordion, .accordion-toggle")?;
        let paragraphs = selector("p")?;
        let link = selector("a[href]")?;
        let emphasis = selector("em")?;

        let mut details = Vec::new();
        for t in group.select(&toggle) {
            let mut detail = Detail {
                title: non_empty(text_of(t)),
                ..Detail::default()
            };
            let Some(panel) = panel_for(t) else {
                details.push(detail);
                continue;
            };

            // Emphasised notes and link paragraphs are read separately below.
            let is_plain = |p: ElementRef<'_>| {
                p.select(&emphasis).next().is_none() && p.select(&link).next().is_none()
            };
            let mut description = Vec::new();
            for p in panel.select(&paragraphs) {
                let text = text_of(p);
                if let Some(salary) = strip_label(&text, &["salary", "pay"]) {
                    detail.salary = non_empty(salary);
                } else if let Some(closing) =
                    strip_label(&text, &["closing date", "closes", "deadline"])
                {
                    detail.closebydate = non_empty(closing);
                } else if !text.is_empty() && is_plain(p) {
                    description.push(text);
                }
            }
            detail.description = non_empty(description.join(" "));
            detail.othernotes = non_empty(
                panel
                    .select(&emphasis)
                    .map(text_of)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            detail.applink = panel.select(&link).next().and_then(|a| link_of(a, page.url));
            details.push(detail);
        }

        Ok(single_host(page.host, details))
    }
}
