use scraper::Html;
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing, Page};
use vacancy_core::traits::Extractor;

use super::dom::{
    child_elements, link_of, non_empty, require, selector, single_host, strip_label, text_of,
};

/// `<dl class="positions">`: each `dt` names a position, the `dd`s after it describe it.
///
/// A `dd` that starts with a known label fills that field; anything else is
/// appended to the description.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionList;

impl Extractor for DefinitionList {
    fn name(&self) -> &'static str {
        "definition_list"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        let doc = Html::parse_document(page.html);
        let list = require(&doc, "dl.positions, dl", "positions list")?;
        let anchor = selector("a[href]")?;

        let mut details: Vec<Detail> = Vec::new();
        for child in child_elements(list) {
            match child.value().name() {
                "dt" => details.push(Detail {
                    title: non_empty(text_of(child)),
                    applink: child.select(&anchor).next().and_then(|a| link_of(a, page.url)),
                    ..Detail::default()
                }),
                "dd" => {
                    // A dd before the first dt has nothing to describe.
                    let Some(current) = details.last_mut() else {
                        continue;
                    };
                    let text = text_of(child);
                    if let Some(salary) = strip_label(&text, &["salary", "pay"]) {
                        current.salary = non_empty(salary);
                    } else if let Some(closing) =
                        strip_label(&text, &["closing date", "closes", "deadline"])
                    {
                        current.closebydate = non_empty(closing);
                    } else if !text.is_empty() {
                        current.description = Some(match current.description.take() {
                            Some(existing) => format!("{existing} {text}"),
                            None => text,
                        });
                    }
                    if current.applink.is_none() {
                        current.applink =
                            child.select(&anchor).next().and_then(|a| link_of(a, page.url));
                    }
                }
                _ => {}
            }
        }

        Ok(single_host(page.host, details))
    }
}
