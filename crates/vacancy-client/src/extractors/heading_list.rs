use scraper::{ElementRef, Html};
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing, Page};
use vacancy_core::traits::Extractor;

use super::dom::{
    after_prefix, following_elements, is_heading, link_of, non_empty, selector, single_host,
    text_of,
};

/// Heading keywords that mark the start of the openings section.
const ANCHOR_KEYWORDS: &[&str] = &["opening", "vacanc", "position"];

/// Page where openings are a plain list under a heading such as "Current Openings".
///
/// The heading is the anchor; the list lives somewhere in the siblings that
/// follow it, up to the next heading. Some templates wrap the heading in its
/// own `div`, in which case the walk restarts from the wrapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingList;

impl Extractor for HeadingList {
    fn name(&self) -> &'static str {
        "heading_list"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        let doc = Html::parse_document(page.html);
        let headings = selector("h1, h2, h3, h4")?;

        let heading = doc
            .select(&headings)
            .find(|h| {
                let text = text_of(*h).to_lowercase();
                ANCHOR_KEYWORDS.iter().any(|k| text.contains(k))
            })
            .ok_or_else(|| AppError::extraction("no openings heading found"))?;

        let mut items = list_items_after(heading);
        if items.is_empty() {
            if let Some(wrapper) = heading.parent().and_then(ElementRef::wrap) {
                items = list_items_after(wrapper);
            }
        }

        let anchor = selector("a[href]")?;
        let details = items
            .into_iter()
            .map(|li| {
                let link = li.select(&anchor).next();
                let full = text_of(li);
                let title = link.map(text_of).and_then(non_empty);
                let description = match &title {
                    Some(t) => non_empty(after_prefix(&full, t)),
                    None => None,
                };
                Detail {
                    title: title.or_else(|| non_empty(full)),
                    applink: link.and_then(|a| link_of(a, page.url)),
                    description,
                    ..Detail::default()
                }
            })
            .collect();

        Ok(single_host(page.host, details))
    }
}

/// `li` elements found in the siblings after `start`, stopping at the next heading.
fn list_items_after(start: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut items = Vec::new();
    for sibling in following_elements(start) {
        if is_heading(sibling) {
            break;
        }
        match sibling.value().name() {
            "ul" | "ol" => {
                let direct = sibling
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| c.value().name() == "li");
                items.extend(direct);
            }
            _ => {
                let nested = sibling
                    .descendants()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "li");
                items.extend(nested);
            }
        }
    }
    items
}
