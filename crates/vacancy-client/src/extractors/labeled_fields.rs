use scraper::{ElementRef, Html};
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing, Page};
use vacancy_core::traits::Extractor;

use super::dom::{
    collapse, first_text, link_of, mailto_address, non_empty, require, selector, single_host,
    text_of,
};

/// `.posting` blocks whose fields are written as `<strong>Label:</strong> value`.
///
/// The value of a label is whatever follows it up to the next label or line
/// break, so it is read by walking the label's next siblings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabeledFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Salary,
    Closing,
    Contact,
    Notes,
    Description,
}

fn field_for(label: &str) -> Option<Field> {
    let label = label.trim().trim_end_matches(':').trim().to_lowercase();
    match label.as_str() {
        "salary" | "pay" | "compensation" | "wage" => Some(Field::Salary),
        "closing date" | "closes" | "deadline" | "apply by" => Some(Field::Closing),
        "contact" | "email" | "e-mail" => Some(Field::Contact),
        "notes" | "note" | "other" | "additional information" => Some(Field::Notes),
        "description" | "summary" | "duties" => Some(Field::Description),
        _ => None,
    }
}

fn is_label(el: ElementRef<'_>) -> bool {
    matches!(el.value().name(), "strong" | "b")
}

/// Text after a label up to the next label or `<br>`, plus any mailto address in it.
fn label_value(label: ElementRef<'_>) -> (String, Option<String>) {
    let mut parts: Vec<String> = Vec::new();
    let mut mailto = None;

    for node in label.next_siblings() {
        if let Some(text) = node.value().as_text() {
            parts.push(text.to_string());
            continue;
        }
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };
        if is_label(el) || el.value().name() == "br" {
            break;
        }
        if el.value().name() == "a" && mailto.is_none() {
            mailto = el.value().attr("href").and_then(mailto_address);
        }
        parts.push(text_of(el));
    }

    (collapse(parts.iter().map(String::as_str)), mailto)
}

impl Extractor for LabeledFields {
    fn name(&self) -> &'static str {
        "labeled_fields"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        let doc = Html::parse_document(page.html);
        let container = require(&doc, ".postings, #postings", "postings container")?;

        let posting = selector(".posting")?;
        let heading = selector("h2, h3, h4")?;
        let heading_link = selector("h2 a[href], h3 a[href], h4 a[href], a.apply[href]")?;
        let labels = selector("strong, b")?;

        let details = container
            .select(&posting)
            .map(|p| {
                let mut detail = Detail {
                    title: first_text(p, &heading),
                    applink: p.select(&heading_link).next().and_then(|a| link_of(a, page.url)),
                    ..Detail::default()
                };

                for label in p.select(&labels) {
                    let Some(field) = field_for(&text_of(label)) else {
                        continue;
                    };
                    let (value, mailto) = label_value(label);
                    match field {
                        Field::Salary => detail.salary = non_empty(value),
                        Field::Closing => detail.closebydate = non_empty(value),
                        Field::Contact => detail.emailcontact = mailto.or_else(|| non_empty(value)),
                        Field::Notes => detail.othernotes = non_empty(value),
                        Field::Description => detail.description = non_empty(value),
                    }
                }
                detail
            })
            .collect();

        Ok(single_host(page.host, details))
    }
}
