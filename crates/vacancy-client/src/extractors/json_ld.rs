use scraper::Html;
use serde_json::Value;
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing, Page};
use vacancy_core::traits::Extractor;

use super::dom::{collapse, non_empty, resolve_href, selector};

/// Structured data: `JobPosting` objects in `application/ld+json` scripts.
///
/// Postings are grouped by `hiringOrganization.name`, so a board that lists
/// jobs for several employers yields one listing per employer, in the order
/// each employer first appears.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLd;

impl Extractor for JsonLd {
    fn name(&self) -> &'static str {
        "json_ld"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        let doc = Html::parse_document(page.html);
        let scripts = selector(r#"script[type="application/ld+json"]"#)?;

        let mut values: Vec<Value> = Vec::new();
        for (i, script) in doc.select(&scripts).enumerate() {
            let raw: String = script.text().collect();
            let value = serde_json::from_str(raw.trim()).map_err(|e| {
                AppError::extraction(format!("invalid JSON-LD in script {}: {e}", i + 1))
            })?;
            values.push(value);
        }
        // The scripts are this layout's anchor; a page without any has drifted.
        if values.is_empty() {
            return Err(AppError::extraction("no JSON-LD script found"));
        }

        let mut postings = Vec::new();
        for value in &values {
            collect_postings(value, &mut postings);
        }

        let mut listings: Vec<JobListing> = Vec::new();
        for posting in postings {
            let host = string_at(posting, &["hiringOrganization", "name"])
                .unwrap_or_else(|| page.host.to_string());
            let detail = to_detail(posting, page.url);
            if detail.is_empty() {
                continue;
            }
            match listings.iter_mut().find(|l| l.host == host) {
                Some(listing) => listing.details.push(detail),
                None => listings.push(JobListing::new(host, vec![detail])),
            }
        }
        Ok(listings)
    }
}

fn is_job_posting(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "JobPosting",
        Some(Value::Array(types)) => types.iter().any(|t| t == "JobPosting"),
        _ => false,
    }
}

/// Walk arrays and `@graph` containers, collecting every `JobPosting` object.
fn collect_postings<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_postings(item, out);
            }
        }
        Value::Object(map) => {
            if is_job_posting(value) {
                out.push(value);
            }
            if let Some(graph) = map.get("@graph") {
                collect_postings(graph, out);
            }
        }
        _ => {}
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(collapse([s.as_str()])),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(scalar_text)
}

/// A `QuantitativeValue` is either a single `value` or a `minValue`/`maxValue` range.
fn amount_figure(amount: &Value) -> Option<String> {
    let single = scalar_text(amount).or_else(|| amount.get("value").and_then(scalar_text));
    if single.is_some() {
        return single;
    }
    let min = amount.get("minValue").and_then(scalar_text);
    let max = amount.get("maxValue").and_then(scalar_text);
    match (min, max) {
        (Some(min), Some(max)) => Some(format!("{min}-{max}")),
        (one, other) => one.or(other),
    }
}

/// `baseSalary` may be a bare amount or a `MonetaryAmount` object.
fn salary_text(value: &Value) -> Option<String> {
    if let Some(text) = scalar_text(value) {
        return Some(text);
    }
    let amount = value.get("value")?;
    let figure = amount_figure(amount)?;

    let currency = value.get("currency").and_then(scalar_text);
    let unit = amount.get("unitText").and_then(scalar_text);
    let mut out = match currency {
        Some(c) => format!("{c} {figure}"),
        None => figure,
    };
    if let Some(unit) = unit {
        out.push_str(" per ");
        out.push_str(&unit.to_lowercase());
    }
    Some(out)
}

/// Descriptions are often HTML fragments; keep only their text.
fn plain_text(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    non_empty(collapse(fragment.root_element().text()))
}

fn to_detail(posting: &Value, base: &str) -> Detail {
    let employment = match posting.get("employmentType") {
        Some(Value::Array(kinds)) => {
            let kinds: Vec<String> = kinds.iter().filter_map(scalar_text).collect();
            non_empty(kinds.join(", "))
        }
        Some(other) => scalar_text(other),
        None => None,
    };

    Detail {
        applink: string_at(posting, &["url"]).map(|u| resolve_href(base, &u)),
        salary: posting.get("baseSalary").and_then(salary_text),
        title: string_at(posting, &["title"]),
        closebydate: string_at(posting, &["validThrough"]),
        description: posting
            .get("description")
            .and_then(Value::as_str)
            .and_then(plain_text),
        othernotes: employment,
        emailcontact: string_at(posting, &["applicationContact", "email"]),
    }
}
