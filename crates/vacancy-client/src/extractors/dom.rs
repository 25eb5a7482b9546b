//! Small DOM helpers shared by the extractors.

use scraper::{ElementRef, Html, Selector};
use url::Url;
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing};

pub(crate) fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::extraction(format!("invalid selector '{css}': {e}")))
}

/// First element matching `css`, or an extraction error naming what was expected.
pub(crate) fn require<'a>(doc: &'a Html, css: &str, what: &str) -> Result<ElementRef<'a>, AppError> {
    let sel = selector(css)?;
    let found = doc.select(&sel).next();
    found.ok_or_else(|| AppError::extraction(format!("{what} not found ({css})")))
}

/// Concatenate text fragments, collapsing runs of whitespace.
pub(crate) fn collapse<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let joined: String = parts.into_iter().collect();
    let mut out = String::new();
    for word in joined.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    collapse(el.text())
}

pub(crate) fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Text of the first descendant of `scope` matching `sel`.
pub(crate) fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope.select(sel).next().map(text_of).and_then(non_empty)
}

/// Element children of `el`, skipping text and comments.
pub(crate) fn child_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// Element siblings after `el`, in document order.
pub(crate) fn following_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.next_siblings().filter_map(ElementRef::wrap)
}

pub(crate) fn is_heading(el: ElementRef<'_>) -> bool {
    matches!(el.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Resolve `href` against the page URL. Absolute links are kept verbatim.
pub(crate) fn resolve_href(base: &str, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// The resolved `href` of an anchor, if it has a non-empty one.
pub(crate) fn link_of(anchor: ElementRef<'_>, base: &str) -> Option<String> {
    anchor
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| resolve_href(base, h))
}

/// The address part of a `mailto:` link, without any query string.
pub(crate) fn mailto_address(href: &str) -> Option<String> {
    let rest = href.trim();
    let rest = rest
        .get(..7)
        .filter(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
        .map(|_| &rest[7..])?;
    let address = rest.split('?').next().unwrap_or_default().trim();
    non_empty(address.to_string())
}

/// If `text` starts with one of `labels` (case-insensitive, as a whole word),
/// return what follows it, minus a separating colon.
pub(crate) fn strip_label(text: &str, labels: &[&str]) -> Option<String> {
    labels.iter().find_map(|label| {
        let head = text.get(..label.len())?;
        if !head.eq_ignore_ascii_case(label) {
            return None;
        }
        let rest = &text[label.len()..];
        // "Payroll" is not the "pay" label.
        if rest.chars().next().is_some_and(|c| c != ':' && !c.is_whitespace()) {
            return None;
        }
        Some(rest.trim_start().trim_start_matches(':').trim().to_string())
    })
}

/// `text` without a leading `prefix`, trimmed of separators.
pub(crate) fn after_prefix(text: &str, prefix: &str) -> String {
    text.strip_prefix(prefix)
        .unwrap_or(text)
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '|'))
        .trim()
        .to_string()
}

/// Wrap a single organization's details; no postings means no listing at all.
pub(crate) fn single_host(host: &str, details: Vec<Detail>) -> Vec<JobListing> {
    let details: Vec<Detail> = details.into_iter().filter(|d| !d.is_empty()).collect();
    if details.is_empty() {
        Vec::new()
    } else {
        vec![JobListing::new(host, details)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse(["  Senior\n\t", " Analyst  "]), "Senior Analyst");
        assert_eq!(collapse(["   "]), "");
    }

    #[test]
    fn test_resolve_href() {
        let base = "https://careers.example.org/jobs/index.html";
        assert_eq!(
            resolve_href(base, "/apply?id=4"),
            "https://careers.example.org/apply?id=4"
        );
        assert_eq!(
            resolve_href(base, "posting-7.html"),
            "https://careers.example.org/jobs/posting-7.html"
        );
        assert_eq!(
            resolve_href(base, "https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }

    #[test]
    fn test_mailto_address() {
        assert_eq!(
            mailto_address("mailto:hr@example.org?subject=Clerk").as_deref(),
            Some("hr@example.org")
        );
        assert_eq!(
            mailto_address("MAILTO:jobs@example.org").as_deref(),
            Some("jobs@example.org")
        );
        assert_eq!(mailto_address("https://example.org"), None);
        assert_eq!(mailto_address("mailto:"), None);
    }

    #[test]
    fn test_strip_label() {
        assert_eq!(
            strip_label("Salary: $41,000", &["salary"]).as_deref(),
            Some("$41,000")
        );
        assert_eq!(
            strip_label("CLOSING DATE : May 3", &["closing date", "closes"]).as_deref(),
            Some("May 3")
        );
        assert_eq!(strip_label("Benefits included", &["salary"]), None);
        assert_eq!(strip_label("Pay", &["salary", "pay"]).as_deref(), Some(""));
    }

    #[test]
    fn test_strip_label_needs_word_boundary() {
        let pay = &["salary", "pay"];
        assert_eq!(strip_label("Payroll experience preferred.", pay), None);
        assert_eq!(strip_label("Payment of union dues is required.", pay), None);
        assert_eq!(strip_label("Salaryman wanted", pay), None);
        assert_eq!(strip_label("Pay  $18/hr", pay).as_deref(), Some("$18/hr"));

        let closing = &["closing date", "closing", "closes", "deadline"];
        assert_eq!(strip_label("Closest bus stop is Main St.", closing), None);
        assert_eq!(strip_label("Closings happen at 9pm.", closing), None);
        assert_eq!(strip_label("Deadlines are tight here.", closing), None);
        assert_eq!(
            strip_label("Closes: Nov 30", closing).as_deref(),
            Some("Nov 30")
        );
    }

    #[test]
    fn test_after_prefix() {
        assert_eq!(
            after_prefix("Park Ranger – seasonal, 20 hrs", "Park Ranger"),
            "seasonal, 20 hrs"
        );
        assert_eq!(after_prefix("Unrelated text", "Title"), "Unrelated text");
    }

    #[test]
    fn test_single_host_drops_empty() {
        assert!(single_host("Acme", vec![Detail::default()]).is_empty());
        let listings = single_host(
            "Acme",
            vec![Detail {
                title: Some("Welder".into()),
                ..Detail::default()
            }],
        );
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].host, "Acme");
    }

    #[test]
    fn test_require_reports_missing_node() {
        let doc = Html::parse_document("<p>nothing here</p>");
        let err = require(&doc, "table", "job table").unwrap_err();
        assert!(err.to_string().contains("job table not found"));
    }
}
