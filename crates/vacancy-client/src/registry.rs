//! Extractor kinds and the configured source list.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;
use vacancy_core::error::AppError;
use vacancy_core::models::Source;
use vacancy_core::traits::Extractor;

use crate::extractors::{
    Accordion, AnchorAncestors, DefinitionList, HeadingList, JobCards, JsonLd, LabeledFields,
    MailtoNotices, TabularBoard, TrimmedParagraphs,
};

/// Which page layout a source uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    TabularBoard,
    HeadingList,
    JobCards,
    DefinitionList,
    LabeledFields,
    TrimmedParagraphs,
    AnchorAncestors,
    JsonLd,
    MailtoNotices,
    Accordion,
}

impl ExtractorKind {
    pub const ALL: [ExtractorKind; 10] = [
        ExtractorKind::TabularBoard,
        ExtractorKind::HeadingList,
        ExtractorKind::JobCards,
        ExtractorKind::DefinitionList,
        ExtractorKind::LabeledFields,
        ExtractorKind::TrimmedParagraphs,
        ExtractorKind::AnchorAncestors,
        ExtractorKind::JsonLd,
        ExtractorKind::MailtoNotices,
        ExtractorKind::Accordion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractorKind::TabularBoard => "tabular_board",
            ExtractorKind::HeadingList => "heading_list",
            ExtractorKind::JobCards => "job_cards",
            ExtractorKind::DefinitionList => "definition_list",
            ExtractorKind::LabeledFields => "labeled_fields",
            ExtractorKind::TrimmedParagraphs => "trimmed_paragraphs",
            ExtractorKind::AnchorAncestors => "anchor_ancestors",
            ExtractorKind::JsonLd => "json_ld",
            ExtractorKind::MailtoNotices => "mailto_notices",
            ExtractorKind::Accordion => "accordion",
        }
    }

    pub fn extractor(&self) -> Arc<dyn Extractor> {
        match self {
            ExtractorKind::TabularBoard => Arc::new(TabularBoard),
            ExtractorKind::HeadingList => Arc::new(HeadingList),
            ExtractorKind::JobCards => Arc::new(JobCards),
            ExtractorKind::DefinitionList => Arc::new(DefinitionList),
            ExtractorKind::LabeledFields => Arc::new(LabeledFields),
            ExtractorKind::TrimmedParagraphs => Arc::new(TrimmedParagraphs),
            ExtractorKind::AnchorAncestors => Arc::new(AnchorAncestors),
            ExtractorKind::JsonLd => Arc::new(JsonLd),
            ExtractorKind::MailtoNotices => Arc::new(MailtoNotices),
            ExtractorKind::Accordion => Arc::new(Accordion),
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtractorKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        ExtractorKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| AppError::ConfigError(format!("Unknown extractor kind: {s}")))
    }
}

/// One entry of a sources file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub id: String,
    pub url: String,
    pub host: String,
    pub extractor: ExtractorKind,
}

impl SourceSpec {
    fn new(id: &str, url: &str, host: &str, extractor: ExtractorKind) -> Self {
        Self {
            id: id.to_string(),
            url: url.to_string(),
            host: host.to_string(),
            extractor,
        }
    }
}

/// The built-in registry, one career page per layout.
pub fn default_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec::new(
            "valley-jobs-board",
            "https://jobs.valley-chamber.example/openings",
            "Valley Chamber Jobs Board",
            ExtractorKind::TabularBoard,
        ),
        SourceSpec::new(
            "northfield-library",
            "https://www.northfield-library.example/about/jobs",
            "Northfield Public Library",
            ExtractorKind::HeadingList,
        ),
        SourceSpec::new(
            "mercy-valley-hospital",
            "https://careers.mercy-valley.example/",
            "Mercy Valley Hospital",
            ExtractorKind::JobCards,
        ),
        SourceSpec::new(
            "riverbend-schools",
            "https://www.riverbend-schools.example/district/hr/",
            "Riverbend School District",
            ExtractorKind::DefinitionList,
        ),
        SourceSpec::new(
            "tri-county-water",
            "https://www.tricounty-water.example/jobs",
            "Tri-County Water Authority",
            ExtractorKind::LabeledFields,
        ),
        SourceSpec::new(
            "example-county",
            "https://www.example-county.example/hr/openings.html",
            "Example County",
            ExtractorKind::TrimmedParagraphs,
        ),
        SourceSpec::new(
            "metro-transit",
            "https://www.metro-transit.example/about/careers",
            "Metro Transit",
            ExtractorKind::AnchorAncestors,
        ),
        SourceSpec::new(
            "regional-jobs",
            "https://jobs.regional-board.example/",
            "Regional Jobs Board",
            ExtractorKind::JsonLd,
        ),
        SourceSpec::new(
            "st-example-parish",
            "https://www.st-example-parish.example/news/vacancies",
            "St. Example Parish",
            ExtractorKind::MailtoNotices,
        ),
        SourceSpec::new(
            "example-college",
            "https://www.example-college.example/hr/",
            "Example Community College",
            ExtractorKind::Accordion,
        ),
    ]
}

/// Parse a sources file: a JSON array of `{id, url, host, extractor}`.
pub fn parse_sources(json: &str) -> Result<Vec<SourceSpec>, AppError> {
    serde_json::from_str(json)
        .map_err(|e| AppError::ConfigError(format!("Invalid sources file: {e}")))
}

pub fn load_sources(path: &Path) -> Result<Vec<SourceSpec>, AppError> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!("Cannot read sources file {}: {e}", path.display()))
    })?;
    parse_sources(&json)
}

/// Validate specs and bind each one to its extractor.
///
/// Ids must be unique, URLs absolute `http`/`https`, and the list non-empty.
pub fn build_sources(specs: &[SourceSpec]) -> Result<Arc<[Source]>, AppError> {
    if specs.is_empty() {
        return Err(AppError::ConfigError("No sources configured".into()));
    }

    let mut ids = HashSet::new();
    let mut sources = Vec::with_capacity(specs.len());
    for spec in specs {
        if spec.id.trim().is_empty() {
            return Err(AppError::ConfigError(format!(
                "Source with url {} has an empty id",
                spec.url
            )));
        }
        if !ids.insert(spec.id.as_str()) {
            return Err(AppError::ConfigError(format!(
                "Duplicate source id: {}",
                spec.id
            )));
        }
        validate_source_url(&spec.id, &spec.url)?;

        sources.push(Source::new(
            &spec.id,
            &spec.url,
            &spec.host,
            spec.extractor.extractor(),
        ));
    }
    Ok(sources.into())
}

fn validate_source_url(id: &str, url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(url)
        .map_err(|e| AppError::ConfigError(format!("Source {id}: invalid URL '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::ConfigError(format!(
            "Source {id}: URL scheme '{scheme}' is not allowed (only http/https)"
        ))),
    }
}
