//! Per-layout HTML extractors.
//!
//! Each extractor understands one page layout and turns a fetched page into
//! listings. They are pure functions of the page: no I/O, no shared state.

mod dom;

pub mod accordion;
pub mod anchor_ancestors;
pub mod definition_list;
pub mod heading_list;
pub mod job_cards;
pub mod json_ld;
pub mod labeled_fields;
pub mod mailto_notices;
pub mod tabular_board;
pub mod trimmed_paragraphs;

pub use accordion::Accordion;
pub use anchor_ancestors::AnchorAncestors;
pub use definition_list::DefinitionList;
pub use heading_list::HeadingList;
pub use job_cards::JobCards;
pub use json_ld::JsonLd;
pub use labeled_fields::LabeledFields;
pub use mailto_notices::MailtoNotices;
pub use tabular_board::TabularBoard;
pub use trimmed_paragraphs::TrimmedParagraphs;
