use scraper::{ElementRef, Html};
use vacancy_core::error::AppError;
use vacancy_core::models::{Detail, JobListing, Page};
use vacancy_core::traits::Extractor;

use super::dom::{child_elements, link_of, non_empty, require, selector, text_of};

/// Header and filter rows at the top of the table.
const LEADING_ROWS: usize = 2;

// 1-based column positions.
const TITLE_COL: usize = 1;
const CLOSING_COL: usize = 3;
const SALARY_COL: usize = 5;
const EMPLOYER_COL: usize = 7;

/// Multi-employer job board laid out as one big table.
///
/// Every data row is a posting from the employer named in column 7, so each
/// row becomes its own listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularBoard;

impl Extractor for TabularBoard {
    fn name(&self) -> &'static str {
        "tabular_board"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Vec<JobListing>, AppError> {
        let doc = Html::parse_document(page.html);
        let table = require(&doc, "table", "job table")?;
        let tr = selector("tr")?;
        let anchor = selector("a[href]")?;

        let rows: Vec<ElementRef<'_>> = table.select(&tr).collect();
        if rows.len() < LEADING_ROWS {
            return Err(AppError::extraction(format!(
                "job table has {} rows, expected at least {LEADING_ROWS} header rows",
                rows.len()
            )));
        }

        let mut listings = Vec::new();
        for (index, row) in rows.iter().enumerate().skip(LEADING_ROWS) {
            let cells: Vec<ElementRef<'_>> = child_elements(*row)
                .filter(|c| matches!(c.value().name(), "td" | "th"))
                .collect();
            if cells.is_empty() {
                continue;
            }
            if cells.len() < EMPLOYER_COL {
                return Err(AppError::extraction(format!(
                    "row {} has {} columns, expected at least {EMPLOYER_COL}",
                    index + 1,
                    cells.len()
                )));
            }
            let cell = |col: usize| cells[col - 1];

            let detail = Detail {
                title: non_empty(text_of(cell(TITLE_COL))),
                applink: cell(TITLE_COL)
                    .select(&anchor)
                    .next()
                    .and_then(|a| link_of(a, page.url)),
                closebydate: non_empty(text_of(cell(CLOSING_COL))),
                salary: non_empty(text_of(cell(SALARY_COL))),
                ..Detail::default()
            };
            let employer = non_empty(text_of(cell(EMPLOYER_COL)));
            listings.push(JobListing::new(
                employer.as_deref().unwrap_or(page.host),
                vec![detail],
            ));
        }

        Ok(listings)
    }
}
