use std::fmt;

use anyhow::anyhow;
use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::{
    error::FetchError,
    layout::ColumnLayout,
    models::CourseRecord,
    text_manipulators::{closest, extract_text, row_cells},
};

/// What the parser saw, reported back when a page yields no courses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostics {
    pub tables_found: usize,
    pub target_table_found: bool,
    /// Row count of the target table, when one was found.
    pub target_rows: Option<usize>,
}

impl fmt::Display for ParseDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Found {} tables. Target table found: {}. ",
            self.tables_found, self.target_table_found
        )?;
        if let Some(rows) = self.target_rows {
            write!(f, "Rows: {rows}. ")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct ResultPage {
    pub student_name: Option<String>,
    pub courses: Vec<CourseRecord>,
    pub diagnostics: ParseDiagnostics,
}

pub struct ResultPageParser {
    name_marker: Regex,
    table_marker: Regex,
    table_selector: Selector,
    row_selector: Selector,
    layout: ColumnLayout,
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e:?}"))
}

/// First element whose own text matches `marker`.
fn find_marker<'a>(root: ElementRef<'a>, marker: &Regex) -> Option<ElementRef<'a>> {
    root.descendants()
        .filter(|node| {
            node.value()
                .as_text()
                .is_some_and(|text| marker.is_match(text))
        })
        .find_map(|node| node.parent().and_then(ElementRef::wrap))
}

impl ResultPageParser {
    pub fn new(layout: ColumnLayout) -> anyhow::Result<Self> {
        Ok(Self {
            name_marker: Regex::new(r"(?i)student full name")?,
            table_marker: Regex::new(r"(?i)course code")?,
            table_selector: selector("table")?,
            row_selector: selector("tr")?,
            layout,
        })
    }

    /// Parses a result page. The row holding the "Course Code" marker is a
    /// header and is never returned as a course, whatever its cell count.
    pub fn parse(&self, html: &str) -> Result<ResultPage, FetchError> {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let student_name = self.student_name(root);
        let tables_found = document.select(&self.table_selector).count();

        // First table in document order with the marker anywhere inside it,
        // so an outer table wins over one nested in it.
        let target = document
            .select(&self.table_selector)
            .find(|table| table.text().any(|text| self.table_marker.is_match(text)));

        let Some(target) = target else {
            return Ok(ResultPage {
                student_name,
                courses: vec![],
                diagnostics: ParseDiagnostics {
                    tables_found,
                    target_table_found: false,
                    target_rows: None,
                },
            });
        };

        // Only a header row owned by the target lines up with its data rows.
        let header_row = find_marker(target, &self.table_marker)
            .and_then(|marker| closest(marker, "tr"))
            .filter(|row| closest(*row, "table").map(|t| t.id()) == Some(target.id()));

        if let Some(header_row) = header_row {
            self.check_header(header_row)?;
        }

        let all_rows = target.select(&self.row_selector).count();
        let courses = target
            .select(&self.row_selector)
            .filter(|row| closest(*row, "table").map(|t| t.id()) == Some(target.id()))
            .filter(|row| header_row.map(|h| h.id()) != Some(row.id()))
            .filter_map(|row| self.course_from_row(row))
            .collect();

        Ok(ResultPage {
            student_name,
            courses,
            diagnostics: ParseDiagnostics {
                tables_found,
                target_table_found: true,
                target_rows: Some(all_rows),
            },
        })
    }

    fn student_name(&self, root: ElementRef) -> Option<String> {
        let marker = find_marker(root, &self.name_marker)?;
        let row = closest(marker, "tr")?;
        let cell = row_cells(row, &["td"]).into_iter().nth(1)?;
        Some(extract_text(cell))
    }

    fn check_header(&self, header_row: ElementRef) -> Result<(), FetchError> {
        let cells: Vec<String> = row_cells(header_row, &["td", "th"])
            .into_iter()
            .map(extract_text)
            .collect();
        if !self.layout.qualifies(cells.len()) {
            debug!(
                "header row has {} cells, skipping layout check",
                cells.len()
            );
            return Ok(());
        }
        match self.layout.find_header_mismatch(&cells) {
            Some((column, found)) => Err(FetchError::LayoutMismatch {
                field: column.field,
                index: column.index,
                found,
            }),
            None => Ok(()),
        }
    }

    fn course_from_row(&self, row: ElementRef) -> Option<CourseRecord> {
        let cells = row_cells(row, &["td"]);
        if !self.layout.qualifies(cells.len()) {
            return None;
        }
        let mut course = CourseRecord::default();
        for column in &self.layout.columns {
            let value = cells.get(column.index).map(|c| extract_text(*c));
            course.set(column.field, value.unwrap_or_default());
        }
        Some(course)
    }
}
