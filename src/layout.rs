//! Column mapping for the portal's course table.
//!
//! The result page has no semantic markup for its course rows, so fields are
//! picked out of each row by position. The offsets and the minimum cell count
//! come from the portal's current page and live here, away from the parse loop.

use std::fmt;

/// Rows with fewer cells than this are headers or spacers.
pub const MIN_COURSE_CELLS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseField {
    Semester,
    CourseCode,
    CourseTitle,
    CreditHours,
    Total,
    Grade,
}

impl CourseField {
    /// Text expected in this field's header cell.
    pub fn label(&self) -> &'static str {
        match self {
            CourseField::Semester => "Semester",
            CourseField::CourseCode => "Course Code",
            CourseField::CourseTitle => "Course Title",
            CourseField::CreditHours => "Credit Hours",
            CourseField::Total => "Total",
            CourseField::Grade => "Grade",
        }
    }
}

impl fmt::Display for CourseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub index: usize,
    pub field: CourseField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub min_cells: usize,
    pub columns: Vec<ColumnSpec>,
}

impl ColumnLayout {
    pub fn new(min_cells: usize, columns: Vec<ColumnSpec>) -> anyhow::Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            if column.index >= min_cells {
                anyhow::bail!(
                    "column {} at index {} is outside a {}-cell row",
                    column.field,
                    column.index,
                    min_cells
                );
            }
            if columns[..i].iter().any(|other| other.field == column.field) {
                anyhow::bail!("column {} is mapped more than once", column.field);
            }
        }
        Ok(Self { min_cells, columns })
    }

    /// The layout of the portal's result table as currently served.
    pub fn standard() -> Self {
        let column = |index, field| ColumnSpec { index, field };
        Self {
            min_cells: MIN_COURSE_CELLS,
            columns: vec![
                column(1, CourseField::Semester),
                column(3, CourseField::CourseCode),
                column(4, CourseField::CourseTitle),
                column(5, CourseField::CreditHours),
                column(10, CourseField::Total),
                column(11, CourseField::Grade),
            ],
        }
    }

    pub fn qualifies(&self, cell_count: usize) -> bool {
        cell_count >= self.min_cells
    }

    /// Checks a header row against the expected labels.
    ///
    /// Returns the first mapped column whose header cell does not contain the
    /// field's label, along with the text actually found there.
    pub fn find_header_mismatch(&self, header_cells: &[String]) -> Option<(ColumnSpec, String)> {
        self.columns.iter().find_map(|column| {
            let found = header_cells.get(column.index).cloned().unwrap_or_default();
            let expected = column.field.label().to_lowercase();
            if found.to_lowercase().contains(&expected) {
                None
            } else {
                Some((*column, found))
            }
        })
    }
}
