//! Fixed-column grid layout of resolved page content.

use std::fmt;
use std::num::NonZeroUsize;

use super::collection::PageContent;
use super::index::PageIndex;

/// One grid position.
#[derive(Debug, PartialEq)]
pub enum Cell<'a, C> {
    /// A page and the content it resolved to.
    Page { index: PageIndex, content: &'a C },
    /// Padding after the last page, or an index with no content behind it.
    Empty,
}

impl<C> Clone for Cell<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Cell<'_, C> {}

impl<C> Cell<'_, C> {
    /// Returns the page index shown in this cell, if any.
    pub fn index(&self) -> Option<PageIndex> {
        match self {
            Self::Page { index, .. } => Some(*index),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Row-major grid of `rows * columns` page cells.
///
/// Only the leading cells, one per laid-out index, are stored. Every
/// position after them is [`Cell::Empty`].
#[derive(Debug, PartialEq)]
pub struct Grid<'a, C> {
    rows: usize,
    columns: NonZeroUsize,
    cells: Vec<Cell<'a, C>>,
}

impl<'a, C> Grid<'a, C> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns.get()
    }

    /// Returns the stored cells in row-major order, one per laid-out index.
    pub fn cells(&self) -> &[Cell<'a, C>] {
        &self.cells
    }

    /// Returns the number of grid positions, padding included.
    pub fn cell_count(&self) -> usize {
        self.rows.saturating_mul(self.columns.get())
    }

    /// Returns the cell at row-major `position`; positions past the stored
    /// cells are empty.
    pub fn cell(&self, position: usize) -> Cell<'a, C> {
        self.cells.get(position).copied().unwrap_or(Cell::Empty)
    }

    /// Returns the `columns` cells of row `row`, or nothing past the last row.
    pub fn row(&self, row: usize) -> impl Iterator<Item = Cell<'a, C>> + '_ {
        let columns = self.columns.get();
        let width = if row < self.rows { columns } else { 0 };
        let start = row.saturating_mul(columns);

        (0..width).map(move |col| self.cell(start + col))
    }

    /// Returns the number of cells showing a page.
    pub fn page_count(&self) -> usize {
        self.cells.iter().filter(|cell| !cell.is_empty()).count()
    }
}

/// Lays out `valid_indexes` row-major in a grid with `columns` columns.
///
/// Page index `i` resolves to `pages[i - 1]`. Cells after the last index are
/// [`Cell::Empty`], as is any index that `pages` does not cover.
pub fn render<'a, C>(
    pages: &'a [C],
    valid_indexes: &[PageIndex],
    columns: NonZeroUsize,
) -> Grid<'a, C> {
    let rows = valid_indexes.len().div_ceil(columns.get());

    let cells = valid_indexes
        .iter()
        .map(|&index| match pages.get(index.offset()) {
            Some(content) => Cell::Page { index, content },
            None => {
                log::warn!(
                    "Page {index} has no content ({} pages loaded), leaving cell empty",
                    pages.len()
                );
                Cell::Empty
            }
        })
        .collect();

    Grid {
        rows,
        columns,
        cells,
    }
}

impl fmt::Display for Grid<'_, PageContent> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self
            .cells
            .iter()
            .map(|cell| match cell {
                Cell::Page { index, content } => format!("p.{index} {}", content.file_name()),
                Cell::Empty => String::new(),
            })
            .collect();

        // Only columns that hold a stored cell can need any width.
        let columns = self.columns.get();
        let used_columns = columns.min(labels.len());
        let widths: Vec<usize> = (0..used_columns)
            .map(|col| {
                labels
                    .iter()
                    .skip(col)
                    .step_by(columns)
                    .map(|label| label.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for row in labels.chunks(columns) {
            let filled = row
                .iter()
                .rposition(|label| !label.is_empty())
                .map_or(0, |last| last + 1);

            let line = row[..filled]
                .iter()
                .zip(&widths)
                .map(|(label, width)| format!("{label:<width$}"))
                .collect::<Vec<_>>()
                .join(" | ");
            writeln!(f, "{}", line.trim_end())?;
        }

        Ok(())
    }
}
