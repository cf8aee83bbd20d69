//! Dense-grid construction from an HTML `<table>` subtree.
//!
//! Publisher tables arrive with rowspans, colspans, and routinely broken
//! markup (missing `<td>`s, spans that overrun the table). This module
//! projects a table onto a rectangular grid of trimmed cell strings so the
//! parser downstream can reason about columns positionally.
//!
//! Spanned regions are remembered in the cell encoding itself: the first
//! column of each row covered by a colspan holds an [`GridCell::Anchor`]
//! carrying the declared width, the remaining columns hold
//! [`GridCell::Continuation`]s, and rowspan-only spans duplicate their text
//! as plain [`GridCell::Text`]. Header interpretation needs all three
//! distinctions, so they are preserved rather than collapsed.

use coordex_core::{CoordexError, ParseOptions, Result};
use scraper::ElementRef;

/// Spans beyond this are treated as malformed markup, not data.
const SPAN_SANITY: usize = 1000;

/// One cell of a reconstructed grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCell {
    /// An ordinary cell (or the duplicated text of a rowspan-only span).
    Text(String),
    /// First column of a region covered by a colspan > 1.
    Anchor { text: String, colspan: usize },
    /// Any other column of a multi-column span.
    Continuation { text: String },
}

impl GridCell {
    /// The cell's text regardless of span role.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Text(t) | Self::Continuation { text: t } | Self::Anchor { text: t, .. } => t,
        }
    }

    /// True for anchor and continuation cells of a multi-column span.
    #[inline]
    #[must_use]
    pub const fn is_marker(&self) -> bool {
        !matches!(self, Self::Text(_))
    }

    /// True when the cell holds no text and is not part of a span.
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(t) if t.trim().is_empty())
    }
}

/// A rectangular projection of an HTML table.
///
/// Every row has exactly [`n_cols`](Self::n_cols) cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    n_cols: usize,
    rows: Vec<Vec<GridCell>>,
}

impl Grid {
    #[inline]
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub const fn n_cols(&self) -> usize {
        self.n_cols
    }

    #[inline]
    #[must_use]
    pub fn row(&self, i: usize) -> &[GridCell] {
        &self.rows[i]
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> impl Iterator<Item = &[GridCell]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Grid under construction: cells are `None` until a placement claims them.
struct GridAccum {
    n_cols: usize,
    rows: Vec<Vec<Option<GridCell>>>,
}

impl GridAccum {
    fn new(n_cols: usize) -> Self {
        Self {
            n_cols,
            rows: Vec::new(),
        }
    }

    /// First still-unclaimed position in row-major order.
    fn next_open(&self) -> Option<(usize, usize)> {
        self.rows.iter().enumerate().find_map(|(ri, row)| {
            row.iter()
                .position(Option::is_none)
                .map(|ci| (ri, ci))
        })
    }

    /// Unclaimed cell count in a row; rows not yet materialized are fully
    /// open.
    fn open_cells_in_row(&self, ri: usize) -> usize {
        self.rows
            .get(ri)
            .map_or(self.n_cols, |row| row.iter().filter(|c| c.is_none()).count())
    }

    /// Place a cell's text over an `rowspan` x `colspan` region starting at
    /// the insertion cursor, materializing rows as needed. The colspan is
    /// clamped to the grid edge.
    fn place(&mut self, text: &str, rowspan: usize, colspan: usize) {
        let (ri, ci) = self.next_open().unwrap_or((self.rows.len(), 0));
        while self.rows.len() < ri + rowspan {
            self.rows.push(vec![None; self.n_cols]);
        }
        let colspan = colspan.min(self.n_cols - ci).max(1);
        for r in 0..rowspan {
            for c in 0..colspan {
                let cell = if colspan > 1 {
                    if c == 0 {
                        GridCell::Anchor {
                            text: text.to_string(),
                            colspan,
                        }
                    } else {
                        GridCell::Continuation {
                            text: text.to_string(),
                        }
                    }
                } else {
                    GridCell::Text(text.to_string())
                };
                self.rows[ri + r][ci + c] = Some(cell);
            }
        }
    }

    fn finish(self) -> Grid {
        let rows = self
            .rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|c| c.unwrap_or_else(|| GridCell::Text(String::new())))
                    .collect()
            })
            .collect();
        Grid {
            n_cols: self.n_cols,
            rows,
        }
    }
}

/// Build a [`Grid`] from a `<table>` element.
///
/// Returns `Ok(None)` when the table is structurally empty (no rows, or no
/// countable columns); the caller discards such tables. Malformed rows are
/// skipped under [`ParseOptions::ignore_bad_rows`], otherwise surfaced.
///
/// # Errors
/// Returns [`CoordexError::MalformedRow`] only when `ignore_bad_rows` is
/// off and a row declares structurally impossible spans.
pub fn build_grid(table: ElementRef<'_>, options: &ParseOptions) -> Result<Option<Grid>> {
    let all_rows = direct_rows(table);
    if all_rows.is_empty() {
        return Ok(None);
    }

    // Column-count estimation over the body rows. Careful mode takes the
    // row maximum; first-row headers routinely under-count.
    let body = body_rows(table, &all_rows);
    let n_cols = if options.careful_parsing {
        body.iter().map(|r| row_col_count(*r)).max().unwrap_or(0)
    } else {
        body.first().map_or(0, |r| row_col_count(*r))
    };
    if n_cols == 0 {
        return Ok(None);
    }

    let mut grid = GridAccum::new(n_cols);
    for row in &all_rows {
        if let Err(e) = place_row(&mut grid, *row, n_cols) {
            if options.ignore_bad_rows {
                if !options.silent_errors {
                    log::warn!("skipping malformed table row: {e}");
                }
            } else {
                return Err(e);
            }
        }
    }

    // Rowspan declarations that overrun the table leave fully unclaimed
    // trailing rows behind.
    while grid.rows.last().is_some_and(|r| r.iter().all(Option::is_none)) {
        grid.rows.pop();
    }
    if grid.rows.is_empty() {
        return Ok(None);
    }

    Ok(Some(grid.finish()))
}

fn place_row(grid: &mut GridAccum, row: ElementRef<'_>, n_cols: usize) -> Result<()> {
    let cells = direct_cells(row);
    let n_cells = cells.len();
    let mut cols_found = 0usize;

    for (i, cell) in cells.iter().enumerate() {
        let rowspan = span_attr(*cell, "rowspan");
        let mut colspan = span_attr(*cell, "colspan");
        if rowspan > SPAN_SANITY || colspan > SPAN_SANITY {
            return Err(CoordexError::MalformedRow(format!(
                "cell declares a {rowspan}x{colspan} span"
            )));
        }
        cols_found += colspan;

        // Row-fill repair: when the last cell of a row leaves the row
        // under-filled and the hole is wider than the cell's declared
        // colspan, extend the cell to absorb the remaining columns. This is
        // the most common malformation: omitted <td>s before an intentional
        // full-width trailing cell.
        if i + 1 == n_cells && cols_found < n_cols {
            let (ri, _) = grid.next_open().unwrap_or((grid.rows.len(), 0));
            if grid.open_cells_in_row(ri) > colspan {
                colspan += n_cols - cols_found;
            }
        }

        grid.place(&cell_text(*cell), rowspan, colspan);
    }
    Ok(())
}

/// Direct rows of the table: `<tr>` children plus `<tr>`s inside direct
/// `<thead>`/`<tbody>`/`<tfoot>` children, in document order. Rows of
/// nested tables are not included.
fn direct_rows<'a>(table: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut rows = Vec::new();
    for child in table.children() {
        let Some(el) = ElementRef::wrap(child) else {
            continue;
        };
        match el.value().name() {
            "tr" => rows.push(el),
            "thead" | "tbody" | "tfoot" => {
                for sub in el.children() {
                    if let Some(row) = ElementRef::wrap(sub) {
                        if row.value().name() == "tr" {
                            rows.push(row);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    rows
}

/// Rows used for column-count estimation: the `<tbody>` child if present,
/// else every collected row.
fn body_rows<'a>(table: ElementRef<'a>, all_rows: &[ElementRef<'a>]) -> Vec<ElementRef<'a>> {
    for child in table.children() {
        let Some(el) = ElementRef::wrap(child) else {
            continue;
        };
        if el.value().name() == "tbody" {
            let rows: Vec<ElementRef<'a>> = el
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|r| r.value().name() == "tr")
                .collect();
            if !rows.is_empty() {
                return rows;
            }
        }
    }
    all_rows.to_vec()
}

fn direct_cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "td" | "th"))
        .collect()
}

/// Logical column count of a row: the sum of its cells' colspans.
fn row_col_count(row: ElementRef<'_>) -> usize {
    direct_cells(row)
        .iter()
        .map(|c| span_attr(*c, "colspan"))
        .sum()
}

/// Read a span attribute, defaulting to 1. Non-numeric values (the literal
/// `"NaN"` appears in the wild) and zero also map to 1.
fn span_attr(cell: ElementRef<'_>, attr: &str) -> usize {
    cell.value()
        .attr(attr)
        .and_then(|v| {
            let digits: String = v.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<usize>().ok()
        })
        .filter(|&n| n > 0)
        .unwrap_or(1)
}

/// Extract a cell's text with inline `<br>`s normalized to newlines and
/// whitespace collapsed per line.
fn cell_text(cell: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(cell, &mut raw);
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(e) = ElementRef::wrap(child) {
            if e.value().name() == "br" {
                out.push('\n');
            } else {
                collect_text(e, out);
            }
        }
    }
}
