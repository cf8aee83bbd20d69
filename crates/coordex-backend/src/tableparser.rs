//! Semantic interpretation of a reconstructed grid into a table of
//! validated activations.

use crate::activation::build_activation;
use crate::columns::identify_standard_columns;
use crate::grid::{Grid, GridCell};
use crate::groups::identify_repeating_groups;
use coordex_core::{ParseOptions, Table};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// A multi-column header like "Coordinates" or "x, y, z" spanning the three
// coordinate columns.
static RE_COORD_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(ordinate|x.*y.*z)").expect("regex is compile-time constant")
});

/// Parse a [`Grid`] into a [`Table`] of validated activations.
///
/// Returns `None` when the table yields no valid activation, or when a
/// column label is missing and
/// [`ParseOptions::exclude_tables_with_missing_labels`] is set. The caller
/// fills in `position` and the dialect-provided metadata.
#[must_use]
pub fn parse_table(grid: &Grid, options: &ParseOptions) -> Option<Table> {
    let n_cols = grid.n_cols();

    // -- Header interpretation -------------------------------------------
    //
    // The label of column j is the text of the first non-empty,
    // non-marker cell in column j. Anchor cells are collected into the
    // multi-column label map keyed by (start, span).
    let mut labels: Vec<Option<String>> = vec![None; n_cols];
    let mut multicol: HashMap<(usize, usize), String> = HashMap::new();

    for row in grid.rows() {
        let digit_cells = row
            .iter()
            .filter(|c| c.text().chars().any(|ch| ch.is_ascii_digit()))
            .count();
        let looks_like_data = digit_cells >= 3;

        for (j, cell) in row.iter().enumerate() {
            match cell {
                GridCell::Text(text) => {
                    let value = text.trim();
                    if !value.is_empty() && labels[j].is_none() {
                        // First-column rescue: an unlabeled first column of
                        // region names is easily mistaken for a header. If
                        // every other column is already labeled, or this
                        // row is full of numbers, the value is data.
                        if j == 0 && (labels[1..].iter().all(Option::is_some) || looks_like_data)
                        {
                            labels[0] = Some("region".to_string());
                        } else {
                            labels[j] = Some(value.to_string());
                        }
                    }
                }
                GridCell::Anchor { text, colspan } => {
                    multicol.insert((j, *colspan), text.trim().to_string());
                }
                GridCell::Continuation { .. } => {}
            }
        }
    }

    // Some tables carry a single "Coordinates" label over three otherwise
    // unlabeled columns; rewrite those to x/y/z.
    for (&(start, span), text) in &multicol {
        if span == 3 && start + span <= n_cols && RE_COORD_HEADER.is_match(text) {
            let joined: String = labels[start..start + span]
                .iter()
                .map(|l| l.as_deref().unwrap_or(""))
                .collect();
            if !joined.chars().any(|c| c.is_ascii_alphabetic()) {
                log::info!("possible multi-column coordinates found: {text:?} at {start}");
                labels[start] = Some("x".to_string());
                labels[start + 1] = Some("y".to_string());
                labels[start + 2] = Some("z".to_string());
            }
        }
    }

    if labels.iter().any(Option::is_none) {
        let shown: Vec<&str> = labels
            .iter()
            .map(|l| l.as_deref().unwrap_or("None"))
            .collect();
        if options.exclude_tables_with_missing_labels {
            log::error!(
                "failed to identify at least one column label: [{}]; skipping table",
                shown.join(", ")
            );
            return None;
        }
        if !options.silent_errors {
            log::warn!(
                "failed to identify at least one column label: [{}]",
                shown.join(", ")
            );
        }
    }

    let labels: Vec<String> = labels
        .into_iter()
        .map(|l| l.map(|s| s.to_lowercase()).unwrap_or_default())
        .collect();

    let roles = identify_standard_columns(&labels);
    let group_spans = identify_repeating_groups(&labels);
    log::debug!("labels: {}", labels.join(", "));

    let mut in_group = vec![false; n_cols];
    for span in &group_spans {
        for i in span.columns() {
            in_group[i] = true;
        }
    }

    // -- Row iteration ---------------------------------------------------
    let mut current_group: Option<String> = None;
    let mut activations = Vec::new();

    for row in grid.rows() {
        // Interior header repeat: any cell matching its own column label.
        let repeats_header = row.iter().zip(&labels).any(|(cell, label)| {
            !label.is_empty() && cell.text().trim().to_lowercase() == *label
        });
        if repeats_header {
            continue;
        }

        // Group heading by blank tail: a lone value in the first column
        // labels the following rows. Consecutive heading rows overwrite
        // each other; no hierarchy is kept.
        let tail_blank = row[1..].iter().all(GridCell::is_blank);
        if let GridCell::Text(first) = &row[0] {
            if !first.trim().is_empty() && tail_blank {
                current_group = Some(first.trim().to_string());
                continue;
            }
        }

        // Group heading by full span: a cell stretched over every column
        // past the header rows is a group label too.
        if let GridCell::Anchor { text, colspan } = &row[0] {
            if *colspan == n_cols {
                current_group = Some(text.trim().to_string());
                continue;
            }
        }

        // Residual header or malformed rows still carry span markers.
        if row.iter().any(GridCell::is_marker) {
            continue;
        }

        let row_groups: Vec<String> = current_group.iter().cloned().collect();

        if group_spans.is_empty() {
            let values: Vec<&str> = row.iter().map(GridCell::text).collect();
            let activation = build_activation(&values, &labels, &roles, &row_groups);
            if activation.is_valid() {
                activations.push(activation);
            }
            continue;
        }

        // One activation per repeating group: all non-group columns plus
        // only this group's columns.
        for span in &group_spans {
            let mut groups = Vec::new();
            if let Some(label) = multicol.get(&(span.start, span.len)) {
                groups.push(label.clone());
            }
            groups.extend(row_groups.iter().cloned());

            let mut values = Vec::new();
            let mut sub_labels = Vec::new();
            let mut sub_roles = Vec::new();
            for i in 0..n_cols {
                if !in_group[i] || span.columns().contains(&i) {
                    values.push(row[i].text());
                    sub_labels.push(labels[i].clone());
                    sub_roles.push(roles[i]);
                }
            }

            let activation = build_activation(&values, &sub_labels, &sub_roles, &groups);
            if activation.is_valid() {
                activations.push(activation);
            }
        }
    }

    if activations.is_empty() {
        return None;
    }

    let mut table = Table::new();
    table.n_columns = n_cols;
    table.activations = activations;
    table.finalize();
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::build_grid;
    use scraper::{Html, Selector};

    fn parse(html: &str) -> Option<Table> {
        parse_with(html, &ParseOptions::default())
    }

    fn parse_with(html: &str, options: &ParseOptions) -> Option<Table> {
        let doc = Html::parse_document(html);
        let sel = Selector::parse("table").expect("static selector");
        let table = doc.select(&sel).next().expect("fixture has a table");
        let grid = build_grid(table, options)
            .expect("grid build should not error")
            .expect("fixture grid is non-empty");
        parse_table(&grid, options)
    }

    const SIMPLE: &str = "<table>\
        <tr><th>Region</th><th>x</th><th>y</th><th>z</th><th>t</th></tr>\
        <tr><td>Left insula</td><td>-30</td><td>22</td><td>4</td><td>5.1</td></tr>\
        <tr><td>Precuneus</td><td>-8</td><td>-52</td><td>40</td><td>4.2</td></tr>\
        </table>";

    #[test]
    fn test_one_header_one_data_row() {
        let t = parse(
            "<table><tr><th>Region</th><th>x</th><th>y</th><th>z</th></tr>\
             <tr><td>Insula</td><td>-30</td><td>22</td><td>4</td></tr></table>",
        )
        .expect("table");
        assert_eq!(t.n_activations, 1);
        assert_eq!(t.activations[0].region.as_deref(), Some("Insula"));
    }

    #[test]
    fn test_counters_consistent() {
        let t = parse(SIMPLE).expect("table");
        assert_eq!(t.n_activations, 2);
        assert_eq!(t.n_activations, t.activations.len());
        assert_eq!(t.n_columns, 5);
    }

    #[test]
    fn test_repeated_header_row_skipped() {
        let html = "<table>\
            <tr><th>region</th><th>x</th><th>y</th><th>z</th></tr>\
            <tr><td>Insula</td><td>-30</td><td>22</td><td>4</td></tr>\
            <tr><td>region</td><td>x</td><td>y</td><td>z</td></tr>\
            <tr><td>Precuneus</td><td>-8</td><td>-52</td><td>40</td></tr>\
            </table>";
        let t = parse(html).expect("table");
        assert_eq!(t.n_activations, 2);
    }

    #[test]
    fn test_group_heading_by_blank_tail() {
        let html = "<table>\
            <tr><th>Region</th><th>x</th><th>y</th><th>z</th></tr>\
            <tr><td>Task A</td><td></td><td></td><td></td></tr>\
            <tr><td>Insula</td><td>-30</td><td>22</td><td>4</td></tr>\
            <tr><td>Task B</td><td></td><td></td><td></td></tr>\
            <tr><td>Precuneus</td><td>-8</td><td>-52</td><td>40</td></tr>\
            </table>";
        let t = parse(html).expect("table");
        assert_eq!(t.n_activations, 2);
        assert_eq!(t.activations[0].groups, vec!["Task A"]);
        assert_eq!(t.activations[1].groups, vec!["Task B"]);
    }

    #[test]
    fn test_group_heading_by_full_span() {
        let html = "<table>\
            <tr><th>Region</th><th>x</th><th>y</th><th>z</th></tr>\
            <tr><td colspan=\"4\">Encoding</td></tr>\
            <tr><td>Insula</td><td>-30</td><td>22</td><td>4</td></tr>\
            </table>";
        let t = parse(html).expect("table");
        assert_eq!(t.n_activations, 1);
        assert_eq!(t.activations[0].groups, vec!["Encoding"]);
    }

    #[test]
    fn test_unlabeled_first_column_rescued_as_region() {
        // The first column has no header; its first value appears on a row
        // full of numbers, so it must be data, and the column is region.
        let html = "<table>\
            <tr><th></th><th>x</th><th>y</th><th>z</th></tr>\
            <tr><td>Left insula</td><td>-30</td><td>22</td><td>4</td></tr>\
            </table>";
        let t = parse(html).expect("table");
        assert_eq!(t.activations[0].region.as_deref(), Some("Left insula"));
    }

    #[test]
    fn test_multicolumn_coordinate_header_rewritten() {
        let html = "<table>\
            <tr><th>Region</th><th colspan=\"3\">Coordinates (mm)</th><th>t</th></tr>\
            <tr><td>Insula</td><td>-30</td><td>22</td><td>4</td><td>5.1</td></tr>\
            </table>";
        let t = parse(html).expect("table");
        assert_eq!(t.n_activations, 1);
        let a = &t.activations[0];
        assert_eq!((a.x, a.y, a.z), (Some(-30.0), Some(22.0), Some(4.0)));
    }

    #[test]
    fn test_repeating_groups_double_activations() {
        let html = "<table>\
            <tr><th rowspan=\"2\">Region</th>\
                <th colspan=\"3\">Encoding</th><th colspan=\"3\">Retrieval</th></tr>\
            <tr><th>x</th><th>y</th><th>z</th><th>x</th><th>y</th><th>z</th></tr>\
            <tr><td>Insula</td><td>-30</td><td>22</td><td>4</td>\
                <td>-28</td><td>20</td><td>6</td></tr>\
            <tr><td>Precuneus</td><td>-8</td><td>-52</td><td>40</td>\
                <td>-6</td><td>-50</td><td>42</td></tr>\
            </table>";
        let t = parse(html).expect("table");
        assert_eq!(t.n_activations, 4);
        assert_eq!(t.activations[0].groups, vec!["Encoding"]);
        assert_eq!(t.activations[1].groups, vec!["Retrieval"]);
        assert_eq!(t.activations[1].x, Some(-28.0));
        // Non-group columns are carried into every split activation.
        assert_eq!(t.activations[1].region.as_deref(), Some("Insula"));
    }

    #[test]
    fn test_invalid_rows_discarded() {
        let html = "<table>\
            <tr><th>Region</th><th>x</th><th>y</th><th>z</th></tr>\
            <tr><td>Bad zeroes</td><td>0</td><td>0</td><td>17</td></tr>\
            <tr><td>Too large</td><td>101</td><td>0</td><td>0</td></tr>\
            <tr><td>Fine</td><td>-30</td><td>22</td><td>4</td></tr>\
            </table>";
        let t = parse(html).expect("table");
        assert_eq!(t.n_activations, 1);
        assert_eq!(t.activations[0].region.as_deref(), Some("Fine"));
    }

    #[test]
    fn test_table_without_activations_dropped() {
        let html = "<table>\
            <tr><th>Group</th><th>N</th><th>Age</th></tr>\
            <tr><td>Patients</td><td>17</td><td>34.2</td></tr>\
            </table>";
        assert!(parse(html).is_none());
    }

    #[test]
    fn test_missing_label_excludes_table_when_configured() {
        let html = "<table>\
            <tr><th>Region</th><th>x</th><th>y</th><th>z</th><th></th></tr>\
            <tr><td>Insula</td><td>-30</td><td>22</td><td>4</td><td></td></tr>\
            </table>";
        let strict = ParseOptions::default().with_exclude_tables_with_missing_labels(true);
        assert!(parse_with(html, &strict).is_none());
        // Default keeps the table; the unlabeled column is just empty.
        let t = parse(html).expect("table");
        assert_eq!(t.n_activations, 1);
    }

    #[test]
    fn test_embedded_triple_in_plain_table() {
        let html = "<table>\
            <tr><th>Region</th><th>Peak (x, y, z)</th><th>t</th></tr>\
            <tr><td>Insula</td><td>-45; 12; -12</td><td>3.9</td></tr>\
            </table>";
        let t = parse(html).expect("table");
        let a = &t.activations[0];
        assert_eq!((a.x, a.y, a.z), (Some(-45.0), Some(12.0), Some(-12.0)));
    }
}
