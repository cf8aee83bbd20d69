//! Construction of activation records from grid rows.

use crate::columns::StandardColumn;
use coordex_core::Activation;
use regex::Regex;
use std::sync::LazyLock;

// ScienceDirect journals often put a space after the minus sign ("- 35").
static RE_MINUS_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-)\s+(\d+\.?\d*)$").expect("regex is compile-time constant"));

static RE_SIGNED_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d*)?$").expect("regex is compile-time constant"));

// Three separator-delimited signed decimals of 1-3 integer digits and up
// to 2 fractional digits, e.g. "-45; 12; -12" or "45, 12, -12".
static RE_COORD_TRIPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(-?\s*\d{1,3}(?:\.\d{1,2})?)[,;\s]+(-?\s*\d{1,3}(?:\.\d{1,2})?)[,;\s]+(-?\s*\d{1,3}(?:\.\d{1,2})?)",
    )
    .expect("regex is compile-time constant")
});

static RE_MINUS_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\s+").expect("regex is compile-time constant"));

/// Build one activation from a row's cell values.
///
/// `values`, `labels` and `roles` are parallel; `groups` are the group
/// labels active for this row. Validation does not happen here -- the
/// returned activation carries whatever could be read, plus diagnostics in
/// `problems`, and the caller decides with
/// [`Activation::is_valid`](coordex_core::Activation::is_valid).
#[must_use]
pub fn build_activation(
    values: &[&str],
    labels: &[String],
    roles: &[Option<StandardColumn>],
    groups: &[String],
) -> Activation {
    let mut activation = Activation::new();

    for (i, raw) in values.iter().enumerate() {
        let mut value = raw.trim().to_string();

        if let Some(role) = roles[i] {
            if role.is_coordinate() {
                if let Some(caps) = RE_MINUS_GAP.captures(&value) {
                    value = format!("{}{}", &caps[1], &caps[2]);
                }
                if !RE_SIGNED_DECIMAL.is_match(&value) {
                    log::debug!("value {value:?} in {} column is not valid", role.as_str());
                    activation
                        .problems
                        .push(format!("Value in {} column is not valid", role.as_str()));
                    // Abort: the missing coordinate fails validation later.
                    return activation;
                }
                let Ok(coord) = value.parse::<f64>() else {
                    activation
                        .problems
                        .push(format!("Value in {} column is not valid", role.as_str()));
                    return activation;
                };
                match role {
                    StandardColumn::X => activation.x = Some(coord),
                    StandardColumn::Y => activation.y = Some(coord),
                    StandardColumn::Z => activation.z = Some(coord),
                    _ => unreachable!("is_coordinate covers x/y/z only"),
                }
            } else {
                if role == StandardColumn::Region
                    && !value.chars().any(|c| c.is_ascii_alphabetic())
                {
                    log::debug!("value in region column is not a string");
                    activation
                        .problems
                        .push("Value in region column is not a string".to_string());
                }
                let field = match role {
                    StandardColumn::Region => &mut activation.region,
                    StandardColumn::Hemisphere => &mut activation.hemisphere,
                    StandardColumn::BrodmannArea => &mut activation.ba,
                    StandardColumn::Size => &mut activation.size,
                    StandardColumn::Statistic => &mut activation.statistic,
                    StandardColumn::PValue => &mut activation.p_value,
                    _ => unreachable!("coordinate roles handled above"),
                };
                *field = Some(value.clone());
            }
        }

        // Every column makes it into the record, role or not.
        activation.add_column(&labels[i], raw.trim());

        // Embedded-coordinate harvest: some tables put all three
        // coordinates in one cell. Any later match overrides an earlier
        // assignment.
        if !roles[i].is_some_and(StandardColumn::is_coordinate) {
            if let Some(caps) = RE_COORD_TRIPLE.captures(value.trim()) {
                let nums: Vec<f64> = (1..=3)
                    .filter_map(|g| {
                        let cleaned = RE_MINUS_SPACE.replace_all(caps[g].trim(), "-");
                        cleaned.parse::<f64>().ok()
                    })
                    .collect();
                if let [x, y, z] = nums[..] {
                    log::info!(
                        "found multi-coordinate column {value:?}; extracted {x}, {y}, {z}"
                    );
                    activation.set_coords(x, y, z);
                }
            }
        }
    }

    activation.groups = groups.to_vec();
    activation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::identify_standard_columns;

    fn build(values: &[&str], labels: &[&str]) -> Activation {
        let labels: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        let roles = identify_standard_columns(&labels);
        build_activation(values, &labels, &roles, &[])
    }

    #[test]
    fn test_plain_row() {
        let a = build(
            &["left insula", "13", "-30", "22", "4", "5.1", "0.001"],
            &["region", "ba", "x", "y", "z", "t", "p value"],
        );
        assert_eq!(a.region.as_deref(), Some("left insula"));
        assert_eq!(a.ba.as_deref(), Some("13"));
        assert_eq!((a.x, a.y, a.z), (Some(-30.0), Some(22.0), Some(4.0)));
        assert_eq!(a.statistic.as_deref(), Some("5.1"));
        assert_eq!(a.p_value.as_deref(), Some("0.001"));
        assert!(a.is_valid());
        assert_eq!(a.columns.len(), 7);
    }

    #[test]
    fn test_minus_space_repaired() {
        let a = build(&["x", "- 35", "18", "2"], &["region", "x", "y", "z"]);
        assert_eq!(a.x, Some(-35.0));
        assert!(a.problems.is_empty() || !a.problems.iter().any(|p| p.contains("x column")));
    }

    #[test]
    fn test_invalid_coordinate_flags_problem_and_aborts() {
        let a = build(
            &["insula", "n/a", "18", "2"],
            &["region", "x", "y", "z"],
        );
        assert!(a.problems.iter().any(|p| p.contains("x column")));
        assert!(a.x.is_none());
        assert!(!a.is_valid());
        // Columns after the abort point are not recorded.
        assert!(a.column("z").is_none());
    }

    #[test]
    fn test_non_alphabetic_region_flagged() {
        let a = build(&["42", "-30", "22", "4"], &["region", "x", "y", "z"]);
        assert!(a
            .problems
            .iter()
            .any(|p| p.contains("region column is not a string")));
        // The value is still carried through.
        assert_eq!(a.region.as_deref(), Some("42"));
        assert!(a.is_valid());
    }

    #[test]
    fn test_embedded_triple_semicolons() {
        let a = build(
            &["precuneus", "-45; 12; -12"],
            &["region", "peak location"],
        );
        assert_eq!((a.x, a.y, a.z), (Some(-45.0), Some(12.0), Some(-12.0)));
        assert!(a.is_valid());
    }

    #[test]
    fn test_embedded_triple_with_minus_gap() {
        let a = build(&["precuneus", "- 45, 12, - 12"], &["region", "peak"]);
        assert_eq!((a.x, a.y, a.z), (Some(-45.0), Some(12.0), Some(-12.0)));
    }

    #[test]
    fn test_embedded_triple_overrides_earlier_columns() {
        // A triple in a later non-coordinate column wins over whatever the
        // coordinate columns held.
        let a = build(
            &["insula", "1", "2", "3", "10 20 30"],
            &["region", "x", "y", "z", "notes"],
        );
        assert_eq!((a.x, a.y, a.z), (Some(10.0), Some(20.0), Some(30.0)));
    }

    #[test]
    fn test_coordinate_columns_not_harvested() {
        // A value inside an x/y/z column never triggers the triple scan.
        let a = build(&["insula", "10", "20", "30"], &["region", "x", "y", "z"]);
        assert_eq!((a.x, a.y, a.z), (Some(10.0), Some(20.0), Some(30.0)));
    }

    #[test]
    fn test_two_numbers_do_not_harvest() {
        let a = build(&["group", "23.4 2.1"], &["cohort", "age"]);
        assert!(a.x.is_none());
        assert!(!a.is_valid());
    }

    #[test]
    fn test_groups_attached() {
        let labels: Vec<String> = vec!["region".to_string(), "x".to_string()];
        let roles = identify_standard_columns(&labels);
        let a = build_activation(
            &["insula", "-30"],
            &labels,
            &roles,
            &["Experiment 1".to_string(), "Controls".to_string()],
        );
        assert_eq!(a.groups, vec!["Experiment 1", "Controls"]);
    }

    #[test]
    fn test_decimal_coordinates() {
        let a = build(&["x", "-30.5", "22.25", "4."], &["region", "x", "y", "z"]);
        assert_eq!(a.x, Some(-30.5));
        assert_eq!(a.y, Some(22.25));
        assert_eq!(a.z, Some(4.0));
    }
}
