//! Standard-role classification of table column headers.

use regex::Regex;
use std::sync::LazyLock;

static RE_BA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^\s*ba$)|brodmann").expect("regex is compile-time constant"));
static RE_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"region|anatom|location|area").expect("regex is compile-time constant")
});
static RE_HEMISPHERE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"sphere|(^\s*h$)|^\s*hem|^\s*side").expect("regex is compile-time constant")
});
static RE_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^k$)|(mm.*?3)|volume|voxels|size|extent").expect("regex is compile-time constant")
});
static RE_XY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[xy]\s*$").expect("regex is compile-time constant"));
static RE_Z: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*z\s*$").expect("regex is compile-time constant"));
static RE_STATISTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(z|t).*(score|value)").expect("regex is compile-time constant")
});
static RE_P_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"p[-\s]+.*val").expect("regex is compile-time constant"));

/// The fixed vocabulary of column roles a header label can be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardColumn {
    X,
    Y,
    Z,
    Region,
    Hemisphere,
    BrodmannArea,
    Size,
    Statistic,
    PValue,
}

impl StandardColumn {
    /// Canonical lowercase role name, as used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::Region => "region",
            Self::Hemisphere => "hemisphere",
            Self::BrodmannArea => "ba",
            Self::Size => "size",
            Self::Statistic => "statistic",
            Self::PValue => "p_value",
        }
    }

    /// True for the coordinate roles x, y, z.
    #[inline]
    #[must_use]
    pub const fn is_coordinate(self) -> bool {
        matches!(self, Self::X | Self::Y | Self::Z)
    }
}

/// Assign each (lowercased, trimmed) header label a standard role.
///
/// Rules are applied in order; first match wins. Unrecognized labels get
/// `None`. The only nontrivial rule is `z`: a bare `z` is a coordinate only
/// when an x/y column has already been seen and the immediately preceding
/// label is `y` -- a z-score column is never directly preceded by a `y`
/// coordinate column in the way these tables are actually written.
#[must_use]
pub fn identify_standard_columns(labels: &[String]) -> Vec<Option<StandardColumn>> {
    let mut roles = Vec::with_capacity(labels.len());
    let mut found_coords = false;

    for (i, label) in labels.iter().enumerate() {
        let role = if RE_BA.is_match(label) {
            Some(StandardColumn::BrodmannArea)
        } else if RE_REGION.is_match(label) {
            Some(StandardColumn::Region)
        } else if RE_HEMISPHERE.is_match(label) {
            Some(StandardColumn::Hemisphere)
        } else if RE_SIZE.is_match(label) {
            Some(StandardColumn::Size)
        } else if RE_XY.is_match(label) {
            found_coords = true;
            if label.trim() == "x" {
                Some(StandardColumn::X)
            } else {
                Some(StandardColumn::Y)
            }
        } else if RE_Z.is_match(label) {
            if found_coords && i > 0 && labels[i - 1].trim() == "y" {
                Some(StandardColumn::Z)
            } else {
                Some(StandardColumn::Statistic)
            }
        } else if label.contains("rdinate") {
            // Multi-column "Coordinates" header spanning x/y/z; handled by
            // the table parser, not a role of its own.
            None
        } else if label.trim() == "t" || RE_STATISTIC.is_match(label) {
            Some(StandardColumn::Statistic)
        } else if RE_P_VALUE.is_match(label) {
            Some(StandardColumn::PValue)
        } else {
            None
        };
        roles.push(role);
    }

    roles
}
