//! Value objects produced by the extraction pipeline.

use serde::{Deserialize, Serialize};

/// Stereotactic reference space an article reports its coordinates in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateSpace {
    /// Montreal Neurological Institute space.
    #[serde(rename = "MNI")]
    Mni,
    /// Talairach space.
    #[serde(rename = "TAL")]
    Talairach,
    /// Could not be determined from the article text.
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl CoordinateSpace {
    /// Canonical tag string (`MNI` | `TAL` | `UNKNOWN`).
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mni => "MNI",
            Self::Talairach => "TAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for CoordinateSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Article metadata as returned by the PubMed resolver.
///
/// All fields are plain strings; `mesh` is a joined term list. A resolver
/// may legitimately return nothing for an article, so everything that
/// consumes this does so through `Option<PubmedMetadata>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubmedMetadata {
    pub pmid: String,
    pub title: String,
    pub journal: String,
    pub year: String,
    pub authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub mesh: String,
    pub citation: String,
    #[serde(default)]
    pub doi: String,
}

/// Kind of NeuroVault resource a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeurovaultKind {
    Image,
    Collection,
}

/// A NeuroVault cross-reference harvested from article hyperlinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeurovaultLink {
    pub kind: NeurovaultKind,
    /// Numeric resource identifier extracted from the URL.
    pub id: String,
    /// The URL as it appeared in the document.
    pub url: String,
}

/// One stereotactic coordinate triple plus ancillary attributes, derived
/// from one logical row of one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub region: Option<String>,
    pub hemisphere: Option<String>,
    pub ba: Option<String>,
    pub size: Option<String>,
    pub statistic: Option<String>,
    pub p_value: Option<String>,
    /// Every column of the row, in table order, as `(label, raw value)`.
    pub columns: Vec<(String, String)>,
    /// Group labels active for this row (multi-column header text and/or
    /// the nearest group-heading row).
    pub groups: Vec<String>,
    /// Diagnostics accumulated while building; kept for post-hoc review,
    /// never raised.
    pub problems: Vec<String>,
}

impl Activation {
    /// Create an empty activation.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all three coordinates at once.
    #[inline]
    pub fn set_coords(&mut self, x: f64, y: f64, z: f64) {
        self.x = Some(x);
        self.y = Some(y);
        self.z = Some(z);
    }

    /// Record a raw column value under its header label.
    #[inline]
    pub fn add_column(&mut self, label: &str, value: &str) {
        self.columns.push((label.to_string(), value.to_string()));
    }

    /// Look up a recorded column value by label.
    #[must_use]
    pub fn column(&self, label: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    /// Validate the coordinate triple.
    ///
    /// An activation is valid iff x, y and z are all present, every
    /// coordinate magnitude is below 100, and at most one coordinate is
    /// zero. Two zeroes are almost always a parsing artifact; the remaining
    /// coordinate alone carries no real meaning in brain space.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let (x, y, z) = match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) => (x, y, z),
            _ => {
                log::debug!(
                    "missing x, y, or z coordinate: [{:?}, {:?}, {:?}]",
                    self.x,
                    self.y,
                    self.z
                );
                return false;
            }
        };

        if x.abs() >= 100.0 || y.abs() >= 100.0 || z.abs() >= 100.0 {
            log::debug!("invalid coordinates: at least one dimension >= 100");
            return false;
        }

        let zeroes = [x, y, z].iter().filter(|c| **c == 0.0).count();
        if zeroes > 1 {
            log::debug!("at least two dimensions are zero; coordinate is probably not real");
            return false;
        }

        true
    }
}

/// One logical table extracted from an article.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// 1-based index of discovery within the article.
    pub position: usize,
    /// The table number as printed (e.g. `"5"` for "Table 5").
    pub number: Option<String>,
    /// Short label, usually "Table N".
    pub label: Option<String>,
    pub caption: Option<String>,
    pub notes: Option<String>,
    pub activations: Vec<Activation>,
    pub n_activations: usize,
    pub n_columns: usize,
}

impl Table {
    /// Create an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal counters after all activations have been appended.
    #[inline]
    pub fn finalize(&mut self) {
        self.n_activations = self.activations.len();
    }
}

/// A fully parsed article: identifiers, cleaned text, metadata, and the
/// extracted tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// PubMed identifier; the canonical article key.
    pub pmid: u32,
    pub doi: Option<String>,
    /// Reference space tag computed once per article from its text.
    pub space: CoordinateSpace,
    /// Cleaned full text (scripts/styles stripped).
    pub text: String,
    pub metadata: Option<PubmedMetadata>,
    pub tables: Vec<Table>,
    pub neurovault_links: Vec<NeurovaultLink>,
}

impl Article {
    /// Create an article skeleton for the given PMID.
    #[must_use]
    pub fn new(pmid: u32) -> Self {
        Self {
            pmid,
            ..Self::default()
        }
    }

    /// Total activation count across all tables.
    #[must_use]
    pub fn n_activations(&self) -> usize {
        self.tables.iter().map(|t| t.activations.len()).sum()
    }
}
