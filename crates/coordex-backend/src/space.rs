//! Coordinate-space tagging from article text.

use coordex_core::CoordinateSpace;
use regex::Regex;
use std::sync::LazyLock;

const TARGETS: [&str; 8] = [
    "mni",
    "talairach",
    "afni",
    "flirt",
    "711-2",
    "spm",
    "brainvoyager",
    "fsl",
];

// One windowed pattern per keyword: the keyword must appear with real prose
// around it (30-40 characters each side), which filters out stray hits in
// URLs and reference lists.
static TARGET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TARGETS
        .iter()
        .map(|t| {
            Regex::new(&format!(r"\b.{{30,40}}\b{t}.{{30,40}}\b"))
                .expect("regex is compile-time constant")
        })
        .collect()
});

/// Guess the stereotactic space an article reports its coordinates in.
///
/// Tally keyword mentions in 60-character windows. `spm` and `fsl` count as
/// MNI evidence, `afni` and `brainvoyager` as Talairach evidence. A literal
/// `mni`/`talairach` mention wins when unambiguous and not contradicted by
/// software evidence; otherwise one-sided software evidence decides;
/// otherwise the space is unknown.
#[must_use]
pub fn guess_space(text: &str) -> CoordinateSpace {
    let lower = text.to_lowercase();
    let counts: Vec<usize> = TARGET_PATTERNS
        .iter()
        .map(|p| p.find_iter(&lower).count())
        .collect();

    let lit_mni = counts[0] > 0;
    let lit_tal = counts[1] > 0;
    let mni_evidence = counts[5] + counts[7]; // spm + fsl
    let tal_evidence = counts[2] + counts[6]; // afni + brainvoyager

    if lit_mni && !lit_tal && !(tal_evidence > 0 && mni_evidence == 0) {
        CoordinateSpace::Mni
    } else if lit_tal && !lit_mni && !(mni_evidence > 0 && tal_evidence == 0) {
        CoordinateSpace::Talairach
    } else if mni_evidence > 0 && tal_evidence == 0 {
        CoordinateSpace::Mni
    } else if tal_evidence > 0 && mni_evidence == 0 {
        CoordinateSpace::Talairach
    } else {
        CoordinateSpace::Unknown
    }
}
