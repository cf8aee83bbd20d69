//! Detection of contiguous repeating label sequences in table headers.
//!
//! Tables reporting several experimental conditions repeat the same column
//! group once per condition (`region | x y z | x y z`). Finding those spans
//! lets the parser emit one activation per condition per row instead of one
//! garbled activation per row.

use std::collections::HashMap;

/// A contiguous run of repeated header columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupSpan {
    /// Index of the first column in the group.
    pub start: usize,
    /// Number of columns in the group.
    pub len: usize,
}

impl GroupSpan {
    /// Column indices covered by this span.
    #[inline]
    #[must_use]
    pub fn columns(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

/// Identify repeating column groups in a header label list.
///
/// A repeated sequence is a contiguous subsequence of length >= 2 in which
/// every label occurs at least twice in the full header, and which does not
/// wrap over its own first label. Only sequences that actually start at two
/// or more positions survive. Spans are then claimed left to right; a span
/// is emitted only when none of its columns has been claimed yet, so
/// rotated shadows of a group (the y/z/x inside x/y/z x/y/z x/y/z) never
/// produce overlapping output.
///
/// Only one level of repetition is handled; hierarchical groupings collapse
/// to their innermost repeating sequence.
#[must_use]
pub fn identify_repeating_groups(labels: &[String]) -> Vec<GroupSpan> {
    let n = labels.len();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }
    let repeated = |label: &str| counts.get(label).copied().unwrap_or(0) >= 2;

    // Maximal candidate sequence at each start position whose labels are
    // all repeated and distinct from the start label.
    let mut seqs: HashMap<Vec<&str>, Vec<usize>> = HashMap::new();
    for i in 0..n {
        if !repeated(&labels[i]) {
            continue;
        }
        let mut seq: Vec<&str> = vec![&labels[i]];
        for label in labels.iter().skip(i + 1) {
            if !repeated(label) || label == &labels[i] {
                break;
            }
            seq.push(label);
        }
        if seq.len() > 1 {
            seqs.entry(seq).or_default().push(i);
        }
    }

    // A sequence only forms groups if it occurs at two or more starts.
    let mut seq_len_at: Vec<Option<usize>> = vec![None; n];
    for (seq, starts) in &seqs {
        if starts.len() >= 2 {
            for &start in starts {
                seq_len_at[start] = Some(seq.len());
            }
        }
    }

    // Claim spans left to right, whole spans only. Rotations of a real
    // group survive the frequency filter once the group repeats three or
    // more times; requiring a fully unclaimed span keeps them out.
    let mut used = vec![false; n];
    let mut groups = Vec::new();
    for start in 0..n {
        if let Some(len) = seq_len_at[start] {
            if used[start..start + len].iter().all(|u| !u) {
                for u in &mut used[start..start + len] {
                    *u = true;
                }
                groups.push(GroupSpan { start, len });
            }
        }
    }

    groups
}
