//! Parse-time options.

/// Options controlling table parsing behavior.
///
/// Defaults match batch-extraction practice: parse carefully, tolerate bad
/// rows, keep tables with unlabeled columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// When true, estimate a table's column count from every body row and
    /// take the maximum instead of trusting the first row. Slower;
    /// first-row headers routinely under-count.
    pub careful_parsing: bool,

    /// When true, rows with structurally impossible markup are logged and
    /// skipped; when false they abort the table parse.
    pub ignore_bad_rows: bool,

    /// When true, a table missing at least one column label is dropped
    /// entirely. Most such tables genuinely have empty columns that are
    /// ignored anyway, so this is off by default.
    pub exclude_tables_with_missing_labels: bool,

    /// When true, suppress warnings for locally-handled defects.
    pub silent_errors: bool,
}

impl ParseOptions {
    /// Set careful column-count estimation.
    #[inline]
    #[must_use = "returns options with careful parsing configured"]
    pub const fn with_careful_parsing(mut self, enable: bool) -> Self {
        self.careful_parsing = enable;
        self
    }

    /// Set bad-row tolerance.
    #[inline]
    #[must_use = "returns options with bad-row handling configured"]
    pub const fn with_ignore_bad_rows(mut self, enable: bool) -> Self {
        self.ignore_bad_rows = enable;
        self
    }

    /// Set missing-label table exclusion.
    #[inline]
    #[must_use = "returns options with missing-label handling configured"]
    pub const fn with_exclude_tables_with_missing_labels(mut self, enable: bool) -> Self {
        self.exclude_tables_with_missing_labels = enable;
        self
    }

    /// Set warning suppression.
    #[inline]
    #[must_use = "returns options with error verbosity configured"]
    pub const fn with_silent_errors(mut self, enable: bool) -> Self {
        self.silent_errors = enable;
        self
    }
}

impl Default for ParseOptions {
    #[inline]
    fn default() -> Self {
        Self {
            careful_parsing: true,
            ignore_bad_rows: true,
            exclude_tables_with_missing_labels: false,
            silent_errors: false,
        }
    }
}
