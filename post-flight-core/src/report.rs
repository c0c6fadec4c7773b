use core::fmt::{self, Display};

use crate::error::TimestampError;

/// Why a single row was left out of (or passed through) a transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingField {
        column: String,
    },
    InvalidNumber {
        column: String,
        value: String,
    },
    InvalidTimestamp {
        column: String,
        error: TimestampError,
    },
    OutOfDomain {
        column: String,
        value: String,
    },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField { column } => write!(f, "no value in \"{}\"", column),
            SkipReason::InvalidNumber { column, value } => {
                write!(f, "\"{}\" in \"{}\" is not a number", value, column)
            }
            SkipReason::InvalidTimestamp { column, error } => write!(f, "\"{}\": {}", column, error),
            SkipReason::OutOfDomain { column, value } => {
                write!(f, "\"{}\" in \"{}\" is out of range", value, column)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub input: String,
    /// zero based data row index, header excluded
    pub row: usize,
    pub reason: SkipReason,
}

impl Display for SkippedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} data row {}: {}", self.input, self.row + 1, self.reason)
    }
}

/// Outcome of one processing run: how many rows went in and out, and every
/// row that was skipped on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ProcessReport {
    pub fn new(rows_in: usize) -> Self {
        Self {
            rows_in,
            ..Default::default()
        }
    }

    pub fn skip(&mut self, input: &str, row: usize, reason: SkipReason) {
        log_trace!("skipping {} data row {}: {}", input, row + 1, reason);
        self.skipped.push(SkippedRow {
            input: input.into(),
            row,
            reason,
        });
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Logs the run summary. Skipped rows are reported here, after the run,
    /// rather than while rows are processed.
    pub fn log_summary(&self, operation: &str) {
        log_info!(
            "{}: {} rows in, {} rows out, {} skipped",
            operation,
            self.rows_in,
            self.rows_out,
            self.skipped.len()
        );
        for skipped in self.skipped.iter() {
            log_warn!("{}: {}", operation, skipped);
        }
    }
}
