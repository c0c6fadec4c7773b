use core::fmt::{self, Display};
use std::{io, path::PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    Missing,
    InvalidMillis(String),
    InvalidDateTime(String),
    InvalidDate { value: String, format: String },
    InvalidTimeOfDay(String),
    HourOutOfRange(u32),
}

impl Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Missing => write!(f, "no timestamp value"),
            TimestampError::InvalidMillis(value) => {
                write!(f, "\"{}\" is not a millisecond timestamp", value)
            }
            TimestampError::InvalidDateTime(value) => {
                write!(f, "\"{}\" is not a date-time", value)
            }
            TimestampError::InvalidDate { value, format } => {
                write!(f, "\"{}\" does not match date format \"{}\"", value, format)
            }
            TimestampError::InvalidTimeOfDay(value) => {
                write!(f, "\"{}\" is not a [HH:]MM:SS[.fff] time of day", value)
            }
            TimestampError::HourOutOfRange(hour) => write!(f, "hour {} is out of range", hour),
        }
    }
}

impl std::error::Error for TimestampError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesRole {
    Primary,
    Reference,
}

impl Display for SeriesRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesRole::Primary => write!(f, "primary"),
            SeriesRole::Reference => write!(f, "reference"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignError {
    EmptySeries(SeriesRole),
    InvalidSamplingPeriod(i64),
}

impl Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignError::EmptySeries(role) => write!(f, "{} series has no samples", role),
            AlignError::InvalidSamplingPeriod(period) => {
                write!(f, "sampling period must be positive, got {}ms", period)
            }
        }
    }
}

impl std::error::Error for AlignError {}

/// Fatal errors of a processing run. Row-level problems that the run can
/// survive are reported through [`crate::report::ProcessReport`] instead.
#[derive(Debug)]
pub enum PipelineError {
    MissingFile {
        path: PathBuf,
        source: io::Error,
    },
    EmptyInput {
        input: String,
    },
    RequiredFieldMissing {
        input: String,
        field: String,
    },
    TimestampParse {
        input: String,
        row: usize,
        column: String,
        error: TimestampError,
    },
    HourBoundaryCrossed {
        row: usize,
        expected_hour: u32,
        found_hour: u32,
    },
    InvalidConfig(String),
    Align(AlignError),
    Csv(csv::Error),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::MissingFile { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            PipelineError::EmptyInput { input } => write!(f, "{} has no data rows", input),
            PipelineError::RequiredFieldMissing { input, field } => {
                write!(f, "{} has no \"{}\" column", input, field)
            }
            PipelineError::TimestampParse {
                input,
                row,
                column,
                error,
            } => write!(
                f,
                "{} data row {}: column \"{}\": {}",
                input,
                row + 1,
                column,
                error
            ),
            PipelineError::HourBoundaryCrossed {
                row,
                expected_hour,
                found_hour,
            } => write!(
                f,
                "primary data row {} is in hour {}, outside the broadcast hour {}; \
                 the reference time column cannot be aligned across an hour boundary",
                row + 1,
                found_hour,
                expected_hour
            ),
            PipelineError::InvalidConfig(message) => write!(f, "invalid configuration: {}", message),
            PipelineError::Align(error) => write!(f, "{}", error),
            PipelineError::Csv(error) => write!(f, "csv error: {}", error),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::MissingFile { source, .. } => Some(source),
            PipelineError::TimestampParse { error, .. } => Some(error),
            PipelineError::Align(error) => Some(error),
            PipelineError::Csv(error) => Some(error),
            _ => None,
        }
    }
}

impl From<AlignError> for PipelineError {
    fn from(value: AlignError) -> Self {
        PipelineError::Align(value)
    }
}

impl From<csv::Error> for PipelineError {
    fn from(value: csv::Error) -> Self {
        PipelineError::Csv(value)
    }
}
