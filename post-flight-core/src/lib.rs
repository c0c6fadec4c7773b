mod fmt;

pub mod aligner;
pub mod error;
pub mod geodetic;
pub mod pipeline;
pub mod report;
pub mod table;
pub mod time_series;
pub mod timestamp;
mod utils;

pub use aligner::{Alignment, TimeBasePolicy, TimeSeriesAligner};
pub use error::{AlignError, PipelineError, SeriesRole, TimestampError};
pub use geodetic::GeodeticPosition;
pub use report::{ProcessReport, SkipReason, SkippedRow};
pub use table::Table;
pub use time_series::{Sample, TimeSeries};
pub use utils::{format_fixed, lerp};

#[cfg(test)]
mod tests;
