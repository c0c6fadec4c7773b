use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike as _};
use serde::{Deserialize, Serialize};

use crate::{
    error::{PipelineError, TimestampError},
    report::SkipReason,
    table::Table,
};

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
];

/// Parses a logger timestamp in milliseconds. Fractional values are
/// truncated towards zero.
pub fn parse_millis(value: &str) -> Result<i64, TimestampError> {
    if let Ok(ms) = value.trim().parse::<i64>() {
        return Ok(ms);
    }
    match parse_fractional_millis(value) {
        Ok(ms) if ms.abs() < i64::MAX as f64 => Ok(ms as i64),
        _ => Err(TimestampError::InvalidMillis(value.into())),
    }
}

/// Parses a logger timestamp in milliseconds, keeping any fraction.
pub fn parse_fractional_millis(value: &str) -> Result<f64, TimestampError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|ms| ms.is_finite())
        .ok_or_else(|| TimestampError::InvalidMillis(value.into()))
}

/// Parses a wall clock date-time. Without an explicit `format`, RFC 3339
/// (converted to UTC) and a few common layouts are accepted.
pub fn parse_date_time(value: &str, format: Option<&str>) -> Result<NaiveDateTime, TimestampError> {
    let trimmed = value.trim();
    if let Some(format) = format {
        return NaiveDateTime::parse_from_str(trimmed, format)
            .map_err(|_| TimestampError::InvalidDateTime(value.into()));
    }

    if let Ok(date_time) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(date_time.naive_utc());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| TimestampError::InvalidDateTime(value.into()))
}

pub fn parse_date(value: &str, format: &str) -> Result<NaiveDate, TimestampError> {
    NaiveDate::parse_from_str(value.trim(), format).map_err(|_| TimestampError::InvalidDate {
        value: value.into(),
        format: format.into(),
    })
}

/// A time of day as written by the GPS logger: `MM:SS.fff`, or `HH:MM:SS.fff`
/// when the hour is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTime {
    pub hour: Option<u32>,
    pub minute: u32,
    /// milliseconds into the minute
    pub millis: u32,
}

impl ClockTime {
    pub fn at_hour(&self, hour: u32) -> Result<NaiveTime, TimestampError> {
        let hour = self.hour.unwrap_or(hour);
        NaiveTime::from_hms_milli_opt(hour, self.minute, self.millis / 1000, self.millis % 1000)
            .ok_or(TimestampError::HourOutOfRange(hour))
    }
}

pub fn parse_time_of_day(value: &str) -> Result<ClockTime, TimestampError> {
    let invalid = || TimestampError::InvalidTimeOfDay(value.into());
    let parts: Vec<&str> = value.trim().split(':').collect();
    let (hour, minute, seconds) = match parts.as_slice() {
        [minute, seconds] => (None, *minute, *seconds),
        [hour, minute, seconds] => (Some(hour.parse::<u32>().map_err(|_| invalid())?), *minute, *seconds),
        _ => return Err(invalid()),
    };

    if hour.is_some_and(|hour| hour > 23) {
        return Err(invalid());
    }
    let minute = minute.parse::<u32>().map_err(|_| invalid())?;
    if minute > 59 {
        return Err(invalid());
    }
    let seconds = seconds.parse::<f64>().map_err(|_| invalid())?;
    if !(0.0..60.0).contains(&seconds) {
        return Err(invalid());
    }
    let millis = ((seconds * 1000.0).round() as u32).min(59_999);

    Ok(ClockTime {
        hour,
        minute,
        millis,
    })
}

pub fn date_time_ms(date_time: NaiveDateTime) -> i64 {
    date_time.and_utc().timestamp_millis()
}

/// Where a series' timestamps come from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimestampSource {
    /// The row position. Used with the fixed period policy, which ignores
    /// reference timestamps.
    RowOrder,
    /// Integer milliseconds on the logger's clock.
    Millis { column: String },
    /// A full wall clock date-time.
    DateTime {
        column: String,
        format: Option<String>,
    },
    /// Separate calendar date and time-of-day columns. When the time column
    /// has no hour, `hour` is used, or the hour of the primary series' first
    /// sample if `hour` is not set.
    DateAndTime {
        date_column: String,
        time_column: String,
        date_format: String,
        hour: Option<u32>,
    },
}

impl TimestampSource {
    pub fn millis(column: &str) -> Self {
        TimestampSource::Millis {
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone)]
enum ResolvedSource {
    RowOrder,
    Millis(usize),
    DateTime(usize, Option<String>),
    DateAndTime {
        date: usize,
        time: usize,
        date_format: String,
        hour: Option<u32>,
    },
}

/// A timestamp field of one row that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFieldError {
    pub column: String,
    pub error: TimestampError,
}

impl TimestampFieldError {
    /// The fatal form, for rows a run cannot do without.
    pub fn at_row(self, input: &str, row: usize) -> PipelineError {
        PipelineError::TimestampParse {
            input: input.into(),
            row,
            column: self.column,
            error: self.error,
        }
    }
}

impl From<TimestampFieldError> for SkipReason {
    fn from(value: TimestampFieldError) -> Self {
        SkipReason::InvalidTimestamp {
            column: value.column,
            error: value.error,
        }
    }
}

/// A [`TimestampSource`] with its columns looked up in one table.
#[derive(Debug, Clone)]
pub struct TimestampReader {
    source: ResolvedSource,
}

impl TimestampReader {
    pub fn new(source: &TimestampSource, table: &Table) -> Result<Self, PipelineError> {
        let source = match source {
            TimestampSource::RowOrder => ResolvedSource::RowOrder,
            TimestampSource::Millis { column } => ResolvedSource::Millis(table.column(column)?),
            TimestampSource::DateTime { column, format } => {
                ResolvedSource::DateTime(table.column(column)?, format.clone())
            }
            TimestampSource::DateAndTime {
                date_column,
                time_column,
                date_format,
                hour,
            } => {
                if let Some(hour) = hour.filter(|hour| *hour > 23) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "hour {} is not an hour of day",
                        hour
                    )));
                }
                ResolvedSource::DateAndTime {
                    date: table.column(date_column)?,
                    time: table.column(time_column)?,
                    date_format: date_format.clone(),
                    hour: *hour,
                }
            }
        };
        Ok(Self { source })
    }

    /// True when the hour has to come from elsewhere.
    pub fn needs_broadcast_hour(&self) -> bool {
        matches!(self.source, ResolvedSource::DateAndTime { hour: None, .. })
    }

    pub fn carries_wall_clock(&self) -> bool {
        matches!(
            self.source,
            ResolvedSource::DateTime(..) | ResolvedSource::DateAndTime { .. }
        )
    }

    /// Normalized timestamp of `row` in milliseconds. Wall clock sources give
    /// milliseconds since the unix epoch.
    pub fn instant_ms(
        &self,
        table: &Table,
        row: usize,
        broadcast_hour: Option<u32>,
    ) -> Result<i64, TimestampFieldError> {
        match &self.source {
            ResolvedSource::RowOrder => Ok(row as i64),
            ResolvedSource::Millis(column) => {
                let value = required(table, row, *column)?;
                parse_millis(value).map_err(|error| invalid(table, *column, error))
            }
            ResolvedSource::DateTime(column, format) => {
                let value = required(table, row, *column)?;
                parse_date_time(value, format.as_deref())
                    .map(date_time_ms)
                    .map_err(|error| invalid(table, *column, error))
            }
            ResolvedSource::DateAndTime {
                date,
                time,
                date_format,
                hour,
            } => {
                let date_value = required(table, row, *date)?;
                let parsed_date =
                    parse_date(date_value, date_format).map_err(|error| invalid(table, *date, error))?;

                let time_value = required(table, row, *time)?;
                let clock = parse_time_of_day(time_value).map_err(|error| invalid(table, *time, error))?;
                let hour = match clock.hour.or(*hour).or(broadcast_hour) {
                    Some(hour) => hour,
                    None => {
                        return Err(invalid(
                            table,
                            *time,
                            TimestampError::InvalidTimeOfDay(time_value.into()),
                        ));
                    }
                };
                let time_of_day = clock
                    .at_hour(hour)
                    .map_err(|error| invalid(table, *time, error))?;
                Ok(date_time_ms(parsed_date.and_time(time_of_day)))
            }
        }
    }

    /// Like [`Self::instant_ms`], but a millisecond column keeps its
    /// fraction.
    pub fn fractional_ms(&self, table: &Table, row: usize) -> Result<f64, TimestampFieldError> {
        match &self.source {
            ResolvedSource::Millis(column) => {
                let value = required(table, row, *column)?;
                parse_fractional_millis(value).map_err(|error| invalid(table, *column, error))
            }
            _ => self.instant_ms(table, row, None).map(|ms| ms as f64),
        }
    }
}

/// Hour of day (UTC) of a normalized wall clock timestamp.
pub fn hour_of_instant(instant_ms: i64) -> Option<u32> {
    DateTime::from_timestamp_millis(instant_ms).map(|date_time| date_time.hour())
}

fn required(table: &Table, row: usize, column: usize) -> Result<&str, TimestampFieldError> {
    table
        .field(row, column)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| invalid(table, column, TimestampError::Missing))
}

fn invalid(table: &Table, column: usize, error: TimestampError) -> TimestampFieldError {
    TimestampFieldError {
        column: table.header()[column].clone(),
        error,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn millis_accepts_integer_and_float_text() {
        assert_eq!(parse_millis("2430823"), Ok(2430823));
        assert_eq!(parse_millis(" 1500.0 "), Ok(1500));
        assert_eq!(
            parse_millis("12:00"),
            Err(TimestampError::InvalidMillis("12:00".into()))
        );
        assert!(parse_millis("NaN").is_err());
    }

    #[test]
    fn date_time_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_milli_opt(14, 5, 3, 250)
            .unwrap();
        assert_eq!(parse_date_time("2025-03-01T14:05:03.250", None), Ok(expected));
        assert_eq!(parse_date_time("2025-03-01 14:05:03.25", None), Ok(expected));
        assert_eq!(parse_date_time("2025-03-01T14:05:03.250Z", None), Ok(expected));
        assert_eq!(
            parse_date_time("01.03.2025 14:05:03.250", Some("%d.%m.%Y %H:%M:%S%.f")),
            Ok(expected)
        );
        assert!(parse_date_time("yesterday", None).is_err());
    }

    #[test]
    fn time_of_day_without_hour() {
        let clock = parse_time_of_day("05:03.25").unwrap();
        assert_eq!(
            clock,
            ClockTime {
                hour: None,
                minute: 5,
                millis: 3250
            }
        );
        assert_eq!(
            clock.at_hour(14).unwrap(),
            NaiveTime::from_hms_milli_opt(14, 5, 3, 250).unwrap()
        );
    }

    #[test]
    fn time_of_day_with_hour_ignores_broadcast() {
        let clock = parse_time_of_day("09:59:59.9999").unwrap();
        assert_eq!(clock.hour, Some(9));
        assert_eq!(clock.millis, 59_999);
        assert_eq!(
            clock.at_hour(14).unwrap(),
            NaiveTime::from_hms_milli_opt(9, 59, 59, 999).unwrap()
        );
    }

    #[test]
    fn time_of_day_rejects_garbage() {
        assert!(parse_time_of_day("61:00").is_err());
        assert!(parse_time_of_day("05:60.0").is_err());
        assert!(parse_time_of_day("24:00:00").is_err());
        assert!(parse_time_of_day("0503").is_err());
        assert!(parse_time_of_day("").is_err());
    }

    #[test]
    fn reader_combines_date_time_and_hour() {
        let table = Table::read_from(
            "gps.csv",
            "DATE,TIME,TRACKER Lat\n2025-03-01,05:03.250,27.9\n2025-03-01,bad,27.9\n".as_bytes(),
        )
        .unwrap();
        let reader = TimestampReader::new(
            &TimestampSource::DateAndTime {
                date_column: "DATE".into(),
                time_column: "TIME".into(),
                date_format: "%Y-%m-%d".into(),
                hour: None,
            },
            &table,
        )
        .unwrap();

        assert!(reader.needs_broadcast_hour());
        let expected = date_time_ms(
            NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_milli_opt(14, 5, 3, 250)
                .unwrap(),
        );
        assert_eq!(reader.instant_ms(&table, 0, Some(14)), Ok(expected));
        assert!(matches!(
            reader.instant_ms(&table, 1, Some(14)),
            Err(TimestampFieldError {
                error: TimestampError::InvalidTimeOfDay(_),
                ..
            })
        ));
        // no hour available at all
        assert!(reader.instant_ms(&table, 0, None).is_err());
    }

    #[test]
    fn reader_reports_missing_columns() {
        let table = Table::read_from("log.csv", "Latitude\n1\n".as_bytes()).unwrap();
        assert!(matches!(
            TimestampReader::new(&TimestampSource::millis("Timestamp"), &table),
            Err(PipelineError::RequiredFieldMissing { .. })
        ));
    }

    #[test]
    fn fractional_millis_are_kept() {
        assert_eq!(parse_fractional_millis(" 2458807.5 "), Ok(2458807.5));
        assert_eq!(parse_fractional_millis("1000"), Ok(1000.0));
        assert!(parse_fractional_millis("inf").is_err());

        let table = Table::read_from("flight.csv", "Timestamp\n2458807.5\n\n".as_bytes()).unwrap();
        let reader = TimestampReader::new(&TimestampSource::millis("Timestamp"), &table).unwrap();
        assert_eq!(reader.fractional_ms(&table, 0), Ok(2458807.5));
        assert_eq!(reader.instant_ms(&table, 0, None), Ok(2458807));
    }

    #[test]
    fn empty_timestamp_field_is_missing() {
        let table = Table::read_from(
            "flight.csv",
            "Latitude,Timestamp\n27.9, \n27.9\n".as_bytes(),
        )
        .unwrap();
        let reader = TimestampReader::new(&TimestampSource::millis("Timestamp"), &table).unwrap();
        // blank and absent fields read the same
        assert_eq!(
            reader.instant_ms(&table, 0, None),
            reader.instant_ms(&table, 1, None)
        );
        let error = reader.instant_ms(&table, 1, None).unwrap_err();
        assert_eq!(
            error,
            TimestampFieldError {
                column: "Timestamp".into(),
                error: TimestampError::Missing,
            }
        );
        assert_eq!(
            error.at_row("flight.csv", 0).to_string(),
            "flight.csv data row 1: column \"Timestamp\": no timestamp value"
        );
    }
}
