use serde::{Deserialize, Serialize};

use crate::{
    aligner::{TimeBasePolicy, TimeSeriesAligner},
    error::{AlignError, PipelineError, SeriesRole},
    report::ProcessReport,
    table::Table,
    time_series::{Sample, TimeSeries},
    timestamp::{TimestampReader, TimestampSource, hour_of_instant},
};

/// Copy the reference column `source` into the primary column `target`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub target: String,
    pub source: String,
}

impl FieldMapping {
    pub fn new(target: &str, source: &str) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    pub policy: TimeBasePolicy,
    pub primary_timestamp: TimestampSource,
    pub reference_timestamp: TimestampSource,
    pub fields: Vec<FieldMapping>,
}

impl MergeConfig {
    /// Tracker fixes logged about once a second with no usable timestamp,
    /// merged into the flight computer log's Latitude/Longitude.
    pub fn gps_tracker() -> Self {
        Self {
            policy: TimeBasePolicy::RawMillisecondOffset {
                sampling_period_ms: 1000,
            },
            primary_timestamp: TimestampSource::millis("Timestamp"),
            reference_timestamp: TimestampSource::RowOrder,
            fields: vec![
                FieldMapping::new("Latitude", "TRACKER Lat"),
                FieldMapping::new("Longitude", "TRACKER Lon"),
            ],
        }
    }

    /// Altitude from a second log sharing the same millisecond clock.
    pub fn altitude() -> Self {
        Self {
            policy: TimeBasePolicy::ConstantOffset { offset_ms: Some(0) },
            primary_timestamp: TimestampSource::millis("Timestamp"),
            reference_timestamp: TimestampSource::millis("Timestamp"),
            fields: vec![FieldMapping::new("Altitude", "Altitude")],
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self::gps_tracker()
    }
}

/// Overwrites the mapped fields of every `primary` row with the values of the
/// reference row the aligner picked for it.
///
/// The output has the primary rows in their input order. A primary row
/// whose timestamp cannot be read is written unchanged; a reference row whose
/// timestamp cannot be read is left out of the join. Both are recorded in the
/// report. The fixed period policy counts from the first primary row, so an
/// unreadable timestamp there is fatal.
pub fn merge_reference(
    primary: &Table,
    reference: &Table,
    config: &MergeConfig,
) -> Result<(Table, ProcessReport), PipelineError> {
    primary.ensure_not_empty()?;
    reference.ensure_not_empty()?;
    if config.fields.is_empty() {
        return Err(PipelineError::InvalidConfig("no fields to merge".into()));
    }

    let primary_reader = TimestampReader::new(&config.primary_timestamp, primary)?;
    let reference_reader = TimestampReader::new(&config.reference_timestamp, reference)?;
    if config.policy == TimeBasePolicy::AbsoluteTime
        && !(primary_reader.carries_wall_clock() && reference_reader.carries_wall_clock())
    {
        return Err(PipelineError::InvalidConfig(
            "absolute time alignment needs date-time timestamps on both inputs".into(),
        ));
    }

    let columns = config
        .fields
        .iter()
        .map(|mapping| Ok((primary.column(&mapping.target)?, reference.column(&mapping.source)?)))
        .collect::<Result<Vec<(usize, usize)>, PipelineError>>()?;

    let mut report = ProcessReport::new(primary.len());

    let anchored_on_first_row = matches!(
        config.policy,
        TimeBasePolicy::RawMillisecondOffset { .. }
    );
    let mut primary_samples = Vec::with_capacity(primary.len());
    for row in 0..primary.len() {
        match primary_reader.instant_ms(primary, row, None) {
            Ok(timestamp_ms) => primary_samples.push(Sample::new(timestamp_ms, row)),
            Err(error) if row == 0 && anchored_on_first_row => {
                return Err(error.at_row(primary.name(), row));
            }
            Err(error) => report.skip(primary.name(), row, error.into()),
        }
    }
    let primary_series = TimeSeries::new(primary_samples);

    let broadcast_hour = if reference_reader.needs_broadcast_hour() {
        Some(primary_hour(&primary_reader, &primary_series)?)
    } else {
        None
    };

    let mut reference_samples = Vec::with_capacity(reference.len());
    for row in 0..reference.len() {
        match reference_reader.instant_ms(reference, row, broadcast_hour) {
            Ok(timestamp_ms) => reference_samples.push(Sample::new(timestamp_ms, row)),
            Err(error) => report.skip(reference.name(), row, error.into()),
        }
    }
    let reference_series = TimeSeries::new(reference_samples);

    log_info!(
        "aligning {} samples from {} with {} samples from {}",
        primary_series.len(),
        primary.name(),
        reference_series.len(),
        reference.name()
    );
    let alignment =
        TimeSeriesAligner::new(config.policy.clone()).align(&primary_series, &reference_series)?;
    if alignment.fallback_count() > 0 {
        log_info!(
            "{} primary samples fell back to the first or last reference sample",
            alignment.fallback_count()
        );
    }

    let mut output = primary.clone();
    for (sample, &matched) in primary_series.samples().iter().zip(alignment.matches()) {
        let reference_row = reference_series.samples()[matched].data;
        for &(target, source) in columns.iter() {
            let value = reference.field(reference_row, source).unwrap_or_default();
            output.set_field(sample.data, target, value);
        }
    }

    report.rows_out = output.len();
    Ok((output, report))
}

/// Hour of the first primary sample, used for reference times written without
/// an hour. Rejects primary logs that leave that hour, since one broadcast
/// hour cannot describe them.
fn primary_hour(
    primary_reader: &TimestampReader,
    primary_series: &TimeSeries<usize>,
) -> Result<u32, PipelineError> {
    if !primary_reader.carries_wall_clock() {
        return Err(PipelineError::InvalidConfig(
            "the reference time column has no hour and the primary timestamps carry no \
             hour of day; set `hour` on the reference timestamp"
                .into(),
        ));
    }

    let first = primary_series
        .samples()
        .first()
        .ok_or(AlignError::EmptySeries(SeriesRole::Primary))?;
    let expected_hour = hour_of_instant(first.timestamp_ms).ok_or_else(|| {
        PipelineError::InvalidConfig("primary timestamp out of the calendar range".into())
    })?;

    for sample in primary_series.samples() {
        let found_hour = hour_of_instant(sample.timestamp_ms).unwrap_or(expected_hour);
        if found_hour != expected_hour {
            return Err(PipelineError::HourBoundaryCrossed {
                row: sample.data,
                expected_hour,
                found_hour,
            });
        }
    }

    log_info!("using hour {} from the first primary sample for reference times", expected_hour);
    Ok(expected_hour)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{report::SkipReason, tests::init_logger};

    fn table(name: &str, csv: &str) -> Table {
        Table::read_from(name, csv.as_bytes()).unwrap()
    }

    fn column(table: &Table, name: &str) -> Vec<String> {
        let column = table.column(name).unwrap();
        (0..table.len())
            .map(|row| table.field(row, column).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn gps_tracker_fixed_period() {
        init_logger();
        let primary = table(
            "flight.csv",
            "Timestamp,Latitude,Longitude,Altitude\n\
             2430823,0,0,10\n\
             2432323,0,0,250\n\
             2435823,0,0,900\n",
        );
        let gps = table(
            "gps.csv",
            "TRACKER Lat,TRACKER Lon,RSSI\n\
             27.9331,-80.7095,-90\n\
             27.9332,-80.7096,-95\n\
             27.9333,-80.7097,-99\n",
        );

        let (merged, report) = merge_reference(&primary, &gps, &MergeConfig::gps_tracker()).unwrap();

        assert_eq!(column(&merged, "Latitude"), ["27.9331", "27.9332", "27.9333"]);
        assert_eq!(column(&merged, "Longitude"), ["-80.7095", "-80.7096", "-80.7097"]);
        assert_eq!(column(&merged, "Altitude"), ["10", "250", "900"]);
        assert_eq!(merged.header(), primary.header());
        assert_eq!(report.rows_out, 3);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn unreadable_primary_timestamp_passes_row_through() {
        let primary = table(
            "flight.csv",
            "Timestamp,Latitude,Longitude\n0,1,1\nglitch,2,2\n2000,3,3\n",
        );
        let gps = table(
            "gps.csv",
            "TRACKER Lat,TRACKER Lon\n10,20\n11,21\n12,22\n",
        );

        let (merged, report) = merge_reference(&primary, &gps, &MergeConfig::gps_tracker()).unwrap();

        assert_eq!(column(&merged, "Latitude"), ["10", "2", "12"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].row, 1);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::InvalidTimestamp { .. }
        ));
    }

    #[test]
    fn unreadable_first_primary_timestamp_is_fatal_for_fixed_period() {
        let primary = table(
            "flight.csv",
            "Timestamp,Latitude,Longitude\nglitch,1,1\n1000,2,2\n2000,3,3\n",
        );
        let gps = table(
            "gps.csv",
            "TRACKER Lat,TRACKER Lon\n10,20\n11,21\n12,22\n",
        );

        let error = merge_reference(&primary, &gps, &MergeConfig::gps_tracker()).unwrap_err();
        assert!(matches!(
            &error,
            PipelineError::TimestampParse { row: 0, column, .. } if column == "Timestamp"
        ));
        assert!(error.to_string().starts_with("flight.csv data row 1"));
    }

    #[test]
    fn altitude_as_of_join() {
        let laptop = table(
            "laptop.csv",
            "SystemTimestamp,Timestamp,Latitude,Altitude\n\
             2025-03-01T14:00:00,900,27.9,0\n\
             2025-03-01T14:00:01,1000,27.9,0\n\
             2025-03-01T14:00:02,1750,27.9,0\n\
             2025-03-01T14:00:03,1500,27.9,0\n",
        );
        let local = table(
            "local.csv",
            "Timestamp,Latitude,Longitude,Velocity,Altitude\n\
             1000,0,0,0,11.5\n\
             1500,0,0,0,42.0\n\
             2000,0,0,0,97.25\n",
        );

        let (merged, _) = merge_reference(&laptop, &local, &MergeConfig::altitude()).unwrap();

        // 900 precedes every reference sample and takes the earliest one
        assert_eq!(column(&merged, "Altitude"), ["11.5", "11.5", "42.0", "42.0"]);
        assert_eq!(column(&merged, "Timestamp"), ["900", "1000", "1750", "1500"]);
    }

    fn absolute_config(hour: Option<u32>) -> MergeConfig {
        MergeConfig {
            policy: TimeBasePolicy::AbsoluteTime,
            primary_timestamp: TimestampSource::DateTime {
                column: "SystemTimestamp".into(),
                format: None,
            },
            reference_timestamp: TimestampSource::DateAndTime {
                date_column: "DATE".into(),
                time_column: "TIME".into(),
                date_format: "%Y-%m-%d".into(),
                hour,
            },
            fields: vec![
                FieldMapping::new("Latitude", "TRACKER Lat"),
                FieldMapping::new("Longitude", "TRACKER Lon"),
            ],
        }
    }

    #[test]
    fn absolute_time_with_broadcast_hour() {
        let primary = table(
            "laptop.csv",
            "SystemTimestamp,Latitude,Longitude\n\
             2025-03-01T14:05:00.500,0,0\n\
             2025-03-01T14:05:02.000,0,0\n\
             2025-03-01T14:05:04.100,0,0\n",
        );
        let gps = table(
            "gps.csv",
            "DATE,TIME,TRACKER Lat,TRACKER Lon\n\
             2025-03-01,05:03.000,3,-3\n\
             2025-03-01,05:01.000,1,-1\n\
             2025-03-01,05:02.000,2,-2\n\
             2025-03-01,not a time,9,-9\n",
        );

        let (merged, report) = merge_reference(&primary, &gps, &absolute_config(None)).unwrap();

        assert_eq!(column(&merged, "Latitude"), ["1", "2", "3"]);
        assert_eq!(column(&merged, "Longitude"), ["-1", "-2", "-3"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].input, "gps.csv");
        assert_eq!(report.skipped[0].row, 3);
    }

    #[test]
    fn broadcast_hour_rejects_logs_crossing_the_hour() {
        let primary = table(
            "laptop.csv",
            "SystemTimestamp,Latitude,Longitude\n\
             2025-03-01T14:59:58,0,0\n\
             2025-03-01T15:00:01,0,0\n",
        );
        let gps = table(
            "gps.csv",
            "DATE,TIME,TRACKER Lat,TRACKER Lon\n2025-03-01,59:57.0,1,1\n",
        );

        let error = merge_reference(&primary, &gps, &absolute_config(None)).unwrap_err();
        assert!(matches!(
            error,
            PipelineError::HourBoundaryCrossed {
                row: 1,
                expected_hour: 14,
                found_hour: 15
            }
        ));
    }

    #[test]
    fn explicit_hour_skips_the_broadcast() {
        let primary = table(
            "laptop.csv",
            "SystemTimestamp,Latitude,Longitude\n\
             2025-03-01T14:59:58,0,0\n\
             2025-03-01T15:00:01,0,0\n",
        );
        let gps = table(
            "gps.csv",
            "DATE,TIME,TRACKER Lat,TRACKER Lon\n\
             2025-03-01,59:57.0,1,1\n\
             2025-03-01,15:00:00.0,2,2\n",
        );

        let (merged, _) = merge_reference(&primary, &gps, &absolute_config(Some(14))).unwrap();
        assert_eq!(column(&merged, "Latitude"), ["1", "2"]);
    }

    #[test]
    fn absolute_time_needs_wall_clock_inputs() {
        let primary = table("flight.csv", "Timestamp,Latitude,Longitude\n0,0,0\n");
        let gps = table(
            "gps.csv",
            "DATE,TIME,TRACKER Lat,TRACKER Lon\n2025-03-01,00:01.0,1,1\n",
        );
        let mut config = absolute_config(None);
        config.primary_timestamp = TimestampSource::millis("Timestamp");

        assert!(matches!(
            merge_reference(&primary, &gps, &config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_reference_column_is_fatal() {
        let primary = table("flight.csv", "Timestamp,Latitude,Longitude\n0,0,0\n");
        let gps = table("gps.csv", "Lat,Lon\n1,1\n");

        let error = merge_reference(&primary, &gps, &MergeConfig::gps_tracker()).unwrap_err();
        assert_eq!(error.to_string(), "gps.csv has no \"TRACKER Lat\" column");
    }

    #[test]
    fn empty_reference_is_fatal() {
        let primary = table("flight.csv", "Timestamp,Latitude,Longitude\n0,0,0\n");
        let gps = table("gps.csv", "TRACKER Lat,TRACKER Lon\n");

        assert!(matches!(
            merge_reference(&primary, &gps, &MergeConfig::gps_tracker()),
            Err(PipelineError::EmptyInput { .. })
        ));
    }

    #[test]
    fn no_readable_primary_timestamp_is_an_empty_series() {
        let primary = table("flight.csv", "Timestamp,Altitude\nx,0\ny,0\n");
        let local = table("local.csv", "Timestamp,Altitude\n1000,11.5\n");

        assert!(matches!(
            merge_reference(&primary, &local, &MergeConfig::altitude()),
            Err(PipelineError::Align(AlignError::EmptySeries(SeriesRole::Primary)))
        ));
    }

    #[test]
    fn merge_config_toml_round_trip() {
        let config = MergeConfig {
            policy: TimeBasePolicy::ConstantOffset { offset_ms: None },
            ..absolute_config(Some(14))
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: MergeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
