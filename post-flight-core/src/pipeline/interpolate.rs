use serde::{Deserialize, Serialize};

use crate::{
    error::PipelineError,
    report::ProcessReport,
    table::Table,
    timestamp::{TimestampReader, TimestampSource},
    utils::lerp,
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl LatLon {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
        }
    }
}

/// Two known fixes the track is drawn between.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InterpolationConfig {
    pub start: LatLon,
    pub end: LatLon,
    pub start_timestamp_ms: i64,
    pub end_timestamp_ms: i64,
    pub timestamp_column: String,
    pub latitude_column: String,
    pub longitude_column: String,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        Self {
            start: LatLon::new(27.93318457539223, -80.70954861471066),
            end: LatLon::new(27.93313577679315, -80.71036862137707),
            start_timestamp_ms: 2430823,
            end_timestamp_ms: 2486792,
            timestamp_column: "Timestamp".into(),
            latitude_column: "Latitude".into(),
            longitude_column: "Longitude".into(),
        }
    }
}

/// Rewrites Latitude and Longitude of every row as a straight line between
/// the configured fixes, by timestamp. Rows outside the window are
/// extrapolated.
pub fn interpolate_positions(
    input: &Table,
    config: &InterpolationConfig,
) -> Result<(Table, ProcessReport), PipelineError> {
    if config.start_timestamp_ms == config.end_timestamp_ms {
        return Err(PipelineError::InvalidConfig(format!(
            "interpolation window is empty: start and end are both {}ms",
            config.start_timestamp_ms
        )));
    }
    input.ensure_not_empty()?;
    let reader = TimestampReader::new(&TimestampSource::millis(&config.timestamp_column), input)?;
    let latitude = input.column(&config.latitude_column)?;
    let longitude = input.column(&config.longitude_column)?;

    let t0 = config.start_timestamp_ms as f64;
    let t1 = config.end_timestamp_ms as f64;
    let mut output = input.clone();
    for row in 0..input.len() {
        let t = reader
            .fractional_ms(input, row)
            .map_err(|error| error.at_row(input.name(), row))?;

        let lat = lerp(t, t0, t1, config.start.latitude_deg, config.end.latitude_deg);
        let lon = lerp(t, t0, t1, config.start.longitude_deg, config.end.longitude_deg);
        output.set_field(row, latitude, lat.to_string());
        output.set_field(row, longitude, lon.to_string());
    }

    let mut report = ProcessReport::new(input.len());
    report.rows_out = output.len();
    Ok((output, report))
}
