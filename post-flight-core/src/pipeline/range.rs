use serde::{Deserialize, Serialize};

use crate::{error::PipelineError, report::ProcessReport, table::Table};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RangeConfig {
    /// received power the range is normalized against, dBm
    pub reference_level_dbm: f64,
    pub divisor: f64,
    pub distance_column: String,
    pub rssi_column: String,
    pub output_column: String,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            reference_level_dbm: -126.0,
            divisor: 1000.0,
            distance_column: "Distance".into(),
            rssi_column: "RSSI".into(),
            output_column: "CalculatedValue".into(),
        }
    }
}

/// `distance * 10^(|rssi - reference_level| / 20)`: the distance at which the
/// signal would have dropped to the reference level, assuming free space loss.
pub fn estimate_range(rssi_dbm: f64, distance: f64, reference_level_dbm: f64) -> f64 {
    let exponent = (rssi_dbm - reference_level_dbm).abs() / 20.0;
    distance * 10f64.powf(exponent)
}

/// Appends the scaled range estimate to every row whose distance and RSSI
/// parse. Other rows are dropped from the output.
pub fn annotate_range(
    input: &Table,
    config: &RangeConfig,
) -> Result<(Table, ProcessReport), PipelineError> {
    if config.divisor == 0.0 || !config.divisor.is_finite() {
        return Err(PipelineError::InvalidConfig(format!(
            "range divisor must be a non-zero number, got {}",
            config.divisor
        )));
    }
    input.ensure_not_empty()?;
    let distance = input.column(&config.distance_column)?;
    let rssi = input.column(&config.rssi_column)?;

    let mut report = ProcessReport::new(input.len());
    let mut kept = Vec::with_capacity(input.len());
    let mut values = Vec::with_capacity(input.len());
    for row in 0..input.len() {
        let value = input.parse_f64(row, distance).and_then(|distance| {
            let rssi = input.parse_f64(row, rssi)?;
            Ok(estimate_range(rssi, distance, config.reference_level_dbm) / config.divisor)
        });
        match value {
            Ok(value) => {
                kept.push(row);
                values.push(value);
            }
            Err(reason) => report.skip(input.name(), row, reason),
        }
    }

    let mut output = input.select_rows(&kept);
    let column = output.column_or_push(&config.output_column);
    for (row, value) in values.into_iter().enumerate() {
        output.set_field(row, column, value.to_string());
    }

    report.rows_out = output.len();
    Ok((output, report))
}
