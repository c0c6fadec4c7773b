use serde::{Deserialize, Serialize};

use crate::{
    error::PipelineError,
    geodetic::{GeodeticPosition, ecef_distance},
    report::ProcessReport,
    table::Table,
    utils::format_fixed,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DistanceConfig {
    pub ground_station: GeodeticPosition,
    pub latitude_column: String,
    pub longitude_column: String,
    pub altitude_column: String,
    pub output_column: String,
    pub decimals: usize,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            ground_station: GeodeticPosition::new(27.93241, -80.7095, 10.0),
            latitude_column: "Latitude".into(),
            longitude_column: "Longitude".into(),
            altitude_column: "Altitude".into(),
            output_column: "Distance".into(),
            decimals: 2,
        }
    }
}

/// Appends the straight line distance from the ground station to every row.
/// Rows whose position does not parse are dropped from the output.
pub fn annotate_distance(
    input: &Table,
    config: &DistanceConfig,
) -> Result<(Table, ProcessReport), PipelineError> {
    input.ensure_not_empty()?;
    let latitude = input.column(&config.latitude_column)?;
    let longitude = input.column(&config.longitude_column)?;
    let altitude = input.column(&config.altitude_column)?;

    let ground = config.ground_station.to_ecef();
    log_info!(
        "ground station ECEF: x={:.3} y={:.3} z={:.3}",
        ground.x,
        ground.y,
        ground.z
    );

    let mut report = ProcessReport::new(input.len());
    let mut kept = Vec::with_capacity(input.len());
    let mut distances = Vec::with_capacity(input.len());
    for row in 0..input.len() {
        let position = input.parse_f64(row, latitude).and_then(|latitude_deg| {
            Ok(GeodeticPosition::new(
                latitude_deg,
                input.parse_f64(row, longitude)?,
                input.parse_f64(row, altitude)?,
            ))
        });
        match position {
            Ok(position) => {
                kept.push(row);
                distances.push(ecef_distance(&ground, &position.to_ecef()));
            }
            Err(reason) => report.skip(input.name(), row, reason),
        }
    }

    let mut output = input.select_rows(&kept);
    let column = output.column_or_push(&config.output_column);
    for (row, distance) in distances.into_iter().enumerate() {
        output.set_field(row, column, format_fixed(distance, config.decimals));
    }

    report.rows_out = output.len();
    Ok((output, report))
}
