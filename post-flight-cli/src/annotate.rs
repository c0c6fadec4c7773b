use anyhow::{Context as _, Result};
use log::info;
use post_flight_core::pipeline::{annotate_distance, annotate_range};

use crate::{
    args::{DistanceCli, RangeCli},
    config::PostFlightConfig,
    csv_file::{read_table, sibling_path, write_table_atomic},
};

pub fn distance(args: DistanceCli, config: &PostFlightConfig) -> Result<()> {
    let input = read_table(&args.input)?;

    let mut distance_config = config.distance.clone();
    let station = &mut distance_config.ground_station;
    station.latitude_deg = args.station_lat.unwrap_or(station.latitude_deg);
    station.longitude_deg = args.station_lon.unwrap_or(station.longitude_deg);
    station.altitude_m = args.station_alt.unwrap_or(station.altitude_m);
    info!(
        "ground station at {}, {}, {}m",
        station.latitude_deg, station.longitude_deg, station.altitude_m
    );

    let (output_table, report) = annotate_distance(&input, &distance_config)
        .with_context(|| format!("failed to compute distances for {}", input.name()))?;

    let output = args
        .output
        .unwrap_or_else(|| sibling_path(&args.input, "distance", "csv"));
    write_table_atomic(&output, &output_table)?;
    report.log_summary("distance");
    info!("distances written to {}", output.display());
    Ok(())
}

pub fn range(args: RangeCli, config: &PostFlightConfig) -> Result<()> {
    let input = read_table(&args.input)?;

    let mut range_config = config.range.clone();
    if let Some(reference_level) = args.reference_level {
        range_config.reference_level_dbm = reference_level;
    }
    if let Some(divisor) = args.divisor {
        range_config.divisor = divisor;
    }

    let (output_table, report) = annotate_range(&input, &range_config)
        .with_context(|| format!("failed to compute ranges for {}", input.name()))?;

    let output = args
        .output
        .unwrap_or_else(|| sibling_path(&args.input, "ranges", "csv"));
    write_table_atomic(&output, &output_table)?;
    report.log_summary("range");
    info!("ranges written to {}", output.display());
    Ok(())
}
