use anyhow::{Context as _, Result};
use log::info;
use post_flight_core::pipeline::interpolate_positions;

use crate::{
    args::InterpolateCli,
    config::PostFlightConfig,
    csv_file::{read_table, sibling_path, write_table_atomic},
};

pub fn interpolate(args: InterpolateCli, config: &PostFlightConfig) -> Result<()> {
    let input = read_table(&args.input)?;
    let interpolation = &config.interpolation;
    info!(
        "interpolating from ({}, {}) at {}ms to ({}, {}) at {}ms",
        interpolation.start.latitude_deg,
        interpolation.start.longitude_deg,
        interpolation.start_timestamp_ms,
        interpolation.end.latitude_deg,
        interpolation.end.longitude_deg,
        interpolation.end_timestamp_ms
    );

    let (output_table, report) = interpolate_positions(&input, interpolation)
        .with_context(|| format!("failed to interpolate positions in {}", input.name()))?;

    let output = args
        .output
        .unwrap_or_else(|| sibling_path(&args.input, "interpolated", "csv"));
    write_table_atomic(&output, &output_table)?;
    report.log_summary("interpolate");
    info!("interpolated log written to {}", output.display());
    Ok(())
}
