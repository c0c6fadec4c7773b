use anyhow::{Context as _, Result};
use log::{info, warn};
use post_flight_core::{TimeBasePolicy, pipeline::merge_reference, timestamp::TimestampSource};

use crate::{
    args::{MergeGpsCli, ReplaceAltitudeCli},
    config::PostFlightConfig,
    csv_file::{read_table, sibling_path, write_table_atomic},
};

pub fn merge_gps(args: MergeGpsCli, config: &PostFlightConfig) -> Result<()> {
    let primary = read_table(&args.primary)?;
    let gps = read_table(&args.gps)?;

    let mut merge_config = config.merge_gps.clone();
    if let Some(sampling_period_ms) = args.period_ms {
        merge_config.policy = TimeBasePolicy::RawMillisecondOffset { sampling_period_ms };
    }
    if let Some(hour) = args.hour {
        match &mut merge_config.reference_timestamp {
            TimestampSource::DateAndTime { hour: source_hour, .. } => *source_hour = Some(hour),
            _ => warn!("--hour has no effect, GPS timestamps are not read from date and time columns"),
        }
    }

    let (merged, report) = merge_reference(&primary, &gps, &merge_config)
        .with_context(|| format!("failed to merge {} into {}", gps.name(), primary.name()))?;

    let output = args
        .output
        .unwrap_or_else(|| sibling_path(&args.primary, "merged", "csv"));
    write_table_atomic(&output, &merged)?;
    report.log_summary("merge-gps");
    info!("merged log written to {}", output.display());
    Ok(())
}

pub fn replace_altitude(args: ReplaceAltitudeCli, config: &PostFlightConfig) -> Result<()> {
    let primary = read_table(&args.primary)?;
    let altitude = read_table(&args.altitude_source)?;

    let mut merge_config = config.replace_altitude.clone();
    if let Some(offset_ms) = args.offset_ms {
        merge_config.policy = TimeBasePolicy::ConstantOffset {
            offset_ms: Some(offset_ms),
        };
    }

    let (merged, report) = merge_reference(&primary, &altitude, &merge_config).with_context(|| {
        format!(
            "failed to replace the altitude of {} from {}",
            primary.name(),
            altitude.name()
        )
    })?;

    let output = args
        .output
        .unwrap_or_else(|| sibling_path(&args.primary, "altitude", "csv"));
    write_table_atomic(&output, &merged)?;
    report.log_summary("replace-altitude");
    info!("log with replaced altitude written to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn merge_gps_writes_next_to_primary() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("flight2.csv");
        let gps = dir.path().join("gps.csv");
        fs::write(
            &primary,
            "Timestamp,Latitude,Longitude,Altitude\n0,0,0,1\n1500,0,0,2\n5000,0,0,3\n",
        )
        .unwrap();
        fs::write(
            &gps,
            "TRACKER Lat,TRACKER Lon\n27.1,-80.1\n27.2,-80.2\n27.3,-80.3\n",
        )
        .unwrap();

        merge_gps(
            MergeGpsCli {
                primary: primary.clone(),
                gps,
                output: None,
                period_ms: None,
                hour: None,
            },
            &PostFlightConfig::default(),
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("flight2-merged.csv")).unwrap(),
            "Timestamp,Latitude,Longitude,Altitude\n\
             0,27.1,-80.1,1\n\
             1500,27.2,-80.2,2\n\
             5000,27.3,-80.3,3\n"
        );
    }

    #[test]
    fn replace_altitude_with_explicit_output() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("laptop.csv");
        let local = dir.path().join("local.csv");
        let output = dir.path().join("out.csv");
        fs::write(&primary, "Timestamp,Altitude\n100,0\n250,0\n").unwrap();
        fs::write(&local, "Timestamp,Altitude\n90,5\n200,7\n").unwrap();

        replace_altitude(
            ReplaceAltitudeCli {
                primary,
                altitude_source: local,
                output: Some(output.clone()),
                offset_ms: None,
            },
            &PostFlightConfig::default(),
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(output).unwrap(),
            "Timestamp,Altitude\n100,5\n250,7\n"
        );
    }

    #[test]
    fn failed_merge_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("flight2.csv");
        let gps = dir.path().join("gps.csv");
        fs::write(&primary, "Timestamp,Latitude,Longitude\n0,0,0\n").unwrap();
        fs::write(&gps, "Lat,Lon\n1,1\n").unwrap();

        let error = merge_gps(
            MergeGpsCli {
                primary,
                gps,
                output: None,
                period_ms: None,
                hour: None,
            },
            &PostFlightConfig::default(),
        )
        .unwrap_err();

        assert!(format!("{:#}", error).contains("gps.csv has no \"TRACKER Lat\" column"));
        assert!(!dir.path().join("flight2-merged.csv").exists());
    }
}
