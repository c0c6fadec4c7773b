use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(name = "Post Flight CLI")]
#[command(bin_name = "post-flight-cli")]
pub struct Cli {
    #[arg(long, global = true, help = "configuration file, instead of .post-flight.toml")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub mode: ModeSelect,
}

#[derive(Subcommand, Debug)]
pub enum ModeSelect {
    #[command(about = "merge GPS tracker fixes into the flight log's latitude and longitude")]
    MergeGps(MergeGpsCli),

    #[command(about = "replace the flight log's altitude with another log's altitude")]
    ReplaceAltitude(ReplaceAltitudeCli),

    #[command(about = "append the distance from the ground station to every row")]
    Distance(DistanceCli),

    #[command(about = "append the RSSI range estimate to every row")]
    Range(RangeCli),

    #[command(about = "draw latitude and longitude on a line between two fixes")]
    Interpolate(InterpolateCli),

    #[command(about = "plot distance against the range estimate as svg")]
    Plot(PlotCli),

    #[command(about = "write the default configuration")]
    GenConfig(GenConfigCli),
}

#[derive(Parser, Debug)]
pub struct MergeGpsCli {
    pub primary: PathBuf,
    pub gps: PathBuf,
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    #[arg(long, help = "align by row with this GPS sampling period")]
    pub period_ms: Option<i64>,
    #[arg(long, help = "hour of day for GPS times written as MM:SS")]
    pub hour: Option<u32>,
}

#[derive(Parser, Debug)]
pub struct ReplaceAltitudeCli {
    pub primary: PathBuf,
    pub altitude_source: PathBuf,
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    #[arg(long, allow_hyphen_values = true, help = "added to the altitude log's timestamps")]
    pub offset_ms: Option<i64>,
}

#[derive(Parser, Debug)]
pub struct DistanceCli {
    pub input: PathBuf,
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    #[arg(long, allow_hyphen_values = true)]
    pub station_lat: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub station_lon: Option<f64>,
    #[arg(long, allow_hyphen_values = true, help = "ground station altitude in meters")]
    pub station_alt: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct RangeCli {
    pub input: PathBuf,
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    #[arg(long, allow_hyphen_values = true, help = "reference level in dBm")]
    pub reference_level: Option<f64>,
    #[arg(long)]
    pub divisor: Option<f64>,
}

#[derive(Parser, Debug)]
pub struct InterpolateCli {
    pub input: PathBuf,
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct PlotCli {
    pub input: PathBuf,
    #[arg(long, short, help = "svg file, defaults to the input name with .svg")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct GenConfigCli {
    #[arg(default_value = ".post-flight.toml")]
    pub path: PathBuf,
    #[arg(long, help = "overwrite an existing file")]
    pub force: bool,
}
