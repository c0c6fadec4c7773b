mod annotate;
mod args;
mod config;
mod csv_file;
mod gen_config;
mod interpolate;
mod merge_gps;
mod plot;

use anyhow::Result;
use args::{Cli, ModeSelect};
use clap::Parser;
use config::PostFlightConfig;
use log::LevelFilter;

fn main() -> Result<()> {
    let args = Cli::parse();
    let _ = env_logger::builder()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .try_init();

    let config = || PostFlightConfig::load(args.config.as_deref());
    match args.mode {
        ModeSelect::MergeGps(cli) => merge_gps::merge_gps(cli, &config()?),
        ModeSelect::ReplaceAltitude(cli) => merge_gps::replace_altitude(cli, &config()?),
        ModeSelect::Distance(cli) => annotate::distance(cli, &config()?),
        ModeSelect::Range(cli) => annotate::range(cli, &config()?),
        ModeSelect::Interpolate(cli) => interpolate::interpolate(cli, &config()?),
        ModeSelect::Plot(cli) => plot::plot(cli, &config()?),
        ModeSelect::GenConfig(cli) => gen_config::gen_config(cli),
    }
}
