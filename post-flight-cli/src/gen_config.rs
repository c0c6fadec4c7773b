use anyhow::{Result, bail};
use log::info;

use crate::{args::GenConfigCli, config::PostFlightConfig};

pub fn gen_config(args: GenConfigCli) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists, pass --force to overwrite it",
            args.path.display()
        );
    }

    PostFlightConfig::default().save(&args.path)?;
    info!("default configuration written to {}", args.path.display());
    Ok(())
}
