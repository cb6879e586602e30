use clap::Parser;

use crate::config::ClientConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Write the resolved settings to the config file
    #[arg(long)]
    pub save: bool,
}

pub fn config(config: &ClientConfig, args: ConfigArgs) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if args.save {
        config.store()?;
        println!("Saved to {}", ClientConfig::path()?.display());
    }
    Ok(())
}
