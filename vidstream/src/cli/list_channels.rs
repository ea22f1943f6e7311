use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
pub struct ListChannelsCommand {
    /// Channel registry file (YAML); the built-in list is used when omitted
    #[arg(long)]
    pub channels: Option<PathBuf>,
}

impl ListChannelsCommand {
    pub async fn run(self) -> Result<()> {
        let registry = super::load_registry(self.channels.as_deref())?;
        let default = &registry.default_entry().label;

        println!("Channels:");
        for entry in &registry {
            let marker = if &entry.label == default { "*" } else { " " };
            println!("  {} {} -> {}", marker, entry.label, entry.stream_url);
        }
        Ok(())
    }
}
