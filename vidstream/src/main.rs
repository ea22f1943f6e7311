use anyhow::Result;
use clap::Parser;

mod cli;
mod media;
mod playlist;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    let mut logger = pretty_env_logger::formatted_builder();
    logger.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    cli::Args::parse().run().await
}
