#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::Parser;
use coolcart::{App, Cli, Config, commands};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Install the ring crypto provider for rustls before the first TLS
    // connection; reqwest fails at runtime otherwise when several providers
    // are compiled in.
    if let Err(error) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("Warning: failed to install default crypto provider: {error:?}");
    }

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let config = Config::load_or_init()?;
    let app = App::init(config);
    commands::dispatch(&app, cli.command).await
}
