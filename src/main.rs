mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{App, Cli, Commands, InfoArgs};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let app = App::new(cli.config.as_deref())?;

    match cli.command {
        Commands::Info {
            rate,
            elapsed,
            duration,
            url,
            title,
            artist,
            no_item,
        } => {
            app.info(InfoArgs {
                rate,
                elapsed,
                duration,
                url,
                title,
                artist,
                no_item,
            })?;
        }
        Commands::Simulate {
            duration,
            seconds,
            title,
            url,
            surface,
        } => {
            app.simulate(duration, seconds, title, url, surface)?;
        }
        Commands::Config => {
            app.show_config()?;
        }
    }

    Ok(())
}
