mod commands;
mod config;
mod lookup;
mod models;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Commands;
use crate::config::AppConfig;
use crate::pipeline::Pipeline;
use crate::scraper::HttpClient;

#[derive(Parser)]
#[command(name = "wikidex", about = "Pokémon and Terraria wiki lookups", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape catalogs and write the JSON cache files
    Setup(SetupTargets),

    /// Look up a Pokémon on Bulbapedia
    Pokemon {
        /// Pokémon name, e.g. `mr mime` or `mega charizard`
        name: Vec<String>,
    },

    /// Look up the ID(s) of a Terraria item prefix
    Prefix {
        name: Vec<String>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = true)]
struct SetupTargets {
    /// Setup for the Pokédex (every species page)
    #[arg(short, long)]
    pokemon: bool,

    /// Setup for Terraria prefixes
    #[arg(short, long)]
    terraria: bool,

    /// Setup everything
    #[arg(short, long)]
    all: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "wikidex=info,warn",
        1 => "wikidex=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;
    let client = Arc::new(HttpClient::new(&config.scraper)?);

    match cli.command {
        Command::Setup(targets) => {
            let pipeline = Pipeline::new(client, config);

            if targets.pokemon || targets.all {
                let _t = utils::Timer::start("Pokédex setup");
                let stats = pipeline.setup_pokedex().await?;
                info!(
                    "Pokédex: {} entries, {} scraped, {} errors",
                    utils::fmt_count(stats.entries),
                    utils::fmt_count(stats.scraped),
                    stats.errors
                );
            }

            if targets.terraria || targets.all {
                let _t = utils::Timer::start("Prefix setup");
                let count = pipeline.setup_prefixes().await?;
                info!("Prefixes: {} written", utils::fmt_count(count));
            }
        }

        Command::Pokemon { name } => {
            let reply = Commands::new(client, &config).pokemon(name.as_slice()).await;
            println!("{reply}");
        }

        Command::Prefix { name } => {
            let reply = Commands::new(client, &config).prefix(name.as_slice()).await;
            println!("{reply}");
        }
    }

    Ok(())
}
