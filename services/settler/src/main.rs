use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use banca_settler::config::Config;
use banca_settler::scheduler::{
    now_brasilia, parse_house, run_scrape, run_scrape_and_settle, run_settle,
};
use banca_settler::sources::http_client;
use banca_settler::store::SupabaseStore;

/// Results scraper and settlement jobs. One subcommand per scheduled job;
/// the external scheduler invokes the binary and walks away.
#[derive(Parser)]
#[command(name = "banca-settler", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every incomplete house, then settle today and yesterday.
    ScrapeSettle,
    /// Settle pending bets for one date (default: today in Brasília).
    Settle {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Fetch and store drawings without settling anything.
    Scrape {
        /// House name, e.g. "bahia" or "rio/federal". All houses when absent.
        #[arg(long)]
        house: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("incomplete environment")?;
    let store = SupabaseStore::new(http_client(), &config);
    let now = now_brasilia();

    match cli.command {
        Command::ScrapeSettle => {
            run_scrape_and_settle(&store, &config, now).await?;
        }
        Command::Settle { date } => {
            let date = date.unwrap_or_else(|| now.date_naive());
            run_settle(&store, &config, date, now).await?;
        }
        Command::Scrape { house, date } => {
            let house = match house {
                Some(raw) => match parse_house(&raw) {
                    Some(house) => Some(house),
                    None => bail!("unknown house: {raw}"),
                },
                None => None,
            };
            let date = date.unwrap_or_else(|| now.date_naive());
            run_scrape(&store, &config, house, date).await?;
        }
    }
    Ok(())
}
