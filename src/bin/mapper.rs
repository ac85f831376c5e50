use anyhow::Result;
use clap::Parser;
use hotelmap::{config::Config, pipeline};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
/// Scrapes hotel property pages and matches them against the hotels in a spreadsheet.
///
/// Results are upserted into a SQLite table and written to a JSON file. Every option falls back to
/// the environment variable named in its help, and a .env file in the current folder is loaded
/// first.
struct Args {
    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| ["mapper=info", "hotelmap=debug"].join(",").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Args { config } = Args::parse();
    let (summary, _) = pipeline::run(&config).await?;
    info!(
        "matched {} of {} hotels, results in {}",
        summary.matched,
        summary.candidates,
        summary.output_path.display()
    );
    Ok(())
}
