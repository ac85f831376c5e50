use std::net::SocketAddr;

use anyhow::{anyhow, Context};
use clap::Parser;
use hotelmap::{config::Config, routes};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
/// Serves GET /run_scrape_and_map, which runs one scrape-and-match batch per request.
struct Args {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    bind_addr: SocketAddr,

    #[command(flatten)]
    config: Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                [
                    "backend=debug",    // code in this file
                    "hotelmap=debug",   // code in this crate (but not this file)
                    "tower_http=debug", // http request/response pairs
                ]
                .join(",")
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Args { bind_addr, config } = Args::parse();
    config.validate()?;

    let app = routes::make_app(config);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| anyhow!("failed to bind listener to {}", bind_addr))?;
    info!("listening on http://{}", &bind_addr);

    axum::serve(listener, app)
        .await
        .context("error while serving app")?;

    Ok(())
}
