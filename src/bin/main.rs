use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use toolshed::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "toolshed=debug" } else { "toolshed=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = toolshed::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
