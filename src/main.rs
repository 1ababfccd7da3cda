use anyhow::Context;
use clap::Parser;
use core_runtime::config::BrokerConfig;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_service::{bootstrap_desktop, bootstrap_desktop_at};
use tradedesk::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(
        LoggingConfig::default()
            .with_format(cli.log_format)
            .with_level(cli.log_level),
    )?;

    let broker = BrokerConfig::from_env()
        .context("Broker settings missing: set FYERS_APP_ID and FYERS_APP_SECRET")?;

    let desk = match cli.db {
        Some(path) => bootstrap_desktop_at(broker, path).await?,
        None => bootstrap_desktop(broker).await?,
    };
    desk.start().await;

    let mut stdout = std::io::stdout();
    cli::run(cli.command, &desk, &mut stdout).await
}
