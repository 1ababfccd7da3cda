use core_runtime::logging::{init_logging, LoggingConfig};
use token_relay::RelayConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default())?;

    token_relay::serve(RelayConfig::from_env()).await
}
