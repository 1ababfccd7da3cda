//! `tradedesk` command-line front end.
//!
//! The login is a paste-back flow: `login` opens the broker page in the
//! system browser, and the redirect URL the browser lands on is handed back
//! with `callback`. The pending nonce is persisted between the two calls.

use crate::TradeDesk;
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use core_market::{MarketData, Quote};
use core_runtime::events::EventSeverity;
use core_runtime::logging::{LogFormat, LogLevel};
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tradedesk")]
#[command(version)]
#[command(about = "Fyers broker session and market data from the terminal", long_about = None)]
pub struct Cli {
    /// Log level for tradedesk crates (logs go to stderr)
    #[arg(long, env = "TRADEDESK_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: LogLevel,

    /// Log format: pretty, json or compact
    #[arg(long, env = "TRADEDESK_LOG_FORMAT", default_value = "compact", global = true)]
    pub log_format: LogFormat,

    /// Settings database (default: <data dir>/tradedesk/local_storage.db)
    #[arg(long, env = "TRADEDESK_DB", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Open the broker login page in the browser
    Login,
    /// Complete a login with the URL the broker redirected to
    Callback {
        /// Full redirect URL, including `code` and `state`
        url: String,
    },
    /// Show the session state
    Status,
    /// Market overview, or quotes for the given symbols
    Quotes {
        /// Symbols such as NSE:SBIN-EQ
        symbols: Vec<String>,
    },
    /// Open positions as JSON
    Positions,
    /// Clear the stored session
    Logout,
}

/// Execute one command against an initialized desk.
///
/// Warnings and errors the core published while the command ran are echoed
/// to `out`, also when the command itself failed.
pub async fn run<W: Write>(command: Command, desk: &TradeDesk, out: &mut W) -> anyhow::Result<()> {
    let mut events = desk
        .subscribe()
        .filter(|event| event.severity() >= EventSeverity::Warning);

    let result = execute(command, desk, out).await;

    while let Some(Ok(event)) = events.try_recv() {
        writeln!(out, "! {}", event.description())?;
    }
    result
}

async fn execute<W: Write>(command: Command, desk: &TradeDesk, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::Login => {
            let request = desk.login().await?;
            writeln!(out, "Opened the broker login page:")?;
            writeln!(out, "  {}", request.redirect_target)?;
            writeln!(
                out,
                "After signing in, run: tradedesk callback '<redirect URL>'"
            )?;
        }
        Command::Callback { url } => {
            let handled = desk.handle_redirect(&url).await?;
            if !handled {
                bail!(
                    "not a broker callback URL (expected path {})",
                    desk.session().broker_config().callback_path()
                );
            }
            writeln!(out, "Connected to Fyers")?;
        }
        Command::Status => {
            let status = desk.status().await;
            writeln!(out, "State:     {}", status.state)?;
            writeln!(out, "Connected: {}", if status.is_connected { "yes" } else { "no" })?;

            let store = desk.session().credential_store();
            if let Some(session) = store.load().await? {
                if let Some(expires_at) = session.expires_at() {
                    writeln!(out, "Expires:   {}", expires_at.to_rfc3339())?;
                }
                if let Some(left) = session.time_until_expiry(store.now_ms()) {
                    writeln!(out, "Remaining: {} min", left.num_minutes())?;
                }
            }
            if let Some(error) = status.error {
                writeln!(out, "Error:     {}", error)?;
            }
        }
        Command::Quotes { symbols } if symbols.is_empty() => {
            let data = desk.fetch_market_data().await?;
            render_overview(&data, out)?;
        }
        Command::Quotes { symbols } => {
            let symbols: Vec<&str> = symbols.iter().map(String::as_str).collect();
            let quotes = desk.quotes(&symbols).await?;
            render_quotes(&quotes, out)?;
        }
        Command::Positions => {
            let positions = desk.positions().await?;
            let pretty =
                serde_json::to_string_pretty(&positions).context("Failed to render positions")?;
            writeln!(out, "{}", pretty)?;
        }
        Command::Logout => {
            desk.logout().await?;
            writeln!(out, "Signed out")?;
        }
    }

    Ok(())
}

fn render_overview<W: Write>(data: &MarketData, out: &mut W) -> std::io::Result<()> {
    for (name, snapshot) in [("NIFTY 50", &data.nifty), ("BANK NIFTY", &data.bank_nifty)] {
        match snapshot {
            Some(s) => writeln!(
                out,
                "{:<12} {:>12.2} {:>+10.2} ({:+.2}%)",
                name, s.price, s.change, s.percent_change
            )?,
            None => writeln!(out, "{:<12} {:>12}", name, "n/a")?,
        }
    }

    writeln!(out)?;
    writeln!(out, "Top gainers")?;
    for mover in &data.top_gainers {
        writeln!(out, "  {:<12} {:+.2}%", mover.symbol, mover.change)?;
    }
    writeln!(out, "Top losers")?;
    for mover in &data.top_losers {
        writeln!(out, "  {:<12} {:+.2}%", mover.symbol, mover.change)?;
    }
    Ok(())
}

fn render_quotes<W: Write>(quotes: &[Quote], out: &mut W) -> std::io::Result<()> {
    writeln!(
        out,
        "{:<24} {:>12} {:>10} {:>8}",
        "SYMBOL", "LTP", "CHANGE", "%"
    )?;
    for q in quotes {
        writeln!(
            out,
            "{:<24} {:>12.2} {:>+10.2} {:>+8.2}",
            q.symbol, q.ltp, q.change, q.change_percentage
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        HttpClient, HttpRequest, HttpResponse, ManualClock, MemorySettingsStore, Navigator,
    };
    use core_runtime::config::{BrokerConfig, CoreConfig};
    use std::sync::Arc;

    struct FakeBroker;

    #[async_trait]
    impl HttpClient for FakeBroker {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            let body = if request.url.ends_with("/token") {
                r#"{"access_token":"T1","refresh_token":"R1","expires_in":3600}"#
            } else {
                r#"{"d":[{"symbol":"NSE:NIFTY50-INDEX","ltp":22150.4,"change":85.2,"change_percentage":0.39}]}"#
            };
            Ok(HttpResponse::new(200, body))
        }
    }

    struct StayPut;

    impl Navigator for StayPut {
        fn navigate(&self, _target: &str) -> BridgeResult<()> {
            Ok(())
        }
    }

    async fn desk() -> TradeDesk {
        desk_at(Arc::new(ManualClock::at_millis(1_000_000))).await
    }

    async fn desk_at(clock: Arc<ManualClock>) -> TradeDesk {
        let config = CoreConfig::builder()
            .broker(BrokerConfig::new("APP-100", "secret"))
            .settings_store(Arc::new(MemorySettingsStore::new()))
            .http_client(Arc::new(FakeBroker))
            .navigator(Arc::new(StayPut))
            .clock(clock)
            .build()
            .unwrap();
        TradeDesk::new(config).await
    }

    async fn output(command: Command, desk: &TradeDesk) -> anyhow::Result<String> {
        let mut out = Vec::new();
        run(command, desk, &mut out).await?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["tradedesk", "quotes", "NSE:SBIN-EQ", "NSE:TCS-EQ"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Quotes {
                symbols: vec!["NSE:SBIN-EQ".to_string(), "NSE:TCS-EQ".to_string()]
            }
        );
        assert_eq!(cli.log_level, LogLevel::Warn);

        let cli = Cli::try_parse_from(["tradedesk", "--log-level", "debug", "status"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        assert_eq!(cli.command, Command::Status);

        assert!(Cli::try_parse_from(["tradedesk", "callback"]).is_err());
    }

    #[tokio::test]
    async fn test_login_then_callback() {
        let desk = desk().await;

        let printed = output(Command::Login, &desk).await.unwrap();
        assert!(printed.contains("generate-authcode"));

        let nonce = desk
            .session()
            .credential_store()
            .pending_nonce()
            .await
            .unwrap()
            .unwrap();
        let url = format!("http://localhost:5173/auth-callback?code=C1&state={}", nonce);
        let printed = output(Command::Callback { url }, &desk).await.unwrap();
        assert_eq!(printed.trim(), "Connected to Fyers");

        let printed = output(Command::Status, &desk).await.unwrap();
        assert!(printed.contains("Connected"));
        assert!(printed.contains("Remaining: 60 min"));

        let printed = output(Command::Quotes { symbols: vec![] }, &desk).await.unwrap();
        assert!(printed.contains("NIFTY 50"));
        assert!(printed.contains("RELIANCE"));
    }

    #[tokio::test]
    async fn test_expired_session_is_reported() {
        let clock = Arc::new(ManualClock::at_millis(1_000_000));
        let desk = desk_at(clock.clone()).await;

        output(Command::Login, &desk).await.unwrap();
        let nonce = desk
            .session()
            .credential_store()
            .pending_nonce()
            .await
            .unwrap()
            .unwrap();
        let url = format!("http://localhost:5173/auth-callback?code=C1&state={}", nonce);
        output(Command::Callback { url }, &desk).await.unwrap();

        clock.set_millis(4_600_001);
        let mut out = Vec::new();
        let result = run(Command::Positions, &desk, &mut out).await;

        assert!(result.is_err());
        let printed = String::from_utf8_lossy(&out);
        assert!(printed.contains("! Broker session expired"));
    }

    #[tokio::test]
    async fn test_callback_rejects_other_urls() {
        let desk = desk().await;
        let result = output(
            Command::Callback {
                url: "http://localhost:5173/dashboard".to_string(),
            },
            &desk,
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_quotes_require_login() {
        let desk = desk().await;
        let result = output(
            Command::Quotes {
                symbols: vec!["NSE:SBIN-EQ".to_string()],
            },
            &desk,
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Not authenticated"));
    }
}
