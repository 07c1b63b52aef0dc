//! Command line interface for the bonding-curve trading bot.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use pump_trader_domain::prelude::{
    CurveEngine, CurveParams, ExitStrategy, TokenHandle, LAMPORTS_PER_SOL,
};
use pump_trader_execution::prelude::{
    token_feed, Collaborators, MonitoringConfig, TradeOrchestrator, TradingConfig,
};
use pump_trader_protocols::pump::addresses::{parse_pubkey, ProgramAddresses};
use pump_trader_protocols::pump::executor::PumpExecutor;
use pump_trader_protocols::rpc::RpcProvider;
use pump_trader_protocols::wallet::Wallet;
use pump_trader_protocols::BalanceSource;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pump-trader")]
#[command(about = "Bonding-curve token launch trading bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trade a single token through the full buy/monitor/sell pipeline
    Trade {
        /// Token mint address
        #[arg(long)]
        mint: String,

        /// Token symbol, for logging only
        #[arg(long, default_value = "???")]
        symbol: String,

        /// Amount of SOL to spend on the buy
        #[arg(long, default_value_t = 0.01)]
        buy_amount_sol: f64,

        /// Take-profit threshold as a fraction of entry price
        #[arg(long, default_value_t = 0.5)]
        take_profit: f64,

        /// Stop-loss threshold as a fraction of entry price
        #[arg(long, default_value_t = 0.2)]
        stop_loss: f64,

        /// Hold for a fixed number of seconds instead of using
        /// take-profit/stop-loss
        #[arg(long)]
        max_hold_secs: Option<u64>,

        /// Seconds between price polls
        #[arg(long, default_value_t = 1)]
        poll_interval_secs: u64,

        /// Total monitoring budget in seconds
        #[arg(long, default_value_t = 300)]
        time_limit_secs: u64,

        /// Transaction submission attempts before giving up
        #[arg(long, default_value_t = 3)]
        max_submit_attempts: u32,

        /// Seconds to wait for each transaction confirmation
        #[arg(long, default_value_t = 30)]
        confirm_timeout_secs: u64,

        /// Slippage tolerance as a fraction of the quoted amount
        #[arg(long, default_value_t = 0.05)]
        slippage: f64,
    },
    /// Print the trading wallet's balance
    Balance,
    /// Check RPC endpoint health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let rpc_url = env::var("RPC_URL").context("RPC_URL must be set in .env or environment")?;
    let provider = Arc::new(RpcProvider::new(rpc_url));

    match cli.command {
        Commands::Health => {
            provider.health().await?;
            println!("RPC endpoint is healthy");
        }
        Commands::Balance => {
            let executor = build_executor(provider, 0.0, None)?;
            let balance = executor.wallet_balance().await?;
            println!(
                "Wallet balance: {} lamports ({:.4} SOL)",
                balance,
                balance as f64 / LAMPORTS_PER_SOL as f64
            );
        }
        Commands::Trade {
            mint,
            symbol,
            buy_amount_sol,
            take_profit,
            stop_loss,
            max_hold_secs,
            poll_interval_secs,
            time_limit_secs,
            max_submit_attempts,
            confirm_timeout_secs,
            slippage,
        } => {
            let executor = build_executor(
                provider,
                slippage,
                Some(Duration::from_secs(confirm_timeout_secs)),
            )?;
            let token = resolve_token(&mint, &symbol)?;

            let exit_strategy = match max_hold_secs {
                Some(secs) => ExitStrategy::TimeBased { max_hold_ms: secs * 1_000 },
                None => ExitStrategy::TakeProfitStopLoss {
                    take_profit_pct: take_profit,
                    stop_loss_pct: stop_loss,
                },
            };

            let config = TradingConfig {
                buy_amount_base: (buy_amount_sol * LAMPORTS_PER_SOL as f64) as u64,
                exit_strategy,
                monitoring: MonitoringConfig {
                    poll_interval: Duration::from_secs(poll_interval_secs),
                    time_limit: Duration::from_secs(time_limit_secs),
                },
                max_submit_attempts,
                ..TradingConfig::default()
            };

            let cancel = CancellationToken::new();
            let orchestrator = Arc::new(TradeOrchestrator::new(
                config,
                CurveEngine::new(CurveParams::default()),
                Collaborators {
                    source: Arc::clone(&executor) as _,
                    trader: Arc::clone(&executor) as _,
                    reclaimer: Arc::clone(&executor) as _,
                    balance: Arc::clone(&executor) as _,
                },
                cancel.clone(),
            )?);

            let shutdown = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Shutdown requested");
                    shutdown.cancel();
                }
            });

            let (sender, receiver) = token_feed(8);
            if !sender.offer(token) {
                anyhow::bail!("discovery feed rejected the token");
            }
            drop(sender);

            orchestrator.run(receiver).await?;
        }
    }

    Ok(())
}

fn build_executor(
    provider: Arc<RpcProvider>,
    slippage: f64,
    confirm_timeout: Option<Duration>,
) -> Result<Arc<PumpExecutor>> {
    let secret = env::var("WALLET_PRIVATE_KEY")
        .context("WALLET_PRIVATE_KEY must be set in .env or environment")?;
    let wallet = Arc::new(Wallet::from_base58(&secret)?);
    info!(pubkey = %wallet.pubkey(), "Wallet loaded");

    Ok(Arc::new(PumpExecutor::new(
        provider,
        wallet,
        ProgramAddresses::mainnet(),
        slippage,
        confirm_timeout,
    )))
}

/// Builds a token handle from a mint, deriving the curve PDAs.
fn resolve_token(mint: &str, symbol: &str) -> Result<TokenHandle> {
    let addresses = ProgramAddresses::mainnet();
    let mint_key = parse_pubkey(mint)?;
    let bonding_curve = addresses.bonding_curve(&mint_key);
    let associated_bonding_curve = addresses.associated_token_account(&bonding_curve, &mint_key);

    Ok(TokenHandle {
        mint: mint.to_owned(),
        name: symbol.to_owned(),
        symbol: symbol.to_owned(),
        creator: String::new(),
        bonding_curve: bonding_curve.to_string(),
        associated_bonding_curve: associated_bonding_curve.to_string(),
    })
}
