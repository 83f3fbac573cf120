//! Ladderbot CLI — run the decision loop, a single cycle, a dry run, or
//! inspect the resolved policy.
//!
//! Commands:
//! - `run` — poll forever, one decision cycle per interval
//! - `once` — a single live cycle
//! - `analyze` — full entry analysis as JSON, then one cycle against a dry-run gateway
//! - `policy` — print the resolved policy TOML and its fingerprint

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ladderbot_core::data::{BrokerGateway, CircuitBreaker, MetaApiClient, MetaApiConfig};
use ladderbot_core::engine::{gather_snapshot, DecisionEngine};
use ladderbot_runner::config::{load_env_file, policy_from_lookup};
use ladderbot_runner::{
    AnalysisReport, CycleRunner, CycleStats, DryRunGateway, OrderExecutor, Settings,
};

#[derive(Parser)]
#[command(
    name = "ladderbot",
    about = "Ladderbot — multi-timeframe trend entries with a martingale ladder"
)]
struct Cli {
    /// Env file to load instead of `.env` (also settable via DOTENV).
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Policy TOML file (overrides POLICY_FILE).
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll forever: one decision cycle every POLL_INTERVAL_SECS.
    Run,
    /// Run a single live cycle and exit.
    Once,
    /// Print the entry analysis as JSON and dry-run one cycle.
    Analyze,
    /// Print the resolved policy and its fingerprint.
    Policy,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => run_loop(&cli),
        Commands::Once => run_once(&cli),
        Commands::Analyze => run_analyze(&cli),
        Commands::Policy => run_policy(&cli),
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    Settings::from_env(cli.env_file.as_deref(), cli.policy.as_deref())
        .context("failed to load settings")
}

fn rest_client(settings: &Settings) -> Result<Arc<MetaApiClient>> {
    let config = MetaApiConfig::new(
        &settings.api_key,
        &settings.account_id,
        &settings.base_url,
        &settings.market_base_url,
    );
    let client = MetaApiClient::new(config, Arc::new(CircuitBreaker::default_broker()))
        .context("failed to build REST client")?;
    Ok(Arc::new(client))
}

/// Live runner, or one whose orders go to `gateway` instead of the broker.
fn build_runner(
    settings: &Settings,
    client: Arc<MetaApiClient>,
    gateway: Option<Arc<dyn BrokerGateway>>,
) -> CycleRunner {
    let instrument = settings.instrument();
    let gateway: Arc<dyn BrokerGateway> = match gateway {
        Some(gateway) => gateway,
        None => client.clone() as Arc<dyn BrokerGateway>,
    };
    CycleRunner::new(
        DecisionEngine::from_policy(&settings.policy, instrument.clone()),
        client.clone(),
        client,
        OrderExecutor::new(gateway, instrument, &settings.order_comment),
        &settings.symbol,
        settings.poll_interval,
    )
}

fn run_loop(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let runner = build_runner(&settings, rest_client(&settings)?, None);
    runner.run_forever();
    Ok(())
}

fn run_once(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let runner = build_runner(&settings, rest_client(&settings)?, None);
    let outcome = runner.supervised_cycle(CycleStats::default());
    outcome.stats.log_summary();
    match outcome.result {
        Ok(report) => {
            info!(?report, "cycle complete");
            Ok(())
        }
        Err(e) => bail!("cycle failed: {e}"),
    }
}

fn run_analyze(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let client = rest_client(&settings)?;
    let dry_run = Arc::new(DryRunGateway::new());
    let gateway: Arc<dyn BrokerGateway> = dry_run.clone();
    let runner = build_runner(&settings, client.clone(), Some(gateway));

    let engine = runner.engine();
    let snapshot = gather_snapshot(
        client.as_ref(),
        &settings.symbol,
        engine.strategy().wants_higher_timeframe(),
        Utc::now().date_naive(),
    )
    .context("market data unavailable")?;
    let (analysis, decision) = engine.evaluate_entry(&snapshot);
    let report = AnalysisReport::new(engine.policy_hash(), &settings.symbol, &analysis, &decision);
    println!("{}", serde_json::to_string_pretty(&report)?);

    let outcome = runner.supervised_cycle(CycleStats::default());
    if let Err(e) = &outcome.result {
        bail!("dry-run cycle failed: {e}");
    }
    println!("{}", serde_json::to_string_pretty(&dry_run.orders())?);
    for (position_id, take_profit) in dry_run.modifications() {
        println!("modify {position_id} take_profit={take_profit}");
    }
    Ok(())
}

fn run_policy(cli: &Cli) -> Result<()> {
    load_env_file(cli.env_file.as_deref())?;
    let policy = policy_from_lookup(&|key: &str| std::env::var(key).ok(), cli.policy.as_deref())
        .context("failed to resolve policy")?;
    println!("# fingerprint: {}", policy.fingerprint());
    print!("{}", policy.to_toml_string()?);
    Ok(())
}
