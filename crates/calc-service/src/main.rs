use anyhow::{bail, Context, Result};
use calc_config::ConfigLoader;
use calc_engine::CalculatorService;
use calc_types::{Address, CalculatorConfig, FillContext, FillRequest, U256};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod quote;

#[derive(Parser)]
#[command(name = "calc-service")]
#[command(about = "Execution-amount calculator", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE", default_value = "config/local.toml")]
	config: PathBuf,

	#[arg(long, env = "CALC_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Validate the configuration file
	Validate,
	/// Compute the counter-amount of one fill attempt
	Quote(QuoteArgs),
}

#[derive(Args)]
#[command(group = clap::ArgGroup::new("side").required(true).args(["making", "taking"]))]
struct QuoteArgs {
	/// Order as JSON
	#[arg(long, value_name = "FILE")]
	order: PathBuf,

	/// Caller attempting the fill
	#[arg(long)]
	taker: Address,

	/// Requested maker amount; prints the taking amount
	#[arg(long)]
	making: Option<U256>,

	/// Offered taker amount; prints the making amount
	#[arg(long)]
	taking: Option<U256>,

	/// Remaining maker amount as tracked by the settlement engine
	#[arg(long)]
	remaining: Option<U256>,

	/// Unix seconds to evaluate at; defaults to now
	#[arg(long)]
	timestamp: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	// Initialize tracing
	setup_tracing(&cli.log_level)?;

	let config = load_config(&cli).await?;

	match cli.command {
		Commands::Validate => validate_config(&config),
		Commands::Quote(args) => run_quote(&config, args).await,
	}
}

async fn load_config(cli: &Cli) -> Result<CalculatorConfig> {
	info!("Loading configuration from: {:?}", cli.config);

	ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")
}

fn validate_config(config: &CalculatorConfig) -> Result<()> {
	CalculatorService::from_config(config).context("Failed to build calculator")?;

	info!("Configuration is valid");
	info!("Engine name: {}", config.engine.name);
	match config.engine.max_price_age_secs {
		Some(secs) => info!("Oracle readings older than {}s are rejected", secs),
		None => info!("Oracle staleness check disabled"),
	}
	for (feed, reading) in &config.oracles {
		info!("  Feed: {} ({} decimals)", feed, reading.decimals);
	}

	Ok(())
}

async fn run_quote(config: &CalculatorConfig, args: QuoteArgs) -> Result<()> {
	let engine = CalculatorService::from_config(config).context("Failed to build calculator")?;
	let order = quote::read_order(&args.order).await?;

	let mut request = match (args.making, args.taking) {
		(Some(making), None) => FillRequest::making(args.taker, making),
		(None, Some(taking)) => FillRequest::taking(args.taker, taking),
		_ => bail!("Exactly one of --making or --taking is required"),
	};
	if let Some(remaining) = args.remaining {
		request = request.with_remaining(remaining);
	}

	let timestamp = match args.timestamp {
		Some(timestamp) => timestamp,
		None => SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.context("System clock is before the Unix epoch")?
			.as_secs(),
	};
	let ctx = FillContext::at(timestamp);

	match quote::quote(&engine, &order, &request, &ctx).await {
		Ok(result) => {
			println!("{}", serde_json::to_string_pretty(&result)?);
			Ok(())
		}
		Err(err) => {
			warn!("Fill rejected: {}", err);
			println!(
				"{}",
				serde_json::to_string_pretty(&quote::Rejection::from(&err))?
			);
			Err(err).context("Fill rejected")
		}
	}
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	Ok(())
}
