//! One-shot quotes for the `quote` command.

use anyhow::{Context, Result};
use calc_engine::CalculatorService;
use calc_types::{
	CalculatorError, FillContext, FillRequest, Order, RequestedAmount, RetryHint, U256,
};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Both sides of an accepted fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
	pub strategy: String,
	pub timestamp: u64,
	pub making_amount: U256,
	pub taking_amount: U256,
}

/// Why a fill was refused, with the caller's retry options.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
	pub error: String,
	pub retry: &'static str,
}

impl From<&CalculatorError> for Rejection {
	fn from(err: &CalculatorError) -> Self {
		let retry = match err.retry_hint() {
			RetryHint::Never => "never",
			RetryHint::AfterAxisChange => "after-axis-change",
			RetryHint::WithSmallerAmount => "with-smaller-amount",
		};
		Self {
			error: err.to_string(),
			retry,
		}
	}
}

/// Reads an order from a JSON file.
pub async fn read_order(path: &Path) -> Result<Order> {
	let content = tokio::fs::read_to_string(path)
		.await
		.with_context(|| format!("Failed to read order file {:?}", path))?;
	serde_json::from_str(&content).with_context(|| format!("Invalid order in {:?}", path))
}

/// Runs `request` against `order` and pairs the result with the pinned side.
pub async fn quote(
	engine: &CalculatorService,
	order: &Order,
	request: &FillRequest,
	ctx: &FillContext,
) -> std::result::Result<Quote, CalculatorError> {
	let getter = order.amount_getter()?;
	let strategy = engine.registry().resolve(&getter.strategy)?.to_string();
	let counter = engine.calculate(order, request, ctx).await?;

	let (making_amount, taking_amount) = match request.amount {
		RequestedAmount::Making(making) => (making, counter),
		RequestedAmount::Taking(taking) => (counter, taking),
	};

	info!(
		"Quoted {} -> {} via {} at {}",
		making_amount, taking_amount, strategy, ctx.timestamp
	);

	Ok(Quote {
		strategy,
		timestamp: ctx.timestamp,
		making_amount,
		taking_amount,
	})
}
