//! Reference axis provider.
//!
//! Yields the scalar a phase list is laid out on: the injected timestamp, or
//! the oracle price rescaled to [`PRICE_DECIMALS`].

use calc_oracle::{OracleService, PriceReading};
use calc_types::{Address, AxisMode, CalculatorError, FillContext, PhaseList, Result, U256};
use tracing::debug;

use crate::decimals::{normalize, PRICE_DECIMALS};

/// Reads `feed`, mapping every oracle-side failure to `OracleReadInvalid`.
pub async fn read_price(
	oracle: &OracleService,
	feed: &Address,
	ctx: &FillContext,
) -> Result<PriceReading> {
	oracle
		.read_price(feed, ctx.timestamp)
		.await
		.map_err(|e| CalculatorError::OracleReadInvalid(e.to_string()))
}

/// Current axis value for `mode`.
pub async fn axis_value(
	oracle: &OracleService,
	mode: AxisMode,
	feed: &Address,
	ctx: &FillContext,
) -> Result<U256> {
	let value = match mode {
		AxisMode::ElapsedTime => U256::from(ctx.timestamp),
		AxisMode::OraclePrice => {
			let reading = read_price(oracle, feed, ctx).await?;
			normalize(reading.price, reading.decimals, PRICE_DECIMALS)?
		}
	};

	debug!("Axis value for {:?}: {}", mode, value);
	Ok(value)
}

/// Axis value for the phase list's own mode and oracle.
pub async fn phase_list_axis(
	oracle: &OracleService,
	list: &PhaseList,
	ctx: &FillContext,
) -> Result<U256> {
	axis_value(oracle, list.mode, &list.oracle, ctx).await
}
