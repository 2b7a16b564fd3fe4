//! Hybrid ramp strategy.
//!
//! Two linear price ramps joined at a switch time: the first governs fills
//! before `switch_time`, the second from then on. Prices are taker units per
//! maker unit with 18 decimals.

use alloy_sol_types::SolValue;
use calc_types::{CalculatorError, FillContext, FillRequest, RequestedAmount, Result, U256};
use tracing::debug;

use super::linear_decay::interpolate;
use crate::decimals::{mul_div, pow10, PRICE_DECIMALS};

type Words = (U256, U256, U256, U256, U256, U256, U256, U256, U256);

/// One linear price ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRamp {
	pub start_price: U256,
	pub end_price: U256,
	pub start_time: U256,
	pub end_time: U256,
}

impl PriceRamp {
	pub fn price_at(&self, timestamp: u64) -> Result<U256> {
		interpolate(
			self.start_price,
			self.end_price,
			self.start_time,
			self.end_time,
			U256::from(timestamp),
		)
	}
}

/// Parameters of a hybrid ramp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HybridRampParams {
	pub switch_time: U256,
	pub first: PriceRamp,
	pub second: PriceRamp,
}

impl HybridRampParams {
	pub fn decode(data: &[u8]) -> Result<Self> {
		let (
			switch_time,
			first_start_price,
			first_end_price,
			first_start_time,
			first_end_time,
			second_start_price,
			second_end_price,
			second_start_time,
			second_end_time,
		) = Words::abi_decode_params(data, true)
			.map_err(|e| CalculatorError::MalformedExtraData(e.to_string()))?;

		let params = Self {
			switch_time,
			first: PriceRamp {
				start_price: first_start_price,
				end_price: first_end_price,
				start_time: first_start_time,
				end_time: first_end_time,
			},
			second: PriceRamp {
				start_price: second_start_price,
				end_price: second_end_price,
				start_time: second_start_time,
				end_time: second_end_time,
			},
		};

		for (name, ramp) in [("first", &params.first), ("second", &params.second)] {
			if ramp.end_time <= ramp.start_time {
				return Err(CalculatorError::MalformedExtraData(format!(
					"{} ramp window [{}, {}] is empty",
					name, ramp.start_time, ramp.end_time
				)));
			}
		}

		Ok(params)
	}

	pub fn encode(&self) -> Vec<u8> {
		let words: Words = (
			self.switch_time,
			self.first.start_price,
			self.first.end_price,
			self.first.start_time,
			self.first.end_time,
			self.second.start_price,
			self.second.end_price,
			self.second.start_time,
			self.second.end_time,
		);
		words.abi_encode_params()
	}

	/// Rate in force at `timestamp`.
	pub fn price_at(&self, timestamp: u64) -> Result<U256> {
		if U256::from(timestamp) < self.switch_time {
			self.first.price_at(timestamp)
		} else {
			self.second.price_at(timestamp)
		}
	}

	pub fn calculate(&self, request: &FillRequest, ctx: &FillContext) -> Result<U256> {
		let price = self.price_at(ctx.timestamp)?;
		let one = pow10(u32::from(PRICE_DECIMALS))?;
		debug!("Hybrid ramp at {}: price {}", ctx.timestamp, price);

		match request.amount {
			RequestedAmount::Making(making) => mul_div(making, price, one),
			RequestedAmount::Taking(taking) => mul_div(taking, one, price),
		}
	}
}
