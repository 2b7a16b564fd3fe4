//! Whitelist fixed-price strategy.
//!
//! A prenegotiated rate that only listed takers may fill at.

use alloy_sol_types::{sol_data, SolType};
use calc_types::{Address, CalculatorError, FillRequest, RequestedAmount, Result, U256};
use tracing::warn;

use crate::decimals::{convert_at_inverse_price, convert_at_price, PRICE_DECIMALS};

type WhitelistLayout = (
	sol_data::Uint<256>,
	sol_data::Array<sol_data::Address>,
	sol_data::Uint<8>,
	sol_data::Uint<8>,
);

/// Parameters of a fixed-price allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistParams {
	/// Taker units per maker unit, with 18 decimals.
	pub rate: U256,
	pub allowed_takers: Vec<Address>,
	pub making_decimals: u8,
	pub taking_decimals: u8,
}

impl WhitelistParams {
	pub fn decode(data: &[u8]) -> Result<Self> {
		let (rate, allowed_takers, making_decimals, taking_decimals) =
			WhitelistLayout::abi_decode_params(data, true)
				.map_err(|e| CalculatorError::MalformedExtraData(e.to_string()))?;

		if rate.is_zero() {
			return Err(CalculatorError::MalformedExtraData(
				"fixed rate is zero".to_string(),
			));
		}

		Ok(Self {
			rate,
			allowed_takers,
			making_decimals,
			taking_decimals,
		})
	}

	pub fn encode(&self) -> Vec<u8> {
		WhitelistLayout::abi_encode_params(&(
			self.rate,
			self.allowed_takers.clone(),
			self.making_decimals,
			self.taking_decimals,
		))
	}

	pub fn is_allowed(&self, taker: &Address) -> bool {
		self.allowed_takers.contains(taker)
	}

	pub fn calculate(&self, request: &FillRequest) -> Result<U256> {
		if !self.is_allowed(&request.taker) {
			warn!("Taker {} is not on the allow-list", request.taker);
			return Err(CalculatorError::NotAllowedTaker(request.taker));
		}

		match request.amount {
			RequestedAmount::Making(making) => convert_at_price(
				making,
				self.rate,
				PRICE_DECIMALS,
				self.making_decimals,
				self.taking_decimals,
			),
			RequestedAmount::Taking(taking) => convert_at_inverse_price(
				taking,
				self.rate,
				PRICE_DECIMALS,
				self.taking_decimals,
				self.making_decimals,
			),
		}
	}
}
