//! Order and fill request types.
//!
//! An [`Order`] is created once by its maker and never mutated. Each fill
//! attempt presents a [`FillRequest`] together with a [`FillContext`] that
//! carries the host clock, so the engine never reads ambient state.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::errors::{CalculatorError, Result};

/// Length of a strategy reference at the head of an amount getter blob.
pub const STRATEGY_REF_LEN: usize = 20;

/// Immutable description of a trade intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Owner of the order.
	pub maker: Address,
	/// Asset the maker gives.
	pub maker_asset: Address,
	/// Asset the maker receives.
	pub taker_asset: Address,
	/// Total give-amount.
	pub making_amount: U256,
	/// Total receive-amount. Zero means the strategy derives it.
	pub taking_amount: U256,
	/// Amount getter blob: strategy reference followed by its parameters.
	pub extra_data: Bytes,
}

impl Order {
	/// Splits `extra_data` into its strategy reference and parameter block.
	pub fn amount_getter(&self) -> Result<AmountGetter> {
		AmountGetter::decode(&self.extra_data)
	}
}

/// A strategy reference paired with the parameter block it should decode.
///
/// Wire form is `solidityPacked(address, bytes)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountGetter {
	pub strategy: Address,
	pub data: Bytes,
}

impl AmountGetter {
	pub fn new(strategy: Address, data: impl Into<Bytes>) -> Self {
		Self {
			strategy,
			data: data.into(),
		}
	}

	pub fn decode(raw: &[u8]) -> Result<Self> {
		if raw.len() < STRATEGY_REF_LEN {
			return Err(CalculatorError::MalformedExtraData(format!(
				"amount getter is {} bytes, need at least {}",
				raw.len(),
				STRATEGY_REF_LEN
			)));
		}

		let (reference, data) = raw.split_at(STRATEGY_REF_LEN);
		Ok(Self {
			strategy: Address::from_slice(reference),
			data: Bytes::copy_from_slice(data),
		})
	}

	pub fn encode(&self) -> Bytes {
		let mut out = Vec::with_capacity(STRATEGY_REF_LEN + self.data.len());
		out.extend_from_slice(self.strategy.as_slice());
		out.extend_from_slice(&self.data);
		out.into()
	}
}

/// Which side of the trade the caller pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedAmount {
	/// Caller asks for this much of the maker asset; the engine returns the taking amount.
	Making(U256),
	/// Caller offers this much of the taker asset; the engine returns the making amount.
	Taking(U256),
}

/// Per-call fill request. Never persisted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillRequest {
	/// Identity of the caller attempting the fill.
	pub taker: Address,
	/// The pinned amount.
	pub amount: RequestedAmount,
	/// Remaining give-amount as tracked by the settlement engine.
	///
	/// `None` means nothing has been filled yet.
	#[serde(default)]
	pub remaining_making_amount: Option<U256>,
}

impl FillRequest {
	pub fn making(taker: Address, amount: U256) -> Self {
		Self {
			taker,
			amount: RequestedAmount::Making(amount),
			remaining_making_amount: None,
		}
	}

	pub fn taking(taker: Address, amount: U256) -> Self {
		Self {
			taker,
			amount: RequestedAmount::Taking(amount),
			remaining_making_amount: None,
		}
	}

	pub fn with_remaining(mut self, remaining: U256) -> Self {
		self.remaining_making_amount = Some(remaining);
		self
	}

	/// Give-amount already filled before this attempt.
	pub fn filled_making_amount(&self, order: &Order) -> U256 {
		match self.remaining_making_amount {
			Some(remaining) => order.making_amount.saturating_sub(remaining),
			None => U256::ZERO,
		}
	}
}

/// Host state injected into every calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillContext {
	/// Current time in Unix seconds.
	pub timestamp: u64,
}

impl FillContext {
	pub fn at(timestamp: u64) -> Self {
		Self { timestamp }
	}
}
