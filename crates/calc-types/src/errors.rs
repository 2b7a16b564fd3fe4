//! Error taxonomy shared by the phase selector and every strategy.
//!
//! All errors abort the fill attempt as a whole. Nothing in the engine retries
//! on its own; [`CalculatorError::retry_hint`] tells the caller what, if
//! anything, could make a later attempt succeed.

use alloy_primitives::{Address, U256};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CalculatorError>;

/// Errors that can occur while calculating an execution amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculatorError {
	/// The axis value falls outside every configured window.
	#[error("No active phase for axis value {axis}")]
	NoActivePhase { axis: U256 },

	/// The chunked-unlock schedule has not released enough of the order yet.
	#[error("Requested amount {requested} exceeds unlocked amount {available}")]
	RequestedExceedsUnlocked { requested: U256, available: U256 },

	/// The caller is not on the strategy's allow-list.
	#[error("Taker {0} is not allowed to fill this order")]
	NotAllowedTaker(Address),

	/// The upstream price feed returned something unusable.
	#[error("Oracle read invalid: {0}")]
	OracleReadInvalid(String),

	/// A strategy parameter block could not be decoded.
	#[error("Malformed extra data: {0}")]
	MalformedExtraData(String),

	/// The phase list is undecodable, unordered or overlapping.
	#[error("Malformed phase list: {0}")]
	MalformedPhaseList(String),

	/// No strategy is registered under the given reference.
	#[error("Unknown strategy reference: {0}")]
	UnknownStrategy(Address),

	/// Fixed-point arithmetic overflowed or divided by zero.
	#[error("Arithmetic error: {0}")]
	Arithmetic(String),
}

/// What a caller may do after a failed calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryHint {
	/// The same request will keep failing.
	Never,
	/// The request may succeed once the reference axis has moved.
	AfterAxisChange,
	/// The request may succeed with a smaller amount, or later.
	WithSmallerAmount,
}

impl CalculatorError {
	pub fn retry_hint(&self) -> RetryHint {
		match self {
			Self::NoActivePhase { .. } => RetryHint::AfterAxisChange,
			Self::RequestedExceedsUnlocked { .. } => RetryHint::WithSmallerAmount,
			Self::NotAllowedTaker(_)
			| Self::OracleReadInvalid(_)
			| Self::MalformedExtraData(_)
			| Self::MalformedPhaseList(_)
			| Self::UnknownStrategy(_)
			| Self::Arithmetic(_) => RetryHint::Never,
		}
	}
}
