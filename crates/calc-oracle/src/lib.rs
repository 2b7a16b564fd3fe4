//! Price feed read contract for the calculation engine.
//!
//! The engine never implements a price feed. It consumes one through
//! [`PriceOracleInterface`], which mirrors a `latestPrice()` call, and wraps it
//! in an [`OracleService`] that rejects readings the engine must not act on:
//! non-positive answers and, when configured, stale ones.

use async_trait::async_trait;
use calc_types::{Address, I256, U256};
use thiserror::Error;
use tracing::{debug, warn};

/// Re-export implementations
pub mod implementations {
	pub mod fixed;
}

/// Errors that can occur while reading a price feed.
#[derive(Debug, Error)]
pub enum OracleError {
	/// No feed is known under this address.
	#[error("Unknown price feed: {0}")]
	UnknownFeed(Address),
	/// The feed answered zero or a negative price.
	#[error("Non-positive price {answer} from feed {feed}")]
	NonPositivePrice { feed: Address, answer: I256 },
	/// The reading is older than the configured maximum age.
	#[error("Stale price from feed {feed}: updated at {updated_at}, now {now}, max age {max_age}s")]
	Stale {
		feed: Address,
		updated_at: u64,
		now: u64,
		max_age: u64,
	},
	/// The feed configuration could not be turned into a provider.
	#[error("Invalid feed configuration: {0}")]
	InvalidConfig(String),
	/// The underlying provider failed.
	#[error("Provider error: {0}")]
	Provider(String),
}

/// Raw answer of a `latestPrice()` read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundData {
	pub answer: I256,
	pub decimals: u8,
	pub updated_at: u64,
}

/// A reading that passed validation. `price` is strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceReading {
	pub price: U256,
	pub decimals: u8,
	pub updated_at: u64,
}

/// Trait implemented by every price feed the engine can read.
#[async_trait]
pub trait PriceOracleInterface: Send + Sync {
	/// Returns the latest round of the feed at `feed`.
	async fn latest_price(&self, feed: &Address) -> Result<RoundData, OracleError>;
}

/// Validating wrapper around a price feed provider.
pub struct OracleService {
	provider: Box<dyn PriceOracleInterface>,
	/// Maximum accepted reading age in seconds. `None` disables the check.
	max_price_age: Option<u64>,
}

impl OracleService {
	pub fn new(provider: Box<dyn PriceOracleInterface>) -> Self {
		Self {
			provider,
			max_price_age: None,
		}
	}

	pub fn with_max_price_age(mut self, max_price_age: Option<u64>) -> Self {
		self.max_price_age = max_price_age;
		self
	}

	/// Reads `feed` and validates the answer against `now`.
	pub async fn read_price(&self, feed: &Address, now: u64) -> Result<PriceReading, OracleError> {
		let round = self.provider.latest_price(feed).await?;

		if !round.answer.is_positive() {
			warn!("Feed {} answered non-positive price {}", feed, round.answer);
			return Err(OracleError::NonPositivePrice {
				feed: *feed,
				answer: round.answer,
			});
		}

		if let Some(max_age) = self.max_price_age {
			if now.saturating_sub(round.updated_at) > max_age {
				warn!(
					"Feed {} is stale: updated at {}, now {}",
					feed, round.updated_at, now
				);
				return Err(OracleError::Stale {
					feed: *feed,
					updated_at: round.updated_at,
					now,
					max_age,
				});
			}
		}

		debug!(
			"Feed {} price {} ({} decimals)",
			feed, round.answer, round.decimals
		);

		Ok(PriceReading {
			price: round.answer.into_raw(),
			decimals: round.decimals,
			updated_at: round.updated_at,
		})
	}
}
