//! In-memory price feeds.
//!
//! Serves fixed `latestPrice` readings keyed by feed address. Readings can be
//! replaced at runtime, which is how tests move the price axis.

use crate::{OracleError, PriceOracleInterface, RoundData};
use async_trait::async_trait;
use calc_types::{Address, OracleFeedConfig, I256};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::RwLock;

/// Price feeds held in memory.
#[derive(Default)]
pub struct FixedPriceFeeds {
	rounds: RwLock<HashMap<Address, RoundData>>,
}

impl FixedPriceFeeds {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a feed while building.
	pub fn with_feed(mut self, feed: Address, round: RoundData) -> Self {
		self.rounds.get_mut().insert(feed, round);
		self
	}

	/// Replaces the reading served for `feed`.
	pub async fn set_price(&self, feed: Address, round: RoundData) {
		self.rounds.write().await.insert(feed, round);
	}
}

#[async_trait]
impl PriceOracleInterface for FixedPriceFeeds {
	async fn latest_price(&self, feed: &Address) -> Result<RoundData, OracleError> {
		self.rounds
			.read()
			.await
			.get(feed)
			.copied()
			.ok_or(OracleError::UnknownFeed(*feed))
	}
}

/// Factory function to create in-memory feeds from the `[oracles]` section.
///
/// Keys are feed addresses; answers are signed decimal strings.
pub fn create_oracle(
	feeds: &HashMap<String, OracleFeedConfig>,
) -> Result<Box<dyn PriceOracleInterface>, OracleError> {
	let mut oracle = FixedPriceFeeds::new();

	for (key, feed) in feeds {
		let address = Address::from_str(key)
			.map_err(|e| OracleError::InvalidConfig(format!("feed '{}': {}", key, e)))?;
		let answer = I256::from_dec_str(&feed.answer)
			.map_err(|e| OracleError::InvalidConfig(format!("feed '{}' answer: {}", key, e)))?;

		oracle = oracle.with_feed(
			address,
			RoundData {
				answer,
				decimals: feed.decimals,
				updated_at: feed.updated_at,
			},
		);
	}

	Ok(Box::new(oracle))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_set_price_replaces_reading() {
		let feed = Address::repeat_byte(0x01);
		let feeds = FixedPriceFeeds::new();
		assert!(feeds.latest_price(&feed).await.is_err());

		let round = RoundData {
			answer: I256::from_dec_str("42").unwrap(),
			decimals: 8,
			updated_at: 7,
		};
		feeds.set_price(feed, round).await;
		assert_eq!(feeds.latest_price(&feed).await.unwrap(), round);
	}

	#[tokio::test]
	async fn test_create_from_config() {
		let mut config = HashMap::new();
		config.insert(
			"0x0101010101010101010101010101010101010101".to_string(),
			OracleFeedConfig {
				answer: "320000000000".to_string(),
				decimals: 8,
				updated_at: 0,
			},
		);

		let oracle = create_oracle(&config).unwrap();
		let round = oracle
			.latest_price(&Address::repeat_byte(0x01))
			.await
			.unwrap();
		assert_eq!(round.answer, I256::from_dec_str("320000000000").unwrap());
		assert_eq!(round.decimals, 8);
	}

	#[test]
	fn test_create_rejects_bad_address() {
		let mut config = HashMap::new();
		config.insert(
			"not-an-address".to_string(),
			OracleFeedConfig {
				answer: "1".to_string(),
				decimals: 8,
				updated_at: 0,
			},
		);
		assert!(matches!(
			create_oracle(&config),
			Err(OracleError::InvalidConfig(_))
		));
	}
}
