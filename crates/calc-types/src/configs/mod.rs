//! # Configuration Types
//!
//! Deserialized shape of the engine's TOML configuration. Loading,
//! environment substitution and schema validation live in `calc-config`.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatorConfig {
	/// Engine identity, logging and oracle policy
	pub engine: EngineSettings,
	/// Strategy references known to the registry
	pub strategies: StrategyAddresses,
	/// Static price feed readings keyed by feed address
	#[serde(default)]
	pub oracles: HashMap<String, OracleFeedConfig>,
}

/// Core engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
	/// Name of this engine instance, used in logs
	pub name: String,
	/// Logging level for the service
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// Maximum accepted age of an oracle reading; unset disables the check
	#[serde(default)]
	pub max_price_age_secs: Option<u64>,
}

fn default_log_level() -> String {
	"info".to_string()
}

/// Addresses under which each strategy kind is referenced by orders.
///
/// The phase selector is itself a strategy: an order whose amount getter
/// points at it carries a phase list instead of a single parameter block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAddresses {
	pub phase_selector: Address,
	pub chunked_unlock: Address,
	pub linear_decay: Address,
	pub fixed_price_whitelist: Address,
	#[serde(default)]
	pub hybrid_ramp: Option<Address>,
}

/// A fixed `latestPrice` reading served by the in-memory feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleFeedConfig {
	/// Signed answer as a decimal string
	pub answer: String,
	/// Decimals of `answer`
	pub decimals: u8,
	/// Unix seconds of the reading; defaults to zero
	#[serde(default)]
	pub updated_at: u64,
}
