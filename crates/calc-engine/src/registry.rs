//! Strategy registry for the calculation engine.

use calc_types::{Address, CalculatorError, PhaseList, Result, StrategyAddresses};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use crate::implementations::strategies::{
	chunked_unlock::ChunkedUnlockParams, hybrid_ramp::HybridRampParams,
	linear_decay::LinearDecayParams, whitelist::WhitelistParams,
};

/// Kind of amount strategy a reference resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
	PhaseSelector,
	ChunkedUnlock,
	LinearDecay,
	FixedPriceWhitelist,
	HybridRamp,
}

impl fmt::Display for StrategyKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::PhaseSelector => "phase-selector",
			Self::ChunkedUnlock => "chunked-unlock",
			Self::LinearDecay => "linear-decay",
			Self::FixedPriceWhitelist => "fixed-price-whitelist",
			Self::HybridRamp => "hybrid-ramp",
		};
		f.write_str(name)
	}
}

/// Decoded parameter block, tagged by strategy kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyParams {
	PhaseSelector(PhaseList),
	ChunkedUnlock(ChunkedUnlockParams),
	LinearDecay(LinearDecayParams),
	FixedPriceWhitelist(WhitelistParams),
	HybridRamp(HybridRampParams),
}

impl StrategyParams {
	/// Decode `data` as the parameter block of `kind`.
	pub fn decode(kind: StrategyKind, data: &[u8]) -> Result<Self> {
		match kind {
			StrategyKind::PhaseSelector => PhaseList::decode(data).map(Self::PhaseSelector),
			StrategyKind::ChunkedUnlock => {
				ChunkedUnlockParams::decode(data).map(Self::ChunkedUnlock)
			}
			StrategyKind::LinearDecay => LinearDecayParams::decode(data).map(Self::LinearDecay),
			StrategyKind::FixedPriceWhitelist => {
				WhitelistParams::decode(data).map(Self::FixedPriceWhitelist)
			}
			StrategyKind::HybridRamp => HybridRampParams::decode(data).map(Self::HybridRamp),
		}
	}

	pub fn kind(&self) -> StrategyKind {
		match self {
			Self::PhaseSelector(_) => StrategyKind::PhaseSelector,
			Self::ChunkedUnlock(_) => StrategyKind::ChunkedUnlock,
			Self::LinearDecay(_) => StrategyKind::LinearDecay,
			Self::FixedPriceWhitelist(_) => StrategyKind::FixedPriceWhitelist,
			Self::HybridRamp(_) => StrategyKind::HybridRamp,
		}
	}
}

/// Maps strategy references to the kind of strategy they name.
#[derive(Debug, Default, Clone)]
pub struct StrategyRegistry {
	strategies: HashMap<Address, StrategyKind>,
}

impl StrategyRegistry {
	/// Create an empty registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Registry with every reference named in the `[strategies]` section.
	pub fn from_config(addresses: &StrategyAddresses) -> Self {
		let mut registry = Self::new();
		registry.register(addresses.phase_selector, StrategyKind::PhaseSelector);
		registry.register(addresses.chunked_unlock, StrategyKind::ChunkedUnlock);
		registry.register(addresses.linear_decay, StrategyKind::LinearDecay);
		registry.register(
			addresses.fixed_price_whitelist,
			StrategyKind::FixedPriceWhitelist,
		);
		if let Some(hybrid_ramp) = addresses.hybrid_ramp {
			registry.register(hybrid_ramp, StrategyKind::HybridRamp);
		}
		registry
	}

	/// Register `kind` under `reference`, replacing any earlier entry.
	pub fn register(&mut self, reference: Address, kind: StrategyKind) {
		debug!("Registering {} strategy at {}", kind, reference);
		self.strategies.insert(reference, kind);
	}

	pub fn resolve(&self, reference: &Address) -> Result<StrategyKind> {
		self.strategies
			.get(reference)
			.copied()
			.ok_or(CalculatorError::UnknownStrategy(*reference))
	}

	/// Registered references, in no particular order.
	pub fn references(&self) -> impl Iterator<Item = (&Address, &StrategyKind)> {
		self.strategies.iter()
	}

	pub fn len(&self) -> usize {
		self.strategies.len()
	}

	pub fn is_empty(&self) -> bool {
		self.strategies.is_empty()
	}
}
