//! Execution-amount calculation engine.
//!
//! Given an order, a fill request and the host clock, the engine decides
//! whether the fill is allowed and returns its counter-amount. The order's
//! amount getter names a strategy; the phase selector strategy picks one
//! phase of a phase list by the current axis value and delegates to that
//! phase's strategy.
//!
//! Every failure aborts the whole fill attempt. Nothing is retried and no
//! state is kept between calls.

use calc_oracle::implementations::fixed::create_oracle;
use calc_oracle::{OracleError, OracleService};
use calc_types::{
	Address, CalculatorConfig, CalculatorError, FillContext, FillRequest, Order, PhaseList, Result,
	U256,
};
use tracing::{debug, info, instrument};

pub mod axis;
pub mod decimals;
pub mod registry;
pub mod selector;

/// Re-export implementations
pub mod implementations {
	pub mod strategies {
		pub mod chunked_unlock;
		pub mod hybrid_ramp;
		pub mod linear_decay;
		pub mod whitelist;
	}
}

pub use registry::{StrategyKind, StrategyParams, StrategyRegistry};

/// Entry point the settlement engine calls for every fill attempt.
pub struct CalculatorService {
	registry: StrategyRegistry,
	oracle: OracleService,
}

impl CalculatorService {
	pub fn new(registry: StrategyRegistry, oracle: OracleService) -> Self {
		Self { registry, oracle }
	}

	/// Builds the engine from configuration, serving the configured static feeds.
	pub fn from_config(config: &CalculatorConfig) -> std::result::Result<Self, OracleError> {
		let registry = StrategyRegistry::from_config(&config.strategies);
		let oracle = OracleService::new(create_oracle(&config.oracles)?)
			.with_max_price_age(config.engine.max_price_age_secs);

		info!(
			"Calculator '{}' ready with {} strategies and {} feeds",
			config.engine.name,
			registry.len(),
			config.oracles.len()
		);
		Ok(Self::new(registry, oracle))
	}

	pub fn registry(&self) -> &StrategyRegistry {
		&self.registry
	}

	/// Counter-amount for `request` against `order`.
	///
	/// Dispatches on the strategy reference at the head of the order's
	/// amount getter.
	#[instrument(skip_all, fields(maker = %order.maker, taker = %request.taker))]
	pub async fn calculate(
		&self,
		order: &Order,
		request: &FillRequest,
		ctx: &FillContext,
	) -> Result<U256> {
		let getter = order.amount_getter()?;
		let kind = self.registry.resolve(&getter.strategy)?;
		debug!("Order amount getter resolves to {}", kind);

		match StrategyParams::decode(kind, &getter.data)? {
			StrategyParams::PhaseSelector(list) => {
				self.select_and_delegate(order, &list, request, ctx).await
			}
			params => self.evaluate(params, order, request, ctx).await,
		}
	}

	/// Taking amount for `making` of the maker asset.
	pub async fn get_taking_amount(
		&self,
		order: &Order,
		taker: Address,
		making: U256,
		remaining_making_amount: U256,
		ctx: &FillContext,
	) -> Result<U256> {
		let request = FillRequest::making(taker, making).with_remaining(remaining_making_amount);
		self.calculate(order, &request, ctx).await
	}

	/// Making amount bought by `taking` of the taker asset.
	pub async fn get_making_amount(
		&self,
		order: &Order,
		taker: Address,
		taking: U256,
		remaining_making_amount: U256,
		ctx: &FillContext,
	) -> Result<U256> {
		let request = FillRequest::taking(taker, taking).with_remaining(remaining_making_amount);
		self.calculate(order, &request, ctx).await
	}

	/// Picks the active phase of `list` and runs its strategy.
	///
	/// The selected strategy's result is returned unmodified.
	pub async fn select_and_delegate(
		&self,
		order: &Order,
		list: &PhaseList,
		request: &FillRequest,
		ctx: &FillContext,
	) -> Result<U256> {
		let axis = axis::phase_list_axis(&self.oracle, list, ctx).await?;
		let (index, phase) = selector::select_phase(list, axis)?;

		let kind = self.registry.resolve(&phase.strategy)?;
		let params = StrategyParams::decode(kind, &phase.extra_data)?;
		debug!("Phase {} delegates to {}", index, kind);

		self.evaluate(params, order, request, ctx).await
	}

	async fn evaluate(
		&self,
		params: StrategyParams,
		order: &Order,
		request: &FillRequest,
		ctx: &FillContext,
	) -> Result<U256> {
		match params {
			StrategyParams::PhaseSelector(_) => Err(CalculatorError::MalformedPhaseList(
				"a phase cannot delegate to the phase selector".to_string(),
			)),
			StrategyParams::ChunkedUnlock(p) => {
				let price = axis::read_price(&self.oracle, &p.oracle, ctx).await?;
				p.calculate(order, request, ctx, &price)
			}
			StrategyParams::LinearDecay(p) => p.calculate(order, request, ctx),
			StrategyParams::FixedPriceWhitelist(p) => p.calculate(request),
			StrategyParams::HybridRamp(p) => p.calculate(request, ctx),
		}
	}
}
