//! Phase selection on a reference axis.

use calc_types::{CalculatorError, Phase, PhaseList, Result, U256};
use tracing::debug;

/// Returns the phase whose window holds `axis`.
///
/// Windows are half-open, so an axis value on a shared boundary belongs to the
/// later phase.
pub fn select_phase(list: &PhaseList, axis: U256) -> Result<(usize, &Phase)> {
	match list.active_phase(axis) {
		Some((index, phase)) => {
			debug!(
				"Axis {} selects phase {} [{}, {}) -> {}",
				axis, index, phase.start, phase.end, phase.strategy
			);
			Ok((index, phase))
		}
		None => {
			debug!("Axis {} is outside all {} phases", axis, list.phases.len());
			Err(CalculatorError::NoActivePhase { axis })
		}
	}
}
