//! Phase lists: ordered, half-open windows on a reference axis.
//!
//! Wire form is `abi.encode(uint8 mode, address, (uint256,uint256,address,bytes)[])`.
//! The mode word is a bool in lists built as `abi.encode(bool, ...)`: `0` and
//! `1` both lay phases out on the timestamp, `1` additionally requiring the
//! oracle to be set. `2` lays them out on the oracle price.
//! Lists are validated when decoded; a list that is empty, unordered or
//! overlapping is rejected instead of being repaired.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, sol_data, SolType};

use crate::errors::{CalculatorError, Result};

sol! {
	struct PhaseData {
		uint256 start;
		uint256 end;
		address strategy;
		bytes extraData;
	}
}

type PhaseListLayout = (
	sol_data::Uint<8>,
	sol_data::Address,
	sol_data::Array<PhaseData>,
);

/// Timestamp axis, no oracle attached.
pub const MODE_TIME: u8 = 0;
/// Timestamp axis with an oracle the strategies price against.
pub const MODE_TIME_WITH_ORACLE: u8 = 1;
/// Oracle price axis.
pub const MODE_PRICE: u8 = 2;

/// Which scalar selects the active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMode {
	/// Current timestamp in seconds.
	ElapsedTime,
	/// Price read from the phase list's oracle, scaled to 18 decimals.
	OraclePrice,
}

impl AxisMode {
	/// Axis for a mode word and whether that word demands an oracle.
	fn from_word(word: u8) -> Result<(Self, bool)> {
		match word {
			MODE_TIME => Ok((Self::ElapsedTime, false)),
			MODE_TIME_WITH_ORACLE => Ok((Self::ElapsedTime, true)),
			MODE_PRICE => Ok((Self::OraclePrice, true)),
			other => Err(CalculatorError::MalformedPhaseList(format!(
				"unknown axis mode {}",
				other
			))),
		}
	}
}

/// One window `[start, end)` and the strategy that governs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
	pub start: U256,
	pub end: U256,
	pub strategy: Address,
	pub extra_data: Bytes,
}

impl Phase {
	pub fn contains(&self, axis: U256) -> bool {
		self.start <= axis && axis < self.end
	}
}

/// Ordered phases plus the axis they are laid out on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseList {
	pub mode: AxisMode,
	pub oracle: Address,
	pub phases: Vec<Phase>,
}

impl PhaseList {
	/// Builds and validates a phase list.
	pub fn new(mode: AxisMode, oracle: Address, phases: Vec<Phase>) -> Result<Self> {
		let list = Self {
			mode,
			oracle,
			phases,
		};
		list.validate()?;
		Ok(list)
	}

	pub fn decode(data: &[u8]) -> Result<Self> {
		let (word, oracle, raw_phases) = PhaseListLayout::abi_decode_params(data, true)
			.map_err(|e| CalculatorError::MalformedPhaseList(e.to_string()))?;

		let (mode, oracle_required) = AxisMode::from_word(word)?;
		if oracle_required && oracle == Address::ZERO {
			return Err(CalculatorError::MalformedPhaseList(format!(
				"axis mode {} requires an oracle",
				word
			)));
		}

		let phases = raw_phases
			.into_iter()
			.map(|p| Phase {
				start: p.start,
				end: p.end,
				strategy: p.strategy,
				extra_data: p.extraData,
			})
			.collect();

		Self::new(mode, oracle, phases)
	}

	pub fn encode(&self) -> Vec<u8> {
		let raw_phases: Vec<PhaseData> = self
			.phases
			.iter()
			.map(|p| PhaseData {
				start: p.start,
				end: p.end,
				strategy: p.strategy,
				extraData: p.extra_data.clone(),
			})
			.collect();

		PhaseListLayout::abi_encode_params(&(self.mode_word(), self.oracle, raw_phases))
	}

	/// Mode word written by [`PhaseList::encode`].
	pub fn mode_word(&self) -> u8 {
		match self.mode {
			AxisMode::OraclePrice => MODE_PRICE,
			AxisMode::ElapsedTime if self.oracle == Address::ZERO => MODE_TIME,
			AxisMode::ElapsedTime => MODE_TIME_WITH_ORACLE,
		}
	}

	/// Rejects lists the selector cannot give a unique answer for.
	pub fn validate(&self) -> Result<()> {
		if self.phases.is_empty() {
			return Err(CalculatorError::MalformedPhaseList(
				"phase list is empty".to_string(),
			));
		}

		if self.mode == AxisMode::OraclePrice && self.oracle == Address::ZERO {
			return Err(CalculatorError::MalformedPhaseList(
				"price axis requires an oracle".to_string(),
			));
		}

		for (i, phase) in self.phases.iter().enumerate() {
			if phase.start >= phase.end {
				return Err(CalculatorError::MalformedPhaseList(format!(
					"phase {} has empty window [{}, {})",
					i, phase.start, phase.end
				)));
			}
		}

		for (i, pair) in self.phases.windows(2).enumerate() {
			if pair[1].start < pair[0].end {
				return Err(CalculatorError::MalformedPhaseList(format!(
					"phase {} starts at {} before phase {} ends at {}",
					i + 1,
					pair[1].start,
					i,
					pair[0].end
				)));
			}
		}

		Ok(())
	}

	/// First phase whose window contains `axis`.
	pub fn active_phase(&self, axis: U256) -> Option<(usize, &Phase)> {
		self.phases
			.iter()
			.enumerate()
			.find(|(_, phase)| phase.contains(axis))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn phase(start: u64, end: u64, tag: u8) -> Phase {
		Phase {
			start: U256::from(start),
			end: U256::from(end),
			strategy: Address::repeat_byte(tag),
			extra_data: Bytes::from(vec![tag; 3]),
		}
	}

	fn three_phases() -> PhaseList {
		PhaseList::new(
			AxisMode::ElapsedTime,
			Address::ZERO,
			vec![phase(100, 200, 1), phase(200, 300, 2), phase(300, 400, 3)],
		)
		.unwrap()
	}

	#[test]
	fn test_encode_decode() {
		let list = PhaseList::new(
			AxisMode::OraclePrice,
			Address::repeat_byte(0xaa),
			vec![phase(100, 200, 1), phase(250, 300, 2)],
		)
		.unwrap();

		let decoded = PhaseList::decode(&list.encode()).unwrap();
		assert_eq!(decoded, list);
	}

	#[test]
	fn test_exactly_one_phase_active() {
		let list = three_phases();
		for axis in 100u64..400 {
			let matches = list
				.phases
				.iter()
				.filter(|p| p.contains(U256::from(axis)))
				.count();
			assert_eq!(matches, 1, "axis {}", axis);
		}
	}

	#[test]
	fn test_boundary_selects_later_phase() {
		let list = three_phases();
		let (index, _) = list.active_phase(U256::from(200)).unwrap();
		assert_eq!(index, 1);
		let (index, _) = list.active_phase(U256::from(300)).unwrap();
		assert_eq!(index, 2);
	}

	#[test]
	fn test_outside_all_windows() {
		let list = three_phases();
		assert!(list.active_phase(U256::from(99)).is_none());
		assert!(list.active_phase(U256::from(400)).is_none());
	}

	#[test]
	fn test_rejects_overlap() {
		let result = PhaseList::new(
			AxisMode::ElapsedTime,
			Address::ZERO,
			vec![phase(100, 250, 1), phase(200, 300, 2)],
		);
		assert!(matches!(
			result,
			Err(CalculatorError::MalformedPhaseList(_))
		));
	}

	#[test]
	fn test_rejects_descending() {
		let result = PhaseList::new(
			AxisMode::ElapsedTime,
			Address::ZERO,
			vec![phase(300, 400, 1), phase(100, 200, 2)],
		);
		assert!(result.is_err());
	}

	#[test]
	fn test_rejects_empty_window_and_list() {
		assert!(PhaseList::new(AxisMode::ElapsedTime, Address::ZERO, vec![]).is_err());
		assert!(PhaseList::new(
			AxisMode::ElapsedTime,
			Address::ZERO,
			vec![phase(100, 100, 1)]
		)
		.is_err());
	}

	#[test]
	fn test_price_axis_requires_oracle() {
		let result = PhaseList::new(
			AxisMode::OraclePrice,
			Address::ZERO,
			vec![phase(100, 200, 1)],
		);
		assert!(result.is_err());
	}

	fn word(value: u64) -> [u8; 32] {
		U256::from(value).to_be_bytes::<32>()
	}

	fn address_word(address: Address) -> [u8; 32] {
		let mut out = [0u8; 32];
		out[12..].copy_from_slice(address.as_slice());
		out
	}

	/// `abi.encode(mode, oracle, [(start, end, strategy, 0xdeadbe)])` laid out
	/// by hand.
	fn single_phase_blob(mode: u64, oracle: Address, start: u64, end: u64) -> Vec<u8> {
		let mut blob = Vec::new();
		blob.extend(word(mode));
		blob.extend(address_word(oracle));
		// offset of the phase array
		blob.extend(word(0x60));
		blob.extend(word(1));
		// offset of the only tuple, relative to the array body
		blob.extend(word(0x20));
		blob.extend(word(start));
		blob.extend(word(end));
		blob.extend(address_word(Address::repeat_byte(0x33)));
		// offset of the bytes field, relative to the tuple
		blob.extend(word(0x80));
		blob.extend(word(3));
		let mut data = [0u8; 32];
		data[..3].copy_from_slice(&[0xde, 0xad, 0xbe]);
		blob.extend(data);
		blob
	}

	#[test]
	fn test_decode_bool_true_list_is_time_axis() {
		let oracle = Address::repeat_byte(0xfe);
		let blob = single_phase_blob(1, oracle, 1_700_000_060, 1_700_001_260);

		let list = PhaseList::decode(&blob).unwrap();
		assert_eq!(list.mode, AxisMode::ElapsedTime);
		assert_eq!(list.oracle, oracle);
		assert_eq!(list.phases.len(), 1);
		assert_eq!(list.phases[0].start, U256::from(1_700_000_060u64));
		assert_eq!(list.phases[0].end, U256::from(1_700_001_260u64));
		assert_eq!(list.phases[0].strategy, Address::repeat_byte(0x33));
		assert_eq!(list.phases[0].extra_data.as_ref(), &[0xde, 0xad, 0xbe]);
		assert!(list.active_phase(U256::from(1_700_000_180u64)).is_some());

		// re-encoding reproduces the same bytes
		assert_eq!(list.encode(), blob);
	}

	#[test]
	fn test_decode_mode_words() {
		let oracle = Address::repeat_byte(0xfe);

		let plain = PhaseList::decode(&single_phase_blob(0, Address::ZERO, 10, 20)).unwrap();
		assert_eq!(plain.mode, AxisMode::ElapsedTime);
		assert_eq!(plain.mode_word(), MODE_TIME);

		let priced = PhaseList::decode(&single_phase_blob(2, oracle, 10, 20)).unwrap();
		assert_eq!(priced.mode, AxisMode::OraclePrice);
		assert_eq!(priced.encode(), single_phase_blob(2, oracle, 10, 20));

		// the oracle flag needs an oracle
		assert!(matches!(
			PhaseList::decode(&single_phase_blob(1, Address::ZERO, 10, 20)),
			Err(CalculatorError::MalformedPhaseList(_))
		));
		assert!(matches!(
			PhaseList::decode(&single_phase_blob(3, oracle, 10, 20)),
			Err(CalculatorError::MalformedPhaseList(_))
		));
	}

	#[test]
	fn test_decode_garbage() {
		let result = PhaseList::decode(&[1, 2, 3]);
		assert!(matches!(
			result,
			Err(CalculatorError::MalformedPhaseList(_))
		));
	}
}
