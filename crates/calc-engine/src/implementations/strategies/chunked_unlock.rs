//! Time-chunked unlock (TWAP) strategy.
//!
//! The order releases `chunk` of the maker asset every `interval` seconds
//! after `start`, up to a total cap. The counter-amount is priced from an
//! oracle feed; requests pinned on the taking side round down to whole chunks.

use alloy_sol_types::{sol_data, SolType};
use calc_oracle::PriceReading;
use calc_types::{
	Address, CalculatorError, FillContext, FillRequest, Order, RequestedAmount, Result, U256,
};
use tracing::debug;

use crate::decimals::{convert_at_inverse_price, convert_at_price};

/// Encoded length with an explicit total cap.
const CAPPED_LEN: usize = 7 * 32;
/// Encoded length without a total cap.
const UNCAPPED_LEN: usize = 6 * 32;

type CappedLayout = (
	sol_data::Uint<256>,
	sol_data::Uint<256>,
	sol_data::Uint<256>,
	sol_data::Uint<256>,
	sol_data::Address,
	sol_data::Uint<8>,
	sol_data::Uint<8>,
);
type UncappedLayout = (
	sol_data::Uint<256>,
	sol_data::Uint<256>,
	sol_data::Uint<256>,
	sol_data::Address,
	sol_data::Uint<8>,
	sol_data::Uint<8>,
);

/// Parameters of a chunked-unlock schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedUnlockParams {
	/// Unix seconds at which the first interval starts counting.
	pub start: U256,
	/// Seconds per interval. Never zero.
	pub interval: U256,
	/// Maker amount released per elapsed interval. Never zero.
	pub chunk: U256,
	/// Upper bound on the released amount; the order's making amount if unset.
	pub total_cap: Option<U256>,
	/// Price feed quoting the taker asset per maker asset.
	pub oracle: Address,
	pub making_decimals: u8,
	pub taking_decimals: u8,
}

impl ChunkedUnlockParams {
	pub fn decode(data: &[u8]) -> Result<Self> {
		let params = match data.len() {
			CAPPED_LEN => {
				let (start, interval, chunk, cap, oracle, making_decimals, taking_decimals) =
					CappedLayout::abi_decode_params(data, true).map_err(malformed)?;
				Self {
					start,
					interval,
					chunk,
					total_cap: Some(cap),
					oracle,
					making_decimals,
					taking_decimals,
				}
			}
			UNCAPPED_LEN => {
				let (start, interval, chunk, oracle, making_decimals, taking_decimals) =
					UncappedLayout::abi_decode_params(data, true).map_err(malformed)?;
				Self {
					start,
					interval,
					chunk,
					total_cap: None,
					oracle,
					making_decimals,
					taking_decimals,
				}
			}
			len => {
				return Err(CalculatorError::MalformedExtraData(format!(
					"chunked unlock parameters are {} bytes, expected {} or {}",
					len, CAPPED_LEN, UNCAPPED_LEN
				)))
			}
		};

		if params.interval.is_zero() {
			return Err(CalculatorError::MalformedExtraData(
				"unlock interval is zero".to_string(),
			));
		}
		if params.chunk.is_zero() {
			return Err(CalculatorError::MalformedExtraData(
				"unlock chunk is zero".to_string(),
			));
		}

		Ok(params)
	}

	pub fn encode(&self) -> Vec<u8> {
		match self.total_cap {
			Some(cap) => CappedLayout::abi_encode_params(&(
				self.start,
				self.interval,
				self.chunk,
				cap,
				self.oracle,
				self.making_decimals,
				self.taking_decimals,
			)),
			None => UncappedLayout::abi_encode_params(&(
				self.start,
				self.interval,
				self.chunk,
				self.oracle,
				self.making_decimals,
				self.taking_decimals,
			)),
		}
	}

	/// Maker amount released by `timestamp`, bounded by `cap`.
	pub fn unlocked_at(&self, timestamp: u64, cap: U256) -> Result<U256> {
		let now = U256::from(timestamp);
		if now < self.start {
			return Ok(U256::ZERO);
		}

		let intervals = (now - self.start)
			.checked_div(self.interval)
			.ok_or_else(|| CalculatorError::Arithmetic("unlock interval is zero".to_string()))?;
		Ok(intervals
			.checked_mul(self.chunk)
			.map(|released| released.min(cap))
			.unwrap_or(cap))
	}

	/// Counter-amount for `request`, priced at `price`.
	///
	/// For a making request this is the taking amount; for a taking request it
	/// is the making amount, rounded down to a whole chunk.
	pub fn calculate(
		&self,
		order: &Order,
		request: &FillRequest,
		ctx: &FillContext,
		price: &PriceReading,
	) -> Result<U256> {
		let cap = self.total_cap.unwrap_or(order.making_amount);
		let unlocked = self.unlocked_at(ctx.timestamp, cap)?;
		let available = unlocked.saturating_sub(request.filled_making_amount(order));

		debug!(
			"Chunked unlock at {}: unlocked {}, available {}",
			ctx.timestamp, unlocked, available
		);

		match request.amount {
			RequestedAmount::Making(making) => {
				ensure_unlocked(making, available)?;
				convert_at_price(
					making,
					price.price,
					price.decimals,
					self.making_decimals,
					self.taking_decimals,
				)
			}
			RequestedAmount::Taking(taking) => {
				let making = convert_at_inverse_price(
					taking,
					price.price,
					price.decimals,
					self.taking_decimals,
					self.making_decimals,
				)?;
				let whole_chunks = making
					.checked_div(self.chunk)
					.ok_or_else(|| CalculatorError::Arithmetic("unlock chunk is zero".to_string()))?
					* self.chunk;
				ensure_unlocked(whole_chunks, available)?;
				Ok(whole_chunks)
			}
		}
	}
}

fn ensure_unlocked(requested: U256, available: U256) -> Result<()> {
	if requested > available {
		return Err(CalculatorError::RequestedExceedsUnlocked {
			requested,
			available,
		});
	}
	Ok(())
}

fn malformed(e: alloy_sol_types::Error) -> CalculatorError {
	CalculatorError::MalformedExtraData(e.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use calc_types::Bytes;

	const START: u64 = 1_000_000;

	fn ether(n: u64) -> U256 {
		U256::from(n) * U256::from(10u64).pow(U256::from(18))
	}

	fn params() -> ChunkedUnlockParams {
		ChunkedUnlockParams {
			start: U256::from(START),
			interval: U256::from(300),
			chunk: ether(1),
			total_cap: Some(ether(10)),
			oracle: Address::repeat_byte(0x0a),
			making_decimals: 18,
			taking_decimals: 18,
		}
	}

	fn order() -> Order {
		Order {
			maker: Address::repeat_byte(0x01),
			maker_asset: Address::repeat_byte(0x02),
			taker_asset: Address::repeat_byte(0x03),
			making_amount: ether(10),
			taking_amount: U256::ZERO,
			extra_data: Bytes::new(),
		}
	}

	fn price_3200() -> PriceReading {
		PriceReading {
			price: U256::from(3200u64) * U256::from(100_000_000u64),
			decimals: 8,
			updated_at: START,
		}
	}

	fn taker() -> Address {
		Address::repeat_byte(0x07)
	}

	#[test]
	fn test_decode_both_layouts() {
		let capped = params();
		let encoded = capped.encode();
		assert_eq!(encoded.len(), CAPPED_LEN);
		assert_eq!(ChunkedUnlockParams::decode(&encoded).unwrap(), capped);

		let uncapped = ChunkedUnlockParams {
			total_cap: None,
			..params()
		};
		let encoded = uncapped.encode();
		assert_eq!(encoded.len(), UNCAPPED_LEN);
		assert_eq!(ChunkedUnlockParams::decode(&encoded).unwrap(), uncapped);
	}

	fn word(value: U256) -> [u8; 32] {
		value.to_be_bytes::<32>()
	}

	fn address_word(address: Address) -> [u8; 32] {
		let mut out = [0u8; 32];
		out[12..].copy_from_slice(address.as_slice());
		out
	}

	#[test]
	fn test_decode_abi_coder_layouts() {
		// AbiCoder.encode(["uint256","uint256","uint256","address","uint8","uint8"],
		//     [twapStart, 60, 500e18, oracle, 18, 18])
		let oracle = Address::repeat_byte(0xfe);
		let mut uncapped = Vec::new();
		uncapped.extend(word(U256::from(1_700_000_060u64)));
		uncapped.extend(word(U256::from(60)));
		uncapped.extend(word(ether(500)));
		uncapped.extend(address_word(oracle));
		uncapped.extend(word(U256::from(18)));
		uncapped.extend(word(U256::from(18)));

		let decoded = ChunkedUnlockParams::decode(&uncapped).unwrap();
		assert_eq!(
			decoded,
			ChunkedUnlockParams {
				start: U256::from(1_700_000_060u64),
				interval: U256::from(60),
				chunk: ether(500),
				total_cap: None,
				oracle,
				making_decimals: 18,
				taking_decimals: 18,
			}
		);
		assert_eq!(decoded.encode(), uncapped);

		// the capped layout puts the cap after the chunk, with 18 and 6 decimals
		let mut capped = Vec::new();
		capped.extend(word(U256::from(START)));
		capped.extend(word(U256::from(300)));
		capped.extend(word(ether(1)));
		capped.extend(word(ether(10)));
		capped.extend(address_word(oracle));
		capped.extend(word(U256::from(18)));
		capped.extend(word(U256::from(6)));

		let decoded = ChunkedUnlockParams::decode(&capped).unwrap();
		assert_eq!(decoded.total_cap, Some(ether(10)));
		assert_eq!(decoded.oracle, oracle);
		assert_eq!(decoded.making_decimals, 18);
		assert_eq!(decoded.taking_decimals, 6);
		assert_eq!(decoded.encode(), capped);
	}

	#[test]
	fn test_decode_rejects_wide_decimals_word() {
		let mut data = params().encode();
		// making decimals word set to 256
		data[5 * 32 + 30] = 1;
		assert!(matches!(
			ChunkedUnlockParams::decode(&data),
			Err(CalculatorError::MalformedExtraData(_))
		));
	}

	#[test]
	fn test_zero_schedule_is_an_error_not_a_panic() {
		let ctx = FillContext::at(START + 300);
		let zero_interval = ChunkedUnlockParams {
			interval: U256::ZERO,
			..params()
		};
		assert!(matches!(
			zero_interval.unlocked_at(START + 300, ether(10)),
			Err(CalculatorError::Arithmetic(_))
		));
		assert!(matches!(
			zero_interval.calculate(
				&order(),
				&FillRequest::making(taker(), ether(1)),
				&ctx,
				&price_3200()
			),
			Err(CalculatorError::Arithmetic(_))
		));

		let zero_chunk = ChunkedUnlockParams {
			chunk: U256::ZERO,
			..params()
		};
		assert!(matches!(
			zero_chunk.calculate(
				&order(),
				&FillRequest::taking(taker(), ether(3200)),
				&ctx,
				&price_3200()
			),
			Err(CalculatorError::Arithmetic(_))
		));
	}

	#[test]
	fn test_decode_rejects_bad_input() {
		assert!(matches!(
			ChunkedUnlockParams::decode(&[0u8; 100]),
			Err(CalculatorError::MalformedExtraData(_))
		));

		let zero_interval = ChunkedUnlockParams {
			interval: U256::ZERO,
			..params()
		};
		assert!(ChunkedUnlockParams::decode(&zero_interval.encode()).is_err());
	}

	#[test]
	fn test_nothing_unlocked_before_start() {
		let p = params();
		assert_eq!(p.unlocked_at(START - 1, ether(10)).unwrap(), U256::ZERO);
		assert_eq!(p.unlocked_at(0, ether(10)).unwrap(), U256::ZERO);
		assert_eq!(p.unlocked_at(START + 299, ether(10)).unwrap(), U256::ZERO);
	}

	#[test]
	fn test_unlock_monotonic_and_capped() {
		let p = params();
		let mut previous = U256::ZERO;
		for t in (START..START + 4_000).step_by(37) {
			let unlocked = p.unlocked_at(t, ether(10)).unwrap();
			assert!(unlocked >= previous);
			assert!(unlocked <= ether(10));
			previous = unlocked;
		}
		assert_eq!(p.unlocked_at(START + 3_000, ether(10)).unwrap(), ether(10));
		assert_eq!(p.unlocked_at(u64::MAX, ether(10)).unwrap(), ether(10));
	}

	#[test]
	fn test_unlock_saturates_on_overflow() {
		let p = ChunkedUnlockParams {
			interval: U256::from(1),
			chunk: U256::MAX,
			..params()
		};
		assert_eq!(p.unlocked_at(START + 5, ether(10)).unwrap(), ether(10));
	}

	#[test]
	fn test_one_chunk_after_first_interval() {
		let ctx = FillContext::at(START + 300);
		let request = FillRequest::making(taker(), ether(1));
		let taking = params()
			.calculate(&order(), &request, &ctx, &price_3200())
			.unwrap();
		assert_eq!(taking, ether(3200));
	}

	#[test]
	fn test_two_chunks_exceed_unlocked() {
		let ctx = FillContext::at(START + 300);
		let request = FillRequest::making(taker(), ether(2));
		let result = params().calculate(&order(), &request, &ctx, &price_3200());
		assert_eq!(
			result,
			Err(CalculatorError::RequestedExceedsUnlocked {
				requested: ether(2),
				available: ether(1),
			})
		);
	}

	#[test]
	fn test_taking_request_rounds_to_whole_chunk() {
		let ctx = FillContext::at(START + 300);
		// 1.5 chunks worth of counter-amount
		let request = FillRequest::taking(taker(), ether(4800));
		let making = params()
			.calculate(&order(), &request, &ctx, &price_3200())
			.unwrap();
		assert_eq!(making, ether(1));
	}

	#[test]
	fn test_capped_after_full_schedule() {
		let ctx = FillContext::at(START + 3_000);
		let all = FillRequest::making(taker(), ether(10));
		assert!(params()
			.calculate(&order(), &all, &ctx, &price_3200())
			.is_ok());

		let later = FillContext::at(START + 30_000);
		let more = FillRequest::making(taker(), ether(11));
		assert!(matches!(
			params().calculate(&order(), &more, &later, &price_3200()),
			Err(CalculatorError::RequestedExceedsUnlocked { .. })
		));
	}

	#[test]
	fn test_prior_fills_reduce_available() {
		let ctx = FillContext::at(START + 900);
		// three chunks unlocked, two already filled
		let request = FillRequest::making(taker(), ether(2)).with_remaining(ether(8));
		let result = params().calculate(&order(), &request, &ctx, &price_3200());
		assert_eq!(
			result,
			Err(CalculatorError::RequestedExceedsUnlocked {
				requested: ether(2),
				available: ether(1),
			})
		);

		let request = FillRequest::making(taker(), ether(1)).with_remaining(ether(8));
		assert!(params()
			.calculate(&order(), &request, &ctx, &price_3200())
			.is_ok());
	}

	#[test]
	fn test_cap_defaults_to_order_amount() {
		let p = ChunkedUnlockParams {
			total_cap: None,
			..params()
		};
		let ctx = FillContext::at(START + 30_000);
		let request = FillRequest::making(taker(), ether(11));
		assert!(matches!(
			p.calculate(&order(), &request, &ctx, &price_3200()),
			Err(CalculatorError::RequestedExceedsUnlocked { available, .. }) if available == ether(10)
		));
	}
}
