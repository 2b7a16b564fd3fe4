//! Linear-decay (Dutch auction) strategy.
//!
//! The counter-amount for the whole order moves in a straight line from
//! `counter_start` to `counter_end` over a time window and is clamped outside
//! it. Partial fills are scaled pro rata against the order's making amount.

use calc_types::{CalculatorError, FillContext, FillRequest, Order, RequestedAmount, Result, U256};
use tracing::debug;

use crate::decimals::mul_div;

/// Encoded length: packed window plus two counter bounds.
const ENCODED_LEN: usize = 3 * 32;

/// Time window `[start, end]` of the decay.
///
/// On the wire both ends share one word as `start << 128 | end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearDecayWindow {
	pub start: U256,
	pub end: U256,
}

impl LinearDecayWindow {
	pub fn unpack(packed: U256) -> Self {
		Self {
			start: packed >> 128usize,
			end: packed & U256::from(u128::MAX),
		}
	}

	pub fn pack(&self) -> U256 {
		(self.start << 128usize) | self.end
	}
}

/// Parameters of a linear-decay schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearDecayParams {
	pub window: LinearDecayWindow,
	/// Taking amount for the full order at `window.start`.
	pub counter_start: U256,
	/// Taking amount for the full order at `window.end`.
	pub counter_end: U256,
}

impl LinearDecayParams {
	pub fn decode(data: &[u8]) -> Result<Self> {
		if data.len() != ENCODED_LEN {
			return Err(CalculatorError::MalformedExtraData(format!(
				"linear decay parameters are {} bytes, expected {}",
				data.len(),
				ENCODED_LEN
			)));
		}

		let word = |i: usize| U256::from_be_slice(&data[i * 32..(i + 1) * 32]);
		let params = Self {
			window: LinearDecayWindow::unpack(word(0)),
			counter_start: word(1),
			counter_end: word(2),
		};

		if params.window.end <= params.window.start {
			return Err(CalculatorError::MalformedExtraData(format!(
				"decay window [{}, {}] is empty",
				params.window.start, params.window.end
			)));
		}

		Ok(params)
	}

	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(ENCODED_LEN);
		out.extend_from_slice(&self.window.pack().to_be_bytes::<32>());
		out.extend_from_slice(&self.counter_start.to_be_bytes::<32>());
		out.extend_from_slice(&self.counter_end.to_be_bytes::<32>());
		out
	}

	/// Taking amount for the full order at `timestamp`.
	pub fn counter_total(&self, timestamp: u64) -> Result<U256> {
		interpolate(
			self.counter_start,
			self.counter_end,
			self.window.start,
			self.window.end,
			U256::from(timestamp),
		)
	}

	pub fn calculate(
		&self,
		order: &Order,
		request: &FillRequest,
		ctx: &FillContext,
	) -> Result<U256> {
		let total = self.counter_total(ctx.timestamp)?;
		debug!("Linear decay at {}: counter total {}", ctx.timestamp, total);

		match request.amount {
			RequestedAmount::Making(making) => mul_div(total, making, order.making_amount),
			RequestedAmount::Taking(taking) => mul_div(order.making_amount, taking, total),
		}
	}
}

/// Value on the line from `(start, from)` to `(end, to)` at `at`, clamped to
/// the window. Exact for rising and falling lines alike.
pub fn interpolate(from: U256, to: U256, start: U256, end: U256, at: U256) -> Result<U256> {
	if end <= start {
		return Err(CalculatorError::Arithmetic(format!(
			"empty interpolation window [{}, {}]",
			start, end
		)));
	}

	let at = at.clamp(start, end);
	let head = from
		.checked_mul(end - at)
		.ok_or_else(|| overflow(from, end - at))?;
	let tail = to.checked_mul(at - start).ok_or_else(|| overflow(to, at - start))?;
	let sum = head
		.checked_add(tail)
		.ok_or_else(|| CalculatorError::Arithmetic("interpolation sum overflows".to_string()))?;

	Ok(sum / (end - start))
}

fn overflow(a: U256, b: U256) -> CalculatorError {
	CalculatorError::Arithmetic(format!("{} * {} overflows", a, b))
}

#[cfg(test)]
mod tests {
	use super::*;
	use calc_types::{Address, Bytes};

	fn ether(n: u64) -> U256 {
		U256::from(n) * U256::from(10u64).pow(U256::from(18))
	}

	fn params(counter_start: U256, counter_end: U256) -> LinearDecayParams {
		LinearDecayParams {
			window: LinearDecayWindow {
				start: U256::from(1_000),
				end: U256::from(2_000),
			},
			counter_start,
			counter_end,
		}
	}

	fn order(making: U256) -> Order {
		Order {
			maker: Address::repeat_byte(0x01),
			maker_asset: Address::repeat_byte(0x02),
			taker_asset: Address::repeat_byte(0x03),
			making_amount: making,
			taking_amount: U256::ZERO,
			extra_data: Bytes::new(),
		}
	}

	#[test]
	fn test_window_packing() {
		let window = LinearDecayWindow {
			start: U256::from(1_700_000_600u64),
			end: U256::from(1_700_001_200u64),
		};
		let packed = window.pack();
		assert_eq!(packed >> 128usize, window.start);
		assert_eq!(LinearDecayWindow::unpack(packed), window);
	}

	#[test]
	fn test_decode_encoded() {
		let p = params(ether(3), ether(2));
		assert_eq!(LinearDecayParams::decode(&p.encode()).unwrap(), p);
	}

	#[test]
	fn test_decode_rejects_bad_input() {
		assert!(matches!(
			LinearDecayParams::decode(&[0u8; 64]),
			Err(CalculatorError::MalformedExtraData(_))
		));

		let mut reversed = params(ether(3), ether(2));
		reversed.window = LinearDecayWindow {
			start: U256::from(2_000),
			end: U256::from(1_000),
		};
		assert!(LinearDecayParams::decode(&reversed.encode()).is_err());
	}

	#[test]
	fn test_midpoint_decreasing() {
		let p = params(ether(3), ether(2));
		assert_eq!(p.counter_total(1_500).unwrap(), ether(25) / U256::from(10));
	}

	#[test]
	fn test_midpoint_increasing() {
		let p = params(ether(2), ether(3));
		assert_eq!(p.counter_total(1_500).unwrap(), ether(25) / U256::from(10));
	}

	#[test]
	fn test_clamped_outside_window() {
		let p = params(ether(3), ether(2));
		assert_eq!(p.counter_total(0).unwrap(), ether(3));
		assert_eq!(p.counter_total(1_000).unwrap(), ether(3));
		assert_eq!(p.counter_total(2_000).unwrap(), ether(2));
		assert_eq!(p.counter_total(u64::MAX).unwrap(), ether(2));
	}

	#[test]
	fn test_partial_fill_scaled() {
		let p = params(ether(3), ether(2));
		let ctx = FillContext::at(1_500);

		let full = FillRequest::making(Address::ZERO, ether(1));
		assert_eq!(
			p.calculate(&order(ether(1)), &full, &ctx).unwrap(),
			ether(25) / U256::from(10)
		);

		// a quarter of a 4-unit order at the midpoint
		let quarter = FillRequest::making(Address::ZERO, ether(1));
		assert_eq!(
			p.calculate(&order(ether(4)), &quarter, &ctx).unwrap(),
			ether(25) / U256::from(40)
		);
	}

	#[test]
	fn test_taking_request_inverts() {
		let p = params(ether(3), ether(2));
		let ctx = FillContext::at(1_500);
		let request = FillRequest::taking(Address::ZERO, ether(25) / U256::from(10));
		assert_eq!(p.calculate(&order(ether(1)), &request, &ctx).unwrap(), ether(1));
	}
}
