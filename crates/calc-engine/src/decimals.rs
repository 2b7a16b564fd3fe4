//! Fixed-point helpers shared by every strategy.
//!
//! All division rounds toward zero. Price conversions fold every power of ten
//! into a single multiply and a single divide, so an amount is rounded at most
//! once on its way from one token's precision to the other's.

use calc_types::{CalculatorError, Result, U256};

/// Decimals of the price axis and of fixed rates.
pub const PRICE_DECIMALS: u8 = 18;

/// `10^exp`, failing once the power no longer fits in 256 bits.
pub fn pow10(exp: u32) -> Result<U256> {
	U256::from(10u64)
		.checked_pow(U256::from(exp))
		.ok_or_else(|| CalculatorError::Arithmetic(format!("10^{} overflows", exp)))
}

/// `a * b / d`, rounding toward zero.
pub fn mul_div(a: U256, b: U256, d: U256) -> Result<U256> {
	if d.is_zero() {
		return Err(CalculatorError::Arithmetic("division by zero".to_string()));
	}
	let product = a
		.checked_mul(b)
		.ok_or_else(|| CalculatorError::Arithmetic(format!("{} * {} overflows", a, b)))?;
	Ok(product / d)
}

/// Rescales `amount` from `from` decimals to `to` decimals.
pub fn normalize(amount: U256, from: u8, to: u8) -> Result<U256> {
	scale(amount, i32::from(to) - i32::from(from))
}

/// Converts `amount` (with `from` decimals) at `price` (with `price_decimals`)
/// into an amount with `to` decimals.
///
/// `amount * price * 10^to / 10^(price_decimals + from)`
pub fn convert_at_price(
	amount: U256,
	price: U256,
	price_decimals: u8,
	from: u8,
	to: u8,
) -> Result<U256> {
	let exp = i32::from(to) - i32::from(price_decimals) - i32::from(from);
	if exp >= 0 {
		checked_mul(amount, price)?.checked_mul(pow10(exp as u32)?).ok_or_else(|| {
			CalculatorError::Arithmetic(format!("{} at price {} overflows", amount, price))
		})
	} else {
		mul_div(amount, price, pow10(exp.unsigned_abs())?)
	}
}

/// Inverse of [`convert_at_price`]: how much of the `to`-decimals side buys
/// `amount` of the `from`-decimals side at `price`.
///
/// `amount * 10^(price_decimals + to) / (price * 10^from)`
pub fn convert_at_inverse_price(
	amount: U256,
	price: U256,
	price_decimals: u8,
	from: u8,
	to: u8,
) -> Result<U256> {
	if price.is_zero() {
		return Err(CalculatorError::Arithmetic("zero price".to_string()));
	}
	let exp = i32::from(price_decimals) + i32::from(to) - i32::from(from);
	if exp >= 0 {
		mul_div(amount, pow10(exp as u32)?, price)
	} else {
		let divisor = checked_mul(price, pow10(exp.unsigned_abs())?)?;
		Ok(amount / divisor)
	}
}

fn scale(amount: U256, exp: i32) -> Result<U256> {
	if exp >= 0 {
		checked_mul(amount, pow10(exp as u32)?)
	} else {
		Ok(amount / pow10(exp.unsigned_abs())?)
	}
}

fn checked_mul(a: U256, b: U256) -> Result<U256> {
	a.checked_mul(b)
		.ok_or_else(|| CalculatorError::Arithmetic(format!("{} * {} overflows", a, b)))
}
