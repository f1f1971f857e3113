use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::errors::{LedgerError, Result};
use crate::units::{Rate, SCALE};

/// `SCALE` at full width
pub fn one() -> U256 {
    U256::from(SCALE)
}

/// convert a fraction (0.01 for 1%) into a scaled rate, truncating toward zero
pub fn to_percent(fraction: Decimal) -> Result<Rate> {
    Rate::from_fraction(fraction)
}

/// fixed-point multiply: `a * b / SCALE`, truncating
pub fn mul(a: U256, b: U256) -> Result<U256> {
    a.checked_mul(b)
        .map(|product| product / one())
        .ok_or(LedgerError::Overflow { operation: "mul" })
}

/// fixed-point divide: `a * SCALE / b`, truncating
pub fn div(a: U256, b: U256) -> Result<U256> {
    if b.is_zero() {
        return Err(LedgerError::DivisionByZero);
    }

    a.checked_mul(one())
        .map(|scaled| scaled / b)
        .ok_or(LedgerError::Overflow { operation: "div" })
}

/// fixed-point power by repeated truncating multiplication, starting from one
pub fn pow(x: U256, exp: u64) -> Result<U256> {
    let mut acc = one();
    for _ in 0..exp {
        acc = mul(acc, x)?;
    }
    Ok(acc)
}
