use alloy_primitives::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::{LedgerError, Result};

/// fixed-point scale shared by rates and the interest maths
pub const SCALE: u128 = 1_000_000;

/// token amount in base units (wei, satoshis, ...), 256 bits wide
///
/// serialized as a decimal string so no json reader loses precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256::ZERO);
    pub const ONE: Amount = Amount(U256::from_limbs([1, 0, 0, 0]));
    pub const MAX: Amount = Amount(U256::MAX);

    /// create from raw base units
    pub fn from_units(units: u128) -> Self {
        Amount(U256::from(units))
    }

    /// create from a full-width value
    pub const fn from_raw(raw: U256) -> Self {
        Amount(raw)
    }

    /// create from whole tokens, e.g. `from_whole(100, 18)` is 100 ether
    pub fn from_whole(whole: u64, decimals: u32) -> Result<Self> {
        U256::from(10u64)
            .checked_pow(U256::from(decimals))
            .and_then(|unit| unit.checked_mul(U256::from(whole)))
            .map(Amount)
            .ok_or(LedgerError::Overflow { operation: "from_whole" })
    }

    /// get raw base units
    pub const fn as_units(&self) -> U256 {
        self.0
    }

    /// base units as `u128`, `None` when they do not fit
    pub fn to_u128(&self) -> Option<u128> {
        u128::try_from(self.0).ok()
    }

    /// check if zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// multiply by a plain count (eras, repetitions)
    pub fn checked_mul(self, factor: u64) -> Option<Amount> {
        self.0.checked_mul(U256::from(factor)).map(Amount)
    }

    /// split evenly over a plain count, truncating
    pub fn checked_div(self, divisor: u64) -> Option<Amount> {
        self.0.checked_div(U256::from(divisor)).map(Amount)
    }

    /// remainder after taking out whole multiples of `other`
    pub fn checked_rem(self, other: Amount) -> Option<Amount> {
        self.0.checked_rem(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// express as a decimal number of whole tokens, `None` if it does not fit a decimal
    pub fn to_decimal(&self, decimals: u32) -> Option<Decimal> {
        let units = i128::try_from(self.to_u128()?).ok()?;
        Decimal::try_from_i128_with_scale(units, decimals).ok()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    /// parse plain decimal digits
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let digits = s.trim();
        let invalid = || LedgerError::InvalidAmount { value: s.to_string() };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        digits.parse::<U256>().map(Amount).map_err(|_| invalid())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Amount(U256::from(units))
    }
}

impl From<u128> for Amount {
    fn from(units: u128) -> Self {
        Amount(U256::from(units))
    }
}

impl From<U256> for Amount {
    fn from(raw: U256) -> Self {
        Amount(raw)
    }
}

/// per-era interest rate as a fixed-point value scaled by `SCALE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Rate(u128);

impl Rate {
    pub const ZERO: Rate = Rate(0);
    pub const ONE: Rate = Rate(SCALE);

    /// create from a fraction (0.01 for 1%), truncating toward zero
    pub fn from_fraction(fraction: Decimal) -> Result<Self> {
        if fraction.is_sign_negative() && !fraction.is_zero() {
            return Err(LedgerError::InvalidRate { value: fraction });
        }

        fraction
            .checked_mul(Decimal::from(SCALE as u64))
            .map(|scaled| scaled.trunc())
            .and_then(|scaled| scaled.to_u128())
            .map(Rate)
            .ok_or(LedgerError::InvalidRate { value: fraction })
    }

    /// create from basis points (100 for 1%)
    pub fn from_bps(bps: u32) -> Self {
        Rate(bps as u128 * SCALE / 10_000)
    }

    /// create from an already scaled value
    pub const fn from_scaled(scaled: u128) -> Self {
        Rate(scaled)
    }

    pub const fn as_scaled(&self) -> u128 {
        self.0
    }

    /// get as fraction
    pub fn as_fraction(&self) -> Option<Decimal> {
        let scaled = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(scaled, 6).ok()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_fraction() {
            Some(fraction) => write!(f, "{}%", (fraction * Decimal::ONE_HUNDRED).normalize()),
            None => write!(f, "{}/{}", self.0, SCALE),
        }
    }
}
