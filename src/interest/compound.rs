use alloy_primitives::U256;

use crate::errors::{LedgerError, Result};
use crate::interest::fixed::{mul, one, pow};
use crate::units::{Amount, Rate};

/// per-era growth multiplier `SCALE + rate`
fn growth_base(rate: Rate) -> Result<U256> {
    one()
        .checked_add(U256::from(rate.as_scaled()))
        .ok_or(LedgerError::Overflow { operation: "growth_base" })
}

/// scaled growth factor `(1 + rate)^exp`, truncated after every step
pub fn growth_factor(rate: Rate, exp: u64) -> Result<U256> {
    pow(growth_base(rate)?, exp)
}

/// compound `base` over `exponent` eras, truncating after every era
///
/// the result is not `base * growth_factor(rate, exponent)`: rounding happens on the
/// running balance each era, which is what any settlement counterpart reproduces.
pub fn compound(base: Amount, rate: Rate, exponent: u64) -> Result<Amount> {
    let factor = growth_base(rate)?;
    let mut acc = base.as_units();
    for _ in 0..exponent {
        acc = mul(acc, factor)?;
    }
    Ok(Amount::from_raw(acc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_factor() {
        let rate = Rate::from_bps(100);
        assert_eq!(growth_factor(rate, 0).unwrap(), one());
        assert_eq!(growth_factor(rate, 1).unwrap(), U256::from(1_010_000u64));
        assert_eq!(growth_factor(rate, 3).unwrap(), U256::from(1_030_301u64));
    }

    #[test]
    fn test_compound_truncates_each_era() {
        let rate = Rate::from_bps(100);

        assert_eq!(compound(Amount::from_units(100), rate, 1).unwrap(), Amount::from_units(101));
        // 102.01 is truncated to 102 before the next era
        assert_eq!(compound(Amount::from_units(100), rate, 2).unwrap(), Amount::from_units(102));
        assert_eq!(compound(Amount::from_units(100), rate, 3).unwrap(), Amount::from_units(103));
    }

    #[test]
    fn test_compound_zero_rate() {
        let base = Amount::from_units(12_345);
        assert_eq!(compound(base, Rate::ZERO, 50).unwrap(), base);
    }

    #[test]
    fn test_compound_large_principal() {
        // 1e36 doubling each era passes u128::MAX in the ninth era
        let principal = Amount::from_whole(1, 36).unwrap();
        let doubled = compound(principal, Rate::ONE, 10).unwrap();
        assert_eq!(doubled, Amount::from_whole(1024, 36).unwrap());
        assert_eq!(doubled.to_u128(), None);
    }

    #[test]
    fn test_compound_overflow() {
        assert!(compound(Amount::MAX, Rate::from_bps(100), 1).is_err());
    }
}
