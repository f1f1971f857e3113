use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::interest::fixed::mul;
use crate::units::{Amount, Rate};

/// interest earned by `amount` over one era, truncated
pub fn interest_on(amount: Amount, rate: Rate) -> Result<Amount> {
    mul(amount.as_units(), U256::from(rate.as_scaled())).map(Amount::from_raw)
}

/// accrue one era of interest, then subtract the payment
///
/// interest is always computed on the balance before the payment.
pub fn accrue_once(amount: Amount, rate: Rate, payment: Amount) -> Result<Amount> {
    let interest = interest_on(amount, rate)?;
    let accrued = amount
        .checked_add(interest)
        .ok_or(LedgerError::Overflow { operation: "accrue_once" })?;

    accrued
        .checked_sub(payment)
        .ok_or(LedgerError::PaymentExceedsBalance {
            balance: accrued,
            payment,
        })
}

/// accrue `repetitions` eras, subtracting the same payment after each one
pub fn accrue_many(amount: Amount, rate: Rate, repetitions: u64, payment: Amount) -> Result<Amount> {
    accrue_span(amount, rate, repetitions, payment).map(|(closing, _)| closing)
}

/// closing balance and total interest of `repetitions` eras paying `payment` each
///
/// a balance that stops moving stays put for the remaining eras, so only the eras up to
/// that point are stepped through.
fn accrue_span(amount: Amount, rate: Rate, repetitions: u64, payment: Amount) -> Result<(Amount, Amount)> {
    if rate.is_zero() {
        return drain(amount, repetitions, payment).map(|closing| (closing, Amount::ZERO));
    }

    let overflow = LedgerError::Overflow { operation: "accrue_many" };
    let mut balance = amount;
    let mut interest = Amount::ZERO;
    for done in 0..repetitions {
        let earned = interest_on(balance, rate)?;
        let next = accrue_once(balance, rate, payment)?;
        interest = interest.checked_add(earned).ok_or(overflow.clone())?;

        if next == balance {
            let rest = earned
                .checked_mul(repetitions - done - 1)
                .and_then(|rest| interest.checked_add(rest))
                .ok_or(overflow)?;
            return Ok((balance, rest));
        }
        balance = next;
    }
    Ok((balance, interest))
}

/// accrual without interest: every era only takes the payment off
fn drain(amount: Amount, repetitions: u64, payment: Amount) -> Result<Amount> {
    match payment
        .checked_mul(repetitions)
        .and_then(|total| amount.checked_sub(total))
    {
        Some(closing) => Ok(closing),
        // the era that fails is the first one whose balance is below the payment
        None => Err(LedgerError::PaymentExceedsBalance {
            balance: amount.checked_rem(payment).unwrap_or(amount),
            payment,
        }),
    }
}

/// accrual over a run of consecutive eras sharing one payment
///
/// `interest` is the total over the run; `payment` is what each era took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraAccrual {
    pub first_era: u64,
    pub last_era: u64,
    pub opening: Amount,
    pub interest: Amount,
    pub payment: Amount,
    pub closing: Amount,
}

impl EraAccrual {
    /// number of eras in the run
    pub fn eras(&self) -> u64 {
        self.last_era - self.first_era + 1
    }
}

/// engine for accruing interest era by era at a fixed rate
#[derive(Debug, Clone, Copy)]
pub struct AccrualEngine {
    pub rate: Rate,
}

impl AccrualEngine {
    pub fn new(rate: Rate) -> Self {
        Self { rate }
    }

    /// accrue a single era
    pub fn accrue_era(&self, era: u64, opening: Amount, payment: Amount) -> Result<EraAccrual> {
        let interest = interest_on(opening, self.rate)?;
        let closing = accrue_once(opening, self.rate, payment)?;

        Ok(EraAccrual {
            first_era: era,
            last_era: era,
            opening,
            interest,
            payment,
            closing,
        })
    }

    /// accrue `eras` consecutive eras following `last_era`
    ///
    /// the first era takes `first_payment` and gets its own record; every later era takes
    /// `payment` and they share a second record.
    pub fn accrue_eras(
        &self,
        opening: Amount,
        last_era: u64,
        eras: u64,
        first_payment: Amount,
        payment: Amount,
    ) -> Result<Vec<EraAccrual>> {
        if eras == 0 {
            return Ok(Vec::new());
        }

        let overflow = LedgerError::Overflow { operation: "accrue_eras" };
        let first_era = last_era.checked_add(1).ok_or(overflow.clone())?;
        let final_era = last_era.checked_add(eras).ok_or(overflow)?;

        let first = self.accrue_era(first_era, opening, first_payment)?;
        let mut accruals = vec![first];

        if eras > 1 {
            let (closing, interest) = accrue_span(first.closing, self.rate, eras - 1, payment)?;
            accruals.push(EraAccrual {
                first_era: first_era + 1,
                last_era: final_era,
                opening: first.closing,
                interest,
                payment,
                closing,
            });
        }

        Ok(accruals)
    }
}
