use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{LoanId, LoanStatus, Timestamp};
use crate::units::{Amount, Rate};

/// per-loan ledger record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Loan {
    pub status: LoanStatus,
    /// number of eras until maturity
    pub duration: u64,
    /// era units per era
    pub era_duration: u64,
    pub interest_rate: Rate,
    /// start of era 0
    pub start_time: Timestamp,
    pub outstanding: Amount,
    pub min_payment: Amount,
    pub last_payed_era: u64,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.status == LoanStatus::Open
    }

    /// length of one era in seconds
    pub fn era_length(&self, era_unit_secs: u64) -> u128 {
        self.era_duration as u128 * era_unit_secs as u128
    }

    /// number of whole eras elapsed at `now`; zero before the start
    pub fn current_era(&self, now: Timestamp, era_unit_secs: u64) -> u64 {
        let era_length = self.era_length(era_unit_secs);
        if now <= self.start_time || era_length == 0 {
            return 0;
        }

        let elapsed = (now - self.start_time) as u128;
        u64::try_from(elapsed / era_length).unwrap_or(u64::MAX)
    }

    /// timestamp at which the full duration has elapsed, `None` if beyond the clock range
    pub fn maturity(&self, era_unit_secs: u64) -> Option<Timestamp> {
        let term = self.era_length(era_unit_secs).checked_mul(self.duration as u128)?;
        let maturity = (self.start_time as u128).checked_add(term)?;
        u64::try_from(maturity).ok()
    }

    pub fn is_matured(&self, now: Timestamp, era_unit_secs: u64) -> bool {
        self.maturity(era_unit_secs)
            .map(|maturity| now >= maturity)
            .unwrap_or(false)
    }

    /// eras elapsed but not yet accrued
    pub fn eras_behind(&self, now: Timestamp, era_unit_secs: u64) -> u64 {
        self.current_era(now, era_unit_secs)
            .saturating_sub(self.last_payed_era)
    }
}

/// loan record captured after a mutation, for the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSnapshot {
    pub snapshot_id: Uuid,
    pub loan_id: LoanId,
    pub recorded_at: DateTime<Utc>,
    pub loan: Loan,
    pub trigger: String,
}

impl LoanSnapshot {
    pub fn capture(loan_id: LoanId, loan: &Loan, trigger: String) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            loan_id,
            recorded_at: Utc::now(),
            loan: loan.clone(),
            trigger,
        }
    }
}
