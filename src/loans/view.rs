/// serialization support for loans
use serde::{Deserialize, Serialize};

use crate::loans::loan::Loan;
use crate::types::{LoanId, LoanStatus, Timestamp};
use crate::units::{Amount, Rate};

/// serializable view of a loan at a point in time
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub status: LoanStatus,
    pub balance: BalanceView,
    pub schedule: ScheduleView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceView {
    pub outstanding: Amount,
    pub min_payment: Amount,
    pub interest_rate: Rate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub start_time: Timestamp,
    pub era_duration: u64,
    pub duration: u64,
    pub era_length_secs: u128,
    pub maturity: Option<Timestamp>,
    pub observed_at: Timestamp,
    pub current_era: u64,
    pub last_payed_era: u64,
    pub eras_behind: u64,
    pub is_matured: bool,
}

impl LoanView {
    pub fn from_loan(id: LoanId, loan: &Loan, era_unit_secs: u64, now: Timestamp) -> Self {
        LoanView {
            id,
            status: loan.status,
            balance: BalanceView {
                outstanding: loan.outstanding,
                min_payment: loan.min_payment,
                interest_rate: loan.interest_rate,
            },
            schedule: ScheduleView {
                start_time: loan.start_time,
                era_duration: loan.era_duration,
                duration: loan.duration,
                era_length_secs: loan.era_length(era_unit_secs),
                maturity: loan.maturity(era_unit_secs),
                observed_at: now,
                current_era: loan.current_era(now, era_unit_secs),
                last_payed_era: loan.last_payed_era,
                eras_behind: loan.eras_behind(now, era_unit_secs),
                is_matured: loan.is_matured(now, era_unit_secs),
            },
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
