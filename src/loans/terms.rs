use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::types::Timestamp;
use crate::units::{Amount, Rate};

/// terms a loan is created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub duration: u64,
    pub era_duration: u64,
    pub interest_rate: Rate,
    pub start_time: Timestamp,
    pub principal: Amount,
    pub min_payment: Amount,
}

impl LoanTerms {
    pub fn builder() -> LoanTermsBuilder {
        LoanTermsBuilder::new()
    }

    /// era duration is checked before principal
    pub fn validate(&self) -> Result<()> {
        if self.era_duration == 0 {
            return Err(LedgerError::InvalidEraDuration);
        }

        if self.principal.is_zero() {
            return Err(LedgerError::NoPrincipal);
        }

        Ok(())
    }
}

/// convert a clock reading into a ledger timestamp, clamping pre-epoch times to zero
pub fn to_timestamp(time: DateTime<Utc>) -> Timestamp {
    u64::try_from(time.timestamp()).unwrap_or(0)
}

/// builder for loan terms
#[derive(Debug, Default)]
pub struct LoanTermsBuilder {
    duration: Option<u64>,
    era_duration: Option<u64>,
    interest_rate: Option<Rate>,
    interest_fraction: Option<Decimal>,
    start_time: Option<Timestamp>,
    principal: Option<Amount>,
    min_payment: Option<Amount>,
}

impl LoanTermsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, eras: u64) -> Self {
        self.duration = Some(eras);
        self
    }

    pub fn era_duration(mut self, units: u64) -> Self {
        self.era_duration = Some(units);
        self
    }

    pub fn interest_rate(mut self, rate: Rate) -> Self {
        self.interest_rate = Some(rate);
        self
    }

    /// per-era rate as a fraction, e.g. `dec!(0.01)`
    pub fn interest_fraction(mut self, fraction: Decimal) -> Self {
        self.interest_fraction = Some(fraction);
        self
    }

    pub fn start_time(mut self, start: Timestamp) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = Some(to_timestamp(start));
        self
    }

    pub fn principal(mut self, principal: Amount) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn min_payment(mut self, min_payment: Amount) -> Self {
        self.min_payment = Some(min_payment);
        self
    }

    /// build, starting at the system clock if no start was given
    pub fn build(self) -> Result<LoanTerms> {
        let time = SafeTimeProvider::new(hourglass_rs::TimeSource::System);
        self.build_with_time(&time)
    }

    /// build, starting at the provider's clock if no start was given
    pub fn build_with_time(self, time_provider: &SafeTimeProvider) -> Result<LoanTerms> {
        let duration = self.duration.ok_or(LedgerError::InvalidConfiguration {
            message: "Duration required".to_string(),
        })?;

        let interest_rate = match (self.interest_rate, self.interest_fraction) {
            (Some(rate), _) => rate,
            (None, Some(fraction)) => Rate::from_fraction(fraction)?,
            (None, None) => {
                return Err(LedgerError::InvalidConfiguration {
                    message: "Interest rate required".to_string(),
                });
            }
        };

        let principal = self.principal.ok_or(LedgerError::InvalidConfiguration {
            message: "Principal required".to_string(),
        })?;

        let terms = LoanTerms {
            duration,
            era_duration: self.era_duration.unwrap_or(1),
            interest_rate,
            start_time: self
                .start_time
                .unwrap_or_else(|| to_timestamp(time_provider.now())),
            principal,
            min_payment: self.min_payment.unwrap_or(Amount::ZERO),
        };

        terms.validate()?;
        Ok(terms)
    }
}
