use hourglass_rs::{SafeTimeProvider, TimeSource};
use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::interest::{AccrualEngine, EraAccrual};
use crate::loans::loan::{Loan, LoanSnapshot};
use crate::loans::terms::{to_timestamp, LoanTerms};
use crate::loans::view::LoanView;
use crate::types::{LoanId, LoanStatus, Timestamp};
use crate::units::{Amount, Rate};

/// append-only ledger of loans accruing interest per era
pub struct LoanLedger {
    era_unit_secs: u64,
    loans: Vec<Loan>,
    pub events: EventStore,
    snapshots: Vec<LoanSnapshot>,
}

impl LoanLedger {
    pub fn new(config: &LedgerConfig) -> Self {
        Self::with_era_unit(config.era_unit_secs)
    }

    pub fn with_era_unit(era_unit_secs: u64) -> Self {
        Self {
            era_unit_secs,
            loans: Vec::new(),
            events: EventStore::new(),
            snapshots: Vec::new(),
        }
    }

    pub fn era_unit_secs(&self) -> u64 {
        self.era_unit_secs
    }

    /// create an open loan
    pub fn create_loan(
        &mut self,
        duration: u64,
        era_duration: u64,
        interest_rate: Rate,
        start_time: Timestamp,
        principal: Amount,
        min_payment: Amount,
    ) -> Result<LoanId> {
        self.open(&LoanTerms {
            duration,
            era_duration,
            interest_rate,
            start_time,
            principal,
            min_payment,
        })
    }

    /// create an open loan from terms
    pub fn open(&mut self, terms: &LoanTerms) -> Result<LoanId> {
        terms.validate()?;

        let loan_id = self.loans.len() as LoanId;
        let loan = Loan {
            status: LoanStatus::Open,
            duration: terms.duration,
            era_duration: terms.era_duration,
            interest_rate: terms.interest_rate,
            start_time: terms.start_time,
            outstanding: terms.principal,
            min_payment: terms.min_payment,
            last_payed_era: 0,
        };

        self.events.emit(Event::LoanCreated {
            loan_id,
            principal: terms.principal,
            interest_rate: terms.interest_rate,
            duration: terms.duration,
            era_duration: terms.era_duration,
            start_time: terms.start_time,
            min_payment: terms.min_payment,
        });
        info!(loan_id, principal = %terms.principal, rate = %terms.interest_rate, "loan created");

        self.snapshots.push(LoanSnapshot::capture(loan_id, &loan, "creation".to_string()));
        self.loans.push(loan);

        Ok(loan_id)
    }

    /// full loan record
    pub fn loan(&self, loan_id: LoanId) -> Result<&Loan> {
        usize::try_from(loan_id)
            .ok()
            .and_then(|index| self.loans.get(index))
            .ok_or(LedgerError::UnknownLoan { loan_id })
    }

    pub fn min_payment(&self, loan_id: LoanId) -> Result<Amount> {
        Ok(self.loan(loan_id)?.min_payment)
    }

    pub fn total_loans(&self) -> u64 {
        self.loans.len() as u64
    }

    /// whole eras elapsed since the loan start at `now`
    pub fn current_era(&self, loan_id: LoanId, now: Timestamp) -> Result<u64> {
        Ok(self.loan(loan_id)?.current_era(now, self.era_unit_secs))
    }

    pub fn current_era_at(&self, loan_id: LoanId, time_provider: &SafeTimeProvider) -> Result<u64> {
        self.current_era(loan_id, to_timestamp(time_provider.now()))
    }

    pub fn current_era_now(&self, loan_id: LoanId) -> Result<u64> {
        self.current_era_at(loan_id, &SafeTimeProvider::new(TimeSource::System))
    }

    /// reduce principal inside an already accrued era, without interest or minimum
    pub fn pay_current(&mut self, loan_id: LoanId, payment: Amount, now: Timestamp) -> Result<Amount> {
        let loan = self.open_loan(loan_id)?;

        let era = loan.current_era(now, self.era_unit_secs);
        if loan.last_payed_era == 0 || era == loan.last_payed_era {
            return Err(LedgerError::NoCurrentEra { loan_id });
        }

        let outstanding = loan
            .outstanding
            .checked_sub(payment)
            .ok_or(LedgerError::PaymentExceedsBalance {
                balance: loan.outstanding,
                payment,
            })?;
        let last_payed_era = loan.last_payed_era;

        let loan = self.loan_mut(loan_id)?;
        loan.outstanding = outstanding;

        self.events.emit(Event::PrincipalPaid {
            loan_id,
            era: last_payed_era,
            payment,
            outstanding,
        });
        debug!(loan_id, %payment, %outstanding, "principal paid within current era");
        self.capture(loan_id, format!("pay current: {}", payment))?;

        Ok(outstanding)
    }

    pub fn pay_current_at(
        &mut self,
        loan_id: LoanId,
        payment: Amount,
        time_provider: &SafeTimeProvider,
    ) -> Result<Amount> {
        self.pay_current(loan_id, payment, to_timestamp(time_provider.now()))
    }

    pub fn pay_current_now(&mut self, loan_id: LoanId, payment: Amount) -> Result<Amount> {
        self.pay_current_at(loan_id, payment, &SafeTimeProvider::new(TimeSource::System))
    }

    /// accrue exactly one era, applying the payment after interest
    pub fn pay_next(&mut self, loan_id: LoanId, payment: Amount) -> Result<EraAccrual> {
        let loan = self.open_loan(loan_id)?;

        if payment < loan.min_payment {
            return Err(LedgerError::PaymentBelowMinimum {
                minimum: loan.min_payment,
                provided: payment,
            });
        }

        let accruals = AccrualEngine::new(loan.interest_rate).accrue_eras(
            loan.outstanding,
            loan.last_payed_era,
            1,
            payment,
            payment,
        )?;
        self.commit_accruals(loan_id, &accruals, format!("pay next: {}", payment))?;

        accruals
            .into_iter()
            .next()
            .ok_or(LedgerError::Overflow { operation: "pay_next" })
    }

    /// accrue `eras` eras; the excess over the later minimums is paid in the first era
    ///
    /// returns at most two records: the first era, then one covering every later era.
    pub fn pay_down(&mut self, loan_id: LoanId, total_payment: Amount, eras: u64) -> Result<Vec<EraAccrual>> {
        let loan = self.open_loan(loan_id)?;

        if eras == 0 {
            return Err(LedgerError::NoEras);
        }

        // a minimum too large to represent is more than any payment can cover
        match loan.min_payment.checked_mul(eras) {
            Some(minimum_total) if total_payment >= minimum_total => {}
            minimum_total => {
                return Err(LedgerError::TotalPaymentBelowMinimum {
                    minimum: minimum_total.unwrap_or(Amount::MAX),
                    provided: total_payment,
                });
            }
        }

        // the total covers every later minimum, so the first payment cannot underflow
        let later_minimums = loan
            .min_payment
            .checked_mul(eras - 1)
            .ok_or(LedgerError::Overflow { operation: "pay_down" })?;
        let first_payment = total_payment
            .checked_sub(later_minimums)
            .ok_or(LedgerError::Overflow { operation: "pay_down" })?;

        let accruals = AccrualEngine::new(loan.interest_rate).accrue_eras(
            loan.outstanding,
            loan.last_payed_era,
            eras,
            first_payment,
            loan.min_payment,
        )?;
        self.commit_accruals(
            loan_id,
            &accruals,
            format!("pay down: {} over {} eras", total_payment, eras),
        )?;

        Ok(accruals)
    }

    /// close a fully repaid loan
    pub fn try_close(&mut self, loan_id: LoanId) -> Result<()> {
        let loan = self.open_loan(loan_id)?;

        if !loan.outstanding.is_zero() {
            return Err(LedgerError::NotPayedOff {
                loan_id,
                outstanding: loan.outstanding,
            });
        }

        self.transition(loan_id, LoanStatus::PayedOff, "payed off".to_string())
    }

    /// default a loan that is behind schedule or past maturity
    pub fn try_default(&mut self, loan_id: LoanId, now: Timestamp) -> Result<()> {
        let loan = self.open_loan(loan_id)?;

        if loan.outstanding.is_zero() {
            return Err(LedgerError::AlreadyPayedOff { loan_id });
        }

        let behind = loan.current_era(now, self.era_unit_secs) > loan.last_payed_era;
        let matured = loan.is_matured(now, self.era_unit_secs);
        if !behind && !matured {
            return Err(LedgerError::NothingPastDue { loan_id });
        }

        let reason = if behind {
            format!("{} eras behind", loan.eras_behind(now, self.era_unit_secs))
        } else {
            "past maturity".to_string()
        };
        self.transition(loan_id, LoanStatus::Defaulted, reason)
    }

    pub fn try_default_at(&mut self, loan_id: LoanId, time_provider: &SafeTimeProvider) -> Result<()> {
        self.try_default(loan_id, to_timestamp(time_provider.now()))
    }

    /// try to default with system time
    pub fn try_default_now(&mut self, loan_id: LoanId) -> Result<()> {
        self.try_default_at(loan_id, &SafeTimeProvider::new(TimeSource::System))
    }

    /// default an open loan unconditionally
    pub fn set_defaulted(&mut self, loan_id: LoanId) -> Result<()> {
        self.open_loan(loan_id)?;
        self.transition(loan_id, LoanStatus::Defaulted, "set by controller".to_string())
    }

    /// serializable read model of a loan at `now`
    pub fn view(&self, loan_id: LoanId, now: Timestamp) -> Result<LoanView> {
        Ok(LoanView::from_loan(loan_id, self.loan(loan_id)?, self.era_unit_secs, now))
    }

    pub fn snapshots(&self) -> &[LoanSnapshot] {
        &self.snapshots
    }

    pub fn snapshots_of(&self, loan_id: LoanId) -> impl Iterator<Item = &LoanSnapshot> {
        self.snapshots.iter().filter(move |s| s.loan_id == loan_id)
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// copy of an open loan for validation before anything is written
    fn open_loan(&self, loan_id: LoanId) -> Result<Loan> {
        let loan = self.loan(loan_id)?;
        if !loan.is_open() {
            return Err(LedgerError::NotOpen {
                loan_id,
                status: loan.status,
            });
        }
        Ok(loan.clone())
    }

    fn loan_mut(&mut self, loan_id: LoanId) -> Result<&mut Loan> {
        usize::try_from(loan_id)
            .ok()
            .and_then(|index| self.loans.get_mut(index))
            .ok_or(LedgerError::UnknownLoan { loan_id })
    }

    fn commit_accruals(&mut self, loan_id: LoanId, accruals: &[EraAccrual], trigger: String) -> Result<()> {
        let last = match accruals.last() {
            Some(last) => *last,
            None => return Ok(()),
        };

        let loan = self.loan_mut(loan_id)?;
        loan.outstanding = last.closing;
        loan.last_payed_era = last.last_era;

        for accrual in accruals {
            self.events.emit(Event::EraAccrued {
                loan_id,
                first_era: accrual.first_era,
                last_era: accrual.last_era,
                interest: accrual.interest,
                payment: accrual.payment,
                outstanding: accrual.closing,
            });
        }
        debug!(
            loan_id,
            first_era = accruals[0].first_era,
            last_payed_era = last.last_era,
            outstanding = %last.closing,
            "eras accrued"
        );

        self.capture(loan_id, trigger)
    }

    fn transition(&mut self, loan_id: LoanId, new_status: LoanStatus, reason: String) -> Result<()> {
        let loan = self.loan_mut(loan_id)?;
        let old_status = loan.status;
        loan.status = new_status;

        info!(loan_id, ?old_status, ?new_status, %reason, "loan status changed");
        self.events.emit(Event::LoanStatusChanged {
            loan_id,
            old_status,
            new_status,
            reason: reason.clone(),
        });

        self.capture(loan_id, reason)
    }

    fn capture(&mut self, loan_id: LoanId, trigger: String) -> Result<()> {
        let snapshot = LoanSnapshot::capture(loan_id, self.loan(loan_id)?, trigger);
        self.snapshots.push(snapshot);
        Ok(())
    }
}
