use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// shared handle to a ledger component
///
/// readers run concurrently; every mutation goes through the single write lock,
/// so two writes against the same component never interleave.
#[derive(Debug, Default)]
pub struct Shared<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    /// run `f` under the read lock
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.read())
    }

    /// run `f` under the write lock
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.write())
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::errors::LedgerError;
    use crate::loans::LoanLedger;
    use crate::types::Party;
    use crate::units::{Amount, Rate};
    use std::thread;

    #[test]
    fn test_concurrent_payments_serialize() {
        let config = LedgerConfig::new(Party::generate());
        let ledger = Shared::new(LoanLedger::new(&config));
        let loan_id = ledger
            .update(|l| l.create_loan(100, 1, Rate::ZERO, 0, Amount::from_units(1_000), Amount::ZERO))
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || {
                    for _ in 0..5 {
                        ledger
                            .update(|l| l.pay_next(loan_id, Amount::from_units(10)))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let loan = ledger.with(|l| l.loan(loan_id).cloned()).unwrap();
        assert_eq!(loan.last_payed_era, 40);
        assert_eq!(loan.outstanding, Amount::from_units(600));
    }

    #[test]
    fn test_only_one_close_wins() {
        let config = LedgerConfig::new(Party::generate());
        let ledger = Shared::new(LoanLedger::new(&config));
        let loan_id = ledger
            .update(|l| l.create_loan(10, 1, Rate::ZERO, 0, Amount::from_units(5), Amount::ZERO))
            .unwrap();
        ledger
            .update(|l| l.pay_next(loan_id, Amount::from_units(5)))
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = ledger.clone();
                thread::spawn(move || ledger.update(|l| l.try_close(loan_id)))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::NotOpen { .. })));
    }
}
