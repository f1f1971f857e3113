use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{LedgerConfig, PaymentsConfig};
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::payments::bank::TokenBank;
use crate::types::Party;
use crate::units::Amount;

/// tracks token amounts promised to parties out of the balance held by `holder`
///
/// `stored_balance_of(token)` is always the sum of every party's pending balance
/// of that token; anything the holder owns beyond it is available.
pub struct PaymentsManager {
    holder: Party,
    enforce_available: bool,
    bank: Arc<dyn TokenBank>,
    stored: HashMap<Party, Amount>,
    pending: HashMap<(Party, Party), Amount>,
    pub events: EventStore,
}

impl PaymentsManager {
    pub fn new(config: &LedgerConfig, bank: Arc<dyn TokenBank>) -> Self {
        Self::with_config(&config.payments, bank)
    }

    pub fn with_config(config: &PaymentsConfig, bank: Arc<dyn TokenBank>) -> Self {
        Self {
            holder: config.holder,
            enforce_available: config.enforce_available,
            bank,
            stored: HashMap::new(),
            pending: HashMap::new(),
            events: EventStore::new(),
        }
    }

    /// identity that holds the received tokens
    pub fn holder(&self) -> Party {
        self.holder
    }

    /// actual balance minus everything already promised
    pub fn get_available(&self, token: Party) -> Amount {
        let actual = self.bank.balance_of(token, self.holder);
        let stored = self.stored_balance_of(token);

        match actual.checked_sub(stored) {
            Some(available) => available,
            None => {
                warn!(%token, %actual, %stored, "promised more than held, available saturated at zero");
                Amount::ZERO
            }
        }
    }

    pub fn stored_balance_of(&self, token: Party) -> Amount {
        self.stored.get(&token).copied().unwrap_or(Amount::ZERO)
    }

    pub fn pending_balance_of(&self, token: Party, party: Party) -> Amount {
        self.pending.get(&(token, party)).copied().unwrap_or(Amount::ZERO)
    }

    /// promise `amount` of the available balance to `party`
    pub fn assign_available_to(&mut self, token: Party, amount: Amount, party: Party) -> Result<()> {
        if party.is_none() {
            return Err(LedgerError::InvalidRecipient { recipient: party });
        }
        if self.enforce_available {
            let available = self.get_available(token);
            if amount > available {
                return Err(LedgerError::InsufficientAvailable {
                    token,
                    available,
                    requested: amount,
                });
            }
        }

        let stored = self
            .stored_balance_of(token)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { operation: "assign_available_to" })?;
        let pending = self
            .pending_balance_of(token, party)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { operation: "assign_available_to" })?;

        self.stored.insert(token, stored);
        self.pending.insert((token, party), pending);

        self.events.emit(Event::BalanceAssigned { token, party, amount });
        debug!(%token, %party, %amount, %stored, "balance assigned");
        Ok(())
    }

    /// pay out `amount` of the balance pending for `party`
    pub fn release_pending_balance(&mut self, token: Party, party: Party, amount: Amount) -> Result<()> {
        let pending_before = self.pending_balance_of(token, party);
        let pending = pending_before
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientPending {
                token,
                pending: pending_before,
                requested: amount,
            })?;
        // pending is part of stored, so this cannot underflow while the tables agree
        let stored = self
            .stored_balance_of(token)
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow { operation: "release_pending_balance" })?;

        self.bank.transfer(token, self.holder, party, amount)?;

        self.stored.insert(token, stored);
        if pending.is_zero() {
            self.pending.remove(&(token, party));
        } else {
            self.pending.insert((token, party), pending);
        }

        self.events.emit(Event::PendingReleased { token, party, amount });
        info!(%token, %party, %amount, "pending balance released");
        Ok(())
    }

    /// send `amount` of the unpromised balance to `recipient`
    pub fn skim_to(&mut self, token: Party, amount: Amount, recipient: Party) -> Result<()> {
        let available = self.get_available(token);
        if amount > available {
            return Err(LedgerError::InsufficientAvailable {
                token,
                available,
                requested: amount,
            });
        }

        self.bank.transfer(token, self.holder, recipient, amount)?;

        self.events.emit(Event::Skimmed { token, recipient, amount });
        info!(%token, %recipient, %amount, "available balance skimmed");
        Ok(())
    }

    /// send the whole unpromised balance to `recipient`, returning the amount sent
    pub fn skim_all_to(&mut self, token: Party, recipient: Party) -> Result<Amount> {
        let available = self.get_available(token);
        self.skim_to(token, available, recipient)?;
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::bank::InMemoryTokenBank;
    use proptest::prelude::*;

    struct Fixture {
        bank: Arc<InMemoryTokenBank>,
        manager: PaymentsManager,
        token: Party,
    }

    fn fixture(enforce_available: bool, funded: u128) -> Fixture {
        let bank = Arc::new(InMemoryTokenBank::new());
        let holder = Party::generate();
        let token = Party::generate();
        bank.mint(token, holder, Amount::from_units(funded)).unwrap();

        let config = PaymentsConfig {
            holder,
            enforce_available,
        };
        let manager = PaymentsManager::with_config(&config, bank.clone());
        Fixture { bank, manager, token }
    }

    #[test]
    fn test_assign_and_release() {
        let Fixture { bank, mut manager, token } = fixture(false, 1_000);
        let alice = Party::generate();

        assert_eq!(manager.get_available(token), Amount::from_units(1_000));

        manager.assign_available_to(token, Amount::from_units(300), alice).unwrap();
        assert_eq!(manager.get_available(token), Amount::from_units(700));
        assert_eq!(manager.stored_balance_of(token), Amount::from_units(300));
        assert_eq!(manager.pending_balance_of(token, alice), Amount::from_units(300));

        manager.release_pending_balance(token, alice, Amount::from_units(120)).unwrap();
        assert_eq!(bank.balance_of(token, alice), Amount::from_units(120));
        assert_eq!(manager.pending_balance_of(token, alice), Amount::from_units(180));
        assert_eq!(manager.stored_balance_of(token), Amount::from_units(180));
        assert_eq!(manager.get_available(token), Amount::from_units(700));
    }

    #[test]
    fn test_release_more_than_pending() {
        let Fixture { bank, mut manager, token } = fixture(false, 1_000);
        let alice = Party::generate();
        let bob = Party::generate();
        manager.assign_available_to(token, Amount::from_units(50), alice).unwrap();
        manager.assign_available_to(token, Amount::from_units(50), bob).unwrap();

        let result = manager.release_pending_balance(token, alice, Amount::from_units(51));
        assert!(matches!(result, Err(LedgerError::InsufficientPending { .. })));
        assert_eq!(manager.pending_balance_of(token, alice), Amount::from_units(50));
        assert_eq!(manager.stored_balance_of(token), Amount::from_units(100));
        assert_eq!(bank.balance_of(token, alice), Amount::ZERO);
    }

    #[test]
    fn test_skim_only_touches_available() {
        let Fixture { bank, mut manager, token } = fixture(false, 1_000);
        let alice = Party::generate();
        let treasury = Party::generate();
        manager.assign_available_to(token, Amount::from_units(400), alice).unwrap();

        let result = manager.skim_to(token, Amount::from_units(601), treasury);
        assert!(matches!(result, Err(LedgerError::InsufficientAvailable { .. })));

        manager.skim_to(token, Amount::from_units(100), treasury).unwrap();
        assert_eq!(manager.get_available(token), Amount::from_units(500));

        let skimmed = manager.skim_all_to(token, treasury).unwrap();
        assert_eq!(skimmed, Amount::from_units(500));
        assert_eq!(bank.balance_of(token, treasury), Amount::from_units(600));
        assert_eq!(manager.get_available(token), Amount::ZERO);

        // promised funds are still there for alice
        manager.release_pending_balance(token, alice, Amount::from_units(400)).unwrap();
        assert_eq!(bank.balance_of(token, alice), Amount::from_units(400));
    }

    #[test]
    fn test_unchecked_assignment_saturates_available() {
        let Fixture { mut manager, token, .. } = fixture(false, 100);
        let alice = Party::generate();

        manager.assign_available_to(token, Amount::from_units(150), alice).unwrap();
        assert_eq!(manager.get_available(token), Amount::ZERO);
        assert_eq!(manager.stored_balance_of(token), Amount::from_units(150));
    }

    #[test]
    fn test_enforced_assignment() {
        let Fixture { mut manager, token, .. } = fixture(true, 100);
        let alice = Party::generate();

        let err = manager
            .assign_available_to(token, Amount::from_units(101), alice)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAvailable { .. }));
        assert_eq!(manager.stored_balance_of(token), Amount::ZERO);

        manager.assign_available_to(token, Amount::from_units(100), alice).unwrap();
        assert_eq!(manager.get_available(token), Amount::ZERO);
    }

    #[test]
    fn test_assign_to_nil_party() {
        for enforce_available in [false, true] {
            let Fixture { mut manager, token, .. } = fixture(enforce_available, 100);

            assert_eq!(
                manager.assign_available_to(token, Amount::from_units(10), Party::NONE),
                Err(LedgerError::InvalidRecipient { recipient: Party::NONE })
            );
            assert_eq!(manager.stored_balance_of(token), Amount::ZERO);
            assert_eq!(manager.pending_balance_of(token, Party::NONE), Amount::ZERO);
            assert_eq!(manager.get_available(token), Amount::from_units(100));
            assert!(manager.events.events().is_empty());
        }
    }

    #[test]
    fn test_events() {
        let Fixture { mut manager, token, .. } = fixture(false, 10);
        let alice = Party::generate();
        manager.assign_available_to(token, Amount::from_units(4), alice).unwrap();
        manager.release_pending_balance(token, alice, Amount::from_units(4)).unwrap();
        manager.skim_all_to(token, alice).unwrap();

        let events = manager.events.take_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Event::BalanceAssigned { .. }));
        assert!(matches!(events[1], Event::PendingReleased { .. }));
        assert_eq!(
            events[2],
            Event::Skimmed { token, recipient: alice, amount: Amount::from_units(6) }
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Assign(usize, u128),
        Release(usize, u128),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4, 0u128..500).prop_map(|(p, a)| Op::Assign(p, a)),
            (0usize..4, 0u128..500).prop_map(|(p, a)| Op::Release(p, a)),
        ]
    }

    proptest! {
        #[test]
        fn pending_balances_sum_to_stored(ops in prop::collection::vec(op(), 0..40)) {
            let Fixture { mut manager, token, .. } = fixture(true, 5_000);
            let parties: Vec<Party> = (0..4).map(|_| Party::generate()).collect();

            for op in ops {
                // failures are fine, they must leave the tables consistent
                let _ = match op {
                    Op::Assign(p, a) => manager.assign_available_to(token, Amount::from_units(a), parties[p]),
                    Op::Release(p, a) => manager.release_pending_balance(token, parties[p], Amount::from_units(a)),
                };

                let sum = parties
                    .iter()
                    .fold(Amount::ZERO, |sum, p| sum.saturating_add(manager.pending_balance_of(token, *p)));
                prop_assert_eq!(sum, manager.stored_balance_of(token));
            }
        }
    }
}
