use std::collections::{BTreeSet, HashMap, HashSet};

use crate::errors::{LedgerError, Result};
use crate::types::{Party, RightsTokenId};

/// token ownership with per-token and operator approvals
#[derive(Debug, Default)]
pub struct OwnershipTable {
    owners: HashMap<RightsTokenId, Party>,
    tokens: HashMap<Party, BTreeSet<RightsTokenId>>,
    token_approvals: HashMap<RightsTokenId, Party>,
    operator_approvals: HashMap<Party, HashSet<Party>>,
}

impl OwnershipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, token_id: RightsTokenId) -> bool {
        self.owners.contains_key(&token_id)
    }

    pub fn owner_of(&self, token_id: RightsTokenId) -> Result<Party> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(LedgerError::NonexistentToken { token_id })
    }

    pub fn balance_of(&self, owner: Party) -> u64 {
        self.tokens.get(&owner).map(|set| set.len() as u64).unwrap_or(0)
    }

    /// tokens owned by `owner`, ascending
    pub fn tokens_of(&self, owner: Party) -> Vec<RightsTokenId> {
        self.tokens
            .get(&owner)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// number of live tokens
    pub fn total_supply(&self) -> u64 {
        self.owners.len() as u64
    }

    pub fn mint(&mut self, token_id: RightsTokenId, to: Party) -> Result<()> {
        if to.is_none() {
            return Err(LedgerError::InvalidRecipient { recipient: to });
        }
        if let Some(owner) = self.owners.get(&token_id) {
            return Err(LedgerError::WrongOwner { token_id, from: *owner });
        }

        self.owners.insert(token_id, to);
        self.tokens.entry(to).or_default().insert(token_id);
        Ok(())
    }

    /// remove the token, returning its last owner
    pub fn burn(&mut self, token_id: RightsTokenId) -> Result<Party> {
        let owner = self
            .owners
            .remove(&token_id)
            .ok_or(LedgerError::NonexistentToken { token_id })?;

        self.unlink(owner, token_id);
        self.token_approvals.remove(&token_id);
        Ok(owner)
    }

    /// move a token from `from` to `to`, clearing its approval
    pub fn transfer(&mut self, token_id: RightsTokenId, from: Party, to: Party) -> Result<()> {
        let owner = self.owner_of(token_id)?;
        if owner != from {
            return Err(LedgerError::WrongOwner { token_id, from });
        }
        if to.is_none() {
            return Err(LedgerError::InvalidRecipient { recipient: to });
        }

        self.token_approvals.remove(&token_id);
        self.unlink(from, token_id);
        self.owners.insert(token_id, to);
        self.tokens.entry(to).or_default().insert(token_id);
        Ok(())
    }

    pub fn approve(&mut self, token_id: RightsTokenId, spender: Party) -> Result<()> {
        self.owner_of(token_id)?;

        if spender.is_none() {
            self.token_approvals.remove(&token_id);
        } else {
            self.token_approvals.insert(token_id, spender);
        }
        Ok(())
    }

    /// approved spender of the token, `Party::NONE` if there is none
    pub fn get_approved(&self, token_id: RightsTokenId) -> Result<Party> {
        self.owner_of(token_id)?;
        Ok(self
            .token_approvals
            .get(&token_id)
            .copied()
            .unwrap_or(Party::NONE))
    }

    pub fn set_operator(&mut self, owner: Party, operator: Party, approved: bool) {
        if approved {
            self.operator_approvals.entry(owner).or_default().insert(operator);
        } else if let Some(operators) = self.operator_approvals.get_mut(&owner) {
            operators.remove(&operator);
            if operators.is_empty() {
                self.operator_approvals.remove(&owner);
            }
        }
    }

    pub fn is_operator(&self, owner: Party, operator: Party) -> bool {
        self.operator_approvals
            .get(&owner)
            .map(|operators| operators.contains(&operator))
            .unwrap_or(false)
    }

    /// `spender` owns the token, is approved for it, or operates for its owner
    pub fn is_approved_or_owner(&self, spender: Party, token_id: RightsTokenId) -> Result<bool> {
        let owner = self.owner_of(token_id)?;

        Ok(spender == owner
            || self.token_approvals.get(&token_id) == Some(&spender)
            || self.is_operator(owner, spender))
    }

    fn unlink(&mut self, owner: Party, token_id: RightsTokenId) {
        if let Some(set) = self.tokens.get_mut(&owner) {
            set.remove(&token_id);
            if set.is_empty() {
                self.tokens.remove(&owner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_and_burn() {
        let mut table = OwnershipTable::new();
        let alice = Party::generate();

        table.mint(0, alice).unwrap();
        table.mint(2, alice).unwrap();
        assert_eq!(table.owner_of(0).unwrap(), alice);
        assert_eq!(table.tokens_of(alice), vec![0, 2]);
        assert!(table.mint(0, Party::generate()).is_err());

        assert_eq!(table.burn(0).unwrap(), alice);
        assert_eq!(table.owner_of(0), Err(LedgerError::NonexistentToken { token_id: 0 }));
        assert_eq!(table.balance_of(alice), 1);
        assert_eq!(table.total_supply(), 1);
        assert!(table.burn(0).is_err());
    }

    #[test]
    fn test_transfer_updates_both_sides() {
        let mut table = OwnershipTable::new();
        let alice = Party::generate();
        let bob = Party::generate();
        table.mint(5, alice).unwrap();

        assert_eq!(
            table.transfer(5, bob, alice),
            Err(LedgerError::WrongOwner { token_id: 5, from: bob })
        );

        table.transfer(5, alice, bob).unwrap();
        assert_eq!(table.owner_of(5).unwrap(), bob);
        assert_eq!(table.balance_of(alice), 0);
        assert_eq!(table.tokens_of(bob), vec![5]);
    }

    #[test]
    fn test_approvals() {
        let mut table = OwnershipTable::new();
        let alice = Party::generate();
        let bob = Party::generate();
        let carol = Party::generate();
        table.mint(1, alice).unwrap();

        assert!(!table.is_approved_or_owner(bob, 1).unwrap());

        table.approve(1, bob).unwrap();
        assert_eq!(table.get_approved(1).unwrap(), bob);
        assert!(table.is_approved_or_owner(bob, 1).unwrap());

        // a transfer clears the token approval
        table.transfer(1, alice, carol).unwrap();
        assert_eq!(table.get_approved(1).unwrap(), Party::NONE);
        assert!(!table.is_approved_or_owner(bob, 1).unwrap());

        table.set_operator(carol, bob, true);
        assert!(table.is_approved_or_owner(bob, 1).unwrap());
        table.set_operator(carol, bob, false);
        assert!(!table.is_operator(carol, bob));

        assert!(table.is_approved_or_owner(bob, 9).is_err());
    }
}
