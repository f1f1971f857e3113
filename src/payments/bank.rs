use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

use crate::errors::{LedgerError, Result};
use crate::types::Party;
use crate::units::Amount;

/// fungible token balances, keyed by token contract and holder
pub trait TokenBank: Send + Sync {
    /// balance of `holder` in `token`
    fn balance_of(&self, token: Party, holder: Party) -> Amount;

    /// move `amount` of `token` from `from` to `to`
    fn transfer(&self, token: Party, from: Party, to: Party, amount: Amount) -> Result<()>;
}

/// token bank kept in memory
#[derive(Debug, Default)]
pub struct InMemoryTokenBank {
    balances: RwLock<HashMap<(Party, Party), Amount>>,
}

impl InMemoryTokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// create `amount` new tokens owned by `to`
    pub fn mint(&self, token: Party, to: Party, amount: Amount) -> Result<()> {
        let mut balances = self.balances.write();
        let balance = balances.entry((token, to)).or_insert(Amount::ZERO);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { operation: "mint" })?;

        debug!(%token, %to, %amount, "tokens minted");
        Ok(())
    }

    /// sum of all balances of `token`
    pub fn total_supply(&self, token: Party) -> Amount {
        self.balances
            .read()
            .iter()
            .filter(|((t, _), _)| *t == token)
            .fold(Amount::ZERO, |total, (_, balance)| total.saturating_add(*balance))
    }
}

impl TokenBank for InMemoryTokenBank {
    fn balance_of(&self, token: Party, holder: Party) -> Amount {
        self.balances
            .read()
            .get(&(token, holder))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn transfer(&self, token: Party, from: Party, to: Party, amount: Amount) -> Result<()> {
        if to.is_none() {
            return Err(LedgerError::InvalidRecipient { recipient: to });
        }

        let mut balances = self.balances.write();

        let balance = balances.get(&(token, from)).copied().unwrap_or(Amount::ZERO);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientTokenBalance {
                token,
                balance,
                requested: amount,
            })?;

        if from == to {
            return Ok(());
        }

        let received = balances
            .get(&(token, to))
            .copied()
            .unwrap_or(Amount::ZERO)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow { operation: "transfer" })?;

        balances.insert((token, from), remaining);
        balances.insert((token, to), received);

        debug!(%token, %from, %to, %amount, "tokens transferred");
        Ok(())
    }
}
