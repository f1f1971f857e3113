use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::assets::registrar::AssetRegistrar;
use crate::assets::registry::AssetRegistry;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::payments::bank::TokenBank;
use crate::types::{AssetId, Party};
use crate::units::Amount;

/// fungible tokens held in custody for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleDeposit {
    pub token: Party,
    pub amount: Amount,
}

/// registrar keeping fungible token deposits as collateral
pub struct FungiblePoolRegistrar {
    party: Party,
    registry: Party,
    bank: Arc<dyn TokenBank>,
    deposits: Mutex<HashMap<AssetId, FungibleDeposit>>,
    events: Mutex<EventStore>,
}

impl FungiblePoolRegistrar {
    /// registrar bound to `registry`
    pub fn new(party: Party, registry: &AssetRegistry, bank: Arc<dyn TokenBank>) -> Self {
        Self {
            party,
            registry: registry.identity(),
            bank,
            deposits: Mutex::new(HashMap::new()),
            events: Mutex::new(EventStore::new()),
        }
    }

    /// pull `amount` of `token` from `from` into custody and register it as a new asset;
    /// `caller` must be the holder of the funds
    pub fn deposit(
        self: &Arc<Self>,
        registry: &mut AssetRegistry,
        caller: Party,
        token: Party,
        amount: Amount,
        from: Party,
    ) -> Result<AssetId> {
        if registry.identity() != self.registry {
            return Err(LedgerError::NotRegistry { caller: registry.identity() });
        }
        if caller != from {
            warn!(%caller, %from, %token, "fungible deposit rejected");
            return Err(LedgerError::NotTokenHolder { caller, from });
        }

        self.bank.transfer(token, from, self.party, amount)?;
        let asset_id = registry.register_asset(self.clone());

        self.deposits
            .lock()
            .insert(asset_id, FungibleDeposit { token, amount });
        self.events.lock().emit(Event::FungibleDeposited {
            asset_id,
            token,
            amount,
            from,
        });
        info!(asset_id, %token, %amount, %from, "fungible collateral deposited");

        Ok(asset_id)
    }

    pub fn deposit_of(&self, asset_id: AssetId) -> Option<FungibleDeposit> {
        self.deposits.lock().get(&asset_id).copied()
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.events.lock().take_events()
    }
}

impl AssetRegistrar for FungiblePoolRegistrar {
    fn party(&self) -> Party {
        self.party
    }

    fn on_release(&self, registry: Party, asset_id: AssetId, recipient: Party) -> Result<()> {
        if registry != self.registry {
            return Err(LedgerError::NotRegistry { caller: registry });
        }

        let mut deposits = self.deposits.lock();
        let deposit = deposits
            .get(&asset_id)
            .copied()
            .ok_or(LedgerError::UnknownCustody { asset_id })?;

        self.bank
            .transfer(deposit.token, self.party, recipient, deposit.amount)?;
        deposits.remove(&asset_id);

        self.events.lock().emit(Event::FungibleReleased {
            asset_id,
            token: deposit.token,
            amount: deposit.amount,
            recipient,
        });
        info!(asset_id, token = %deposit.token, amount = %deposit.amount, %recipient, "fungible collateral released");
        Ok(())
    }
}
