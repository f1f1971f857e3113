use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assets::registrar::AssetRegistrar;
use crate::assets::registry::AssetRegistry;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::types::{AssetId, Party};

/// ownership of non-fungible tokens, keyed by collection and token id
pub trait NftBank: Send + Sync {
    fn owner_of(&self, collection: Party, token_id: u128) -> Option<Party>;

    fn transfer(&self, collection: Party, token_id: u128, from: Party, to: Party) -> Result<()>;
}

/// nft bank kept in memory
#[derive(Debug, Default)]
pub struct InMemoryNftBank {
    owners: RwLock<HashMap<(Party, u128), Party>>,
}

impl InMemoryNftBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// create a token owned by `to`; fails if it already exists
    pub fn mint(&self, collection: Party, token_id: u128, to: Party) -> Result<()> {
        if to.is_none() {
            return Err(LedgerError::InvalidRecipient { recipient: to });
        }

        let mut owners = self.owners.write();
        if owners.contains_key(&(collection, token_id)) {
            return Err(LedgerError::NotNftOwner {
                collection,
                token_id,
                from: Party::NONE,
            });
        }
        owners.insert((collection, token_id), to);

        debug!(%collection, token_id, %to, "nft minted");
        Ok(())
    }
}

impl NftBank for InMemoryNftBank {
    fn owner_of(&self, collection: Party, token_id: u128) -> Option<Party> {
        self.owners.read().get(&(collection, token_id)).copied()
    }

    fn transfer(&self, collection: Party, token_id: u128, from: Party, to: Party) -> Result<()> {
        if to.is_none() {
            return Err(LedgerError::InvalidRecipient { recipient: to });
        }

        let mut owners = self.owners.write();
        match owners.get_mut(&(collection, token_id)) {
            Some(owner) if *owner == from => {
                *owner = to;
                debug!(%collection, token_id, %from, %to, "nft transferred");
                Ok(())
            }
            _ => Err(LedgerError::NotNftOwner {
                collection,
                token_id,
                from,
            }),
        }
    }
}

/// a non-fungible token held in custody
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftToken {
    pub collection: Party,
    pub token_id: u128,
}

/// registrar keeping non-fungible tokens as collateral, one asset per token
pub struct NftCustodyRegistrar {
    party: Party,
    registry: Party,
    nfts: Arc<dyn NftBank>,
    custody: Mutex<HashMap<AssetId, NftToken>>,
    returned: Mutex<HashMap<AssetId, NftToken>>,
    events: Mutex<EventStore>,
}

impl NftCustodyRegistrar {
    /// registrar bound to `registry`
    pub fn new(party: Party, registry: &AssetRegistry, nfts: Arc<dyn NftBank>) -> Self {
        Self {
            party,
            registry: registry.identity(),
            nfts,
            custody: Mutex::new(HashMap::new()),
            returned: Mutex::new(HashMap::new()),
            events: Mutex::new(EventStore::new()),
        }
    }

    /// take `token_id` of `collection` from `from` into custody and register it;
    /// only the holder itself may hand a token over
    pub fn receive(
        self: &Arc<Self>,
        registry: &mut AssetRegistry,
        caller: Party,
        collection: Party,
        token_id: u128,
        from: Party,
    ) -> Result<AssetId> {
        if registry.identity() != self.registry {
            return Err(LedgerError::NotRegistry { caller: registry.identity() });
        }
        if caller != from {
            warn!(%caller, %from, token_id, "nft receive rejected");
            return Err(LedgerError::NotTokenHolder { caller, from });
        }

        self.nfts.transfer(collection, token_id, from, self.party)?;
        let asset_id = registry.register_asset(self.clone());

        self.custody
            .lock()
            .insert(asset_id, NftToken { collection, token_id });
        self.events.lock().emit(Event::NftRegistered {
            asset_id,
            collection,
            token_id,
            from,
        });
        info!(asset_id, %collection, token_id, %from, "nft collateral received");

        Ok(asset_id)
    }

    /// token held for `asset_id`
    pub fn token_of(&self, asset_id: AssetId) -> Option<NftToken> {
        self.custody.lock().get(&asset_id).copied()
    }

    pub fn take_events(&self) -> Vec<Event> {
        self.events.lock().take_events()
    }
}

impl AssetRegistrar for NftCustodyRegistrar {
    fn party(&self) -> Party {
        self.party
    }

    fn on_release(&self, registry: Party, asset_id: AssetId, recipient: Party) -> Result<()> {
        if registry != self.registry {
            return Err(LedgerError::NotRegistry { caller: registry });
        }

        let mut custody = self.custody.lock();
        let token = custody
            .get(&asset_id)
            .copied()
            .ok_or(LedgerError::UnknownCustody { asset_id })?;

        self.nfts
            .transfer(token.collection, token.token_id, self.party, recipient)?;
        custody.remove(&asset_id);
        if recipient == self.party {
            self.returned.lock().insert(asset_id, token);
        }

        self.events.lock().emit(Event::NftReleased {
            asset_id,
            collection: token.collection,
            token_id: token.token_id,
            recipient,
        });
        info!(asset_id, collection = %token.collection, token_id = token.token_id, %recipient, "nft collateral released");
        Ok(())
    }

    fn on_returned(&self, registry: Party, released: AssetId, asset_id: AssetId) -> bool {
        if registry != self.registry {
            return false;
        }
        let Some(token) = self.returned.lock().remove(&released) else {
            return false;
        };

        self.custody.lock().insert(asset_id, token);
        self.events.lock().emit(Event::NftRegistered {
            asset_id,
            collection: token.collection,
            token_id: token.token_id,
            from: self.party,
        });
        info!(asset_id, released, collection = %token.collection, token_id = token.token_id, "returned nft registered again");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;

    struct Fixture {
        controller: Party,
        registry: AssetRegistry,
        nfts: Arc<InMemoryNftBank>,
        registrar: Arc<NftCustodyRegistrar>,
        collection: Party,
    }

    fn fixture() -> Fixture {
        let controller = Party::generate();
        let registry = AssetRegistry::new(&LedgerConfig::new(controller));
        let nfts = Arc::new(InMemoryNftBank::new());
        let registrar = Arc::new(NftCustodyRegistrar::new(Party::generate(), &registry, nfts.clone()));

        Fixture {
            controller,
            registry,
            nfts,
            registrar,
            collection: Party::generate(),
        }
    }

    #[test]
    fn test_receive_registers_asset() {
        let Fixture { mut registry, nfts, registrar, collection, .. } = fixture();
        let borrower = Party::generate();
        nfts.mint(collection, 7, borrower).unwrap();
        nfts.mint(collection, 8, borrower).unwrap();

        let first = registrar.receive(&mut registry, borrower, collection, 7, borrower).unwrap();
        let second = registrar.receive(&mut registry, borrower, collection, 8, borrower).unwrap();

        assert_eq!((first, second), (0, 1));
        assert_eq!(registry.registrar_of(first), registrar.party());
        assert_eq!(registrar.token_of(second), Some(NftToken { collection, token_id: 8 }));
        assert_eq!(nfts.owner_of(collection, 7), Some(registrar.party()));
    }

    #[test]
    fn test_receive_requires_ownership() {
        let Fixture { mut registry, nfts, registrar, collection, .. } = fixture();
        nfts.mint(collection, 1, Party::generate()).unwrap();
        let pretender = Party::generate();

        let result = registrar.receive(&mut registry, pretender, collection, 1, pretender);
        assert!(matches!(result, Err(LedgerError::NotNftOwner { .. })));
        assert_eq!(registry.total_assets(), 0);
    }

    #[test]
    fn test_release_transfers_out() {
        let Fixture { controller, mut registry, nfts, registrar, collection } = fixture();
        let borrower = Party::generate();
        let lender = Party::generate();
        nfts.mint(collection, 42, borrower).unwrap();

        let asset_id = registrar.receive(&mut registry, borrower, collection, 42, borrower).unwrap();
        registry.reserve(controller, asset_id).unwrap();
        registry.release_asset_to(controller, asset_id, lender).unwrap();

        assert_eq!(nfts.owner_of(collection, 42), Some(lender));
        assert_eq!(registrar.token_of(asset_id), None);
        assert_eq!(registry.registrar_of(asset_id), Party::NONE);

        let events = registrar.take_events();
        assert_eq!(
            events[1],
            Event::NftReleased { asset_id, collection, token_id: 42, recipient: lender }
        );
    }

    #[test]
    fn test_release_hook_only_from_registry() {
        let Fixture { mut registry, nfts, registrar, collection, .. } = fixture();
        let borrower = Party::generate();
        nfts.mint(collection, 3, borrower).unwrap();
        let asset_id = registrar.receive(&mut registry, borrower, collection, 3, borrower).unwrap();

        let err = registrar.on_release(borrower, asset_id, borrower).unwrap_err();
        assert_eq!(err, LedgerError::NotRegistry { caller: borrower });
        assert_eq!(nfts.owner_of(collection, 3), Some(registrar.party()));
    }

    #[test]
    fn test_other_registry_rejected() {
        let Fixture { nfts, registrar, collection, .. } = fixture();
        let mut other = AssetRegistry::new(&LedgerConfig::new(Party::generate()));
        let borrower = Party::generate();
        nfts.mint(collection, 5, borrower).unwrap();

        let result = registrar.receive(&mut other, borrower, collection, 5, borrower);
        assert_eq!(result, Err(LedgerError::NotRegistry { caller: other.identity() }));
        assert_eq!(nfts.owner_of(collection, 5), Some(borrower));
    }

    #[test]
    fn test_receive_needs_holder_consent() {
        for config in [LedgerConfig::new, LedgerConfig::permissive] {
            let controller = Party::generate();
            let mut registry = AssetRegistry::new(&config(controller));
            let nfts = Arc::new(InMemoryNftBank::new());
            let registrar = Arc::new(NftCustodyRegistrar::new(Party::generate(), &registry, nfts.clone()));
            let collection = Party::generate();
            let victim = Party::generate();
            let attacker = Party::generate();
            nfts.mint(collection, 9, victim).unwrap();

            let err = registrar
                .receive(&mut registry, attacker, collection, 9, victim)
                .unwrap_err();
            assert_eq!(err, LedgerError::NotTokenHolder { caller: attacker, from: victim });
            assert_eq!(err.kind(), crate::errors::ErrorKind::PermissionDenied);
            assert_eq!(nfts.owner_of(collection, 9), Some(victim));
            assert_eq!(registry.total_assets(), 0);
            assert!(registrar.take_events().is_empty());
        }
    }

    #[test]
    fn test_release_to_self_registers_again() {
        let Fixture { controller, mut registry, nfts, registrar, collection } = fixture();
        let borrower = Party::generate();
        nfts.mint(collection, 11, borrower).unwrap();
        let asset_id = registrar.receive(&mut registry, borrower, collection, 11, borrower).unwrap();
        registry.reserve(controller, asset_id).unwrap();

        registry
            .release_asset_to(controller, asset_id, registrar.party())
            .unwrap();

        let again = asset_id + 1;
        assert_eq!(registry.total_assets(), 2);
        assert_eq!(registry.registrar_of(asset_id), Party::NONE);
        assert_eq!(registry.registrar_of(again), registrar.party());
        assert!(!registry.is_reserved(again));
        assert_eq!(registrar.token_of(asset_id), None);
        assert_eq!(registrar.token_of(again), Some(NftToken { collection, token_id: 11 }));
        assert_eq!(nfts.owner_of(collection, 11), Some(registrar.party()));
        assert_eq!(
            registrar.take_events().last(),
            Some(&Event::NftRegistered {
                asset_id: again,
                collection,
                token_id: 11,
                from: registrar.party(),
            })
        );

        // the new entry releases like any other
        let lender = Party::generate();
        registry.release_asset_to(controller, again, lender).unwrap();
        assert_eq!(nfts.owner_of(collection, 11), Some(lender));
        assert_eq!(registry.total_assets(), 2);
    }
}
