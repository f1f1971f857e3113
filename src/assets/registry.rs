use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::assets::registrar::AssetRegistrar;
use crate::config::{LedgerConfig, ReleasePolicy};
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::types::{AssetId, Party};

struct AssetEntry {
    registrar: Arc<dyn AssetRegistrar>,
    reserved: bool,
}

/// registry of collateral assets, each owned by the registrar that registered it
pub struct AssetRegistry {
    identity: Party,
    controller: Party,
    release_policy: ReleasePolicy,
    assets: HashMap<AssetId, AssetEntry>,
    total_assets: u64,
    pub events: EventStore,
}

impl AssetRegistry {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            identity: Party::generate(),
            controller: config.controller,
            release_policy: config.assets.release_policy,
            assets: HashMap::new(),
            total_assets: 0,
            events: EventStore::new(),
        }
    }

    /// identity the registry presents to registrars
    pub fn identity(&self) -> Party {
        self.identity
    }

    pub fn controller(&self) -> Party {
        self.controller
    }

    pub fn release_policy(&self) -> ReleasePolicy {
        self.release_policy
    }

    /// register a new asset owned by `registrar`
    pub fn register_asset(&mut self, registrar: Arc<dyn AssetRegistrar>) -> AssetId {
        let asset_id = self.total_assets;
        let party = registrar.party();

        self.assets.insert(
            asset_id,
            AssetEntry {
                registrar,
                reserved: false,
            },
        );
        self.total_assets += 1;

        self.events.emit(Event::Registration { asset_id, registrar: party });
        info!(asset_id, registrar = %party, "asset registered");

        asset_id
    }

    /// lock an asset as collateral
    pub fn reserve(&mut self, caller: Party, asset_id: AssetId) -> Result<()> {
        self.ensure_controller(caller)?;

        let entry = self
            .assets
            .get_mut(&asset_id)
            .ok_or(LedgerError::InvalidAsset { asset_id })?;
        if entry.reserved {
            return Err(LedgerError::AlreadyReserved { asset_id });
        }
        entry.reserved = true;

        self.events.emit(Event::Reserved { asset_id });
        info!(asset_id, "asset reserved");
        Ok(())
    }

    /// delete the asset entry and let its registrar hand it to `recipient`
    ///
    /// the controller may always release; otherwise the asset must be unreserved and,
    /// unless the policy is permissionless, `caller` must be its registrar.
    pub fn release_asset_to(&mut self, caller: Party, asset_id: AssetId, recipient: Party) -> Result<()> {
        let entry = self
            .assets
            .get(&asset_id)
            .ok_or(LedgerError::InvalidAsset { asset_id })?;
        let registrar = entry.registrar.party();

        if caller != self.controller {
            if entry.reserved {
                warn!(asset_id, %caller, "release of reserved asset rejected");
                return Err(LedgerError::NotController { caller });
            }

            if self.release_policy == ReleasePolicy::RegistrarOrController && caller != registrar {
                warn!(asset_id, %caller, %registrar, "release by non-registrar rejected");
                return Err(LedgerError::NotRegistrar { asset_id, caller });
            }
        }

        if recipient.is_none() {
            return Err(LedgerError::InvalidRecipient { recipient });
        }

        // the entry survives a failed hook
        entry.registrar.on_release(self.identity, asset_id, recipient)?;
        let Some(released) = self.assets.remove(&asset_id) else {
            return Err(LedgerError::InvalidAsset { asset_id });
        };

        self.events.emit(Event::AssetRelease {
            asset_id,
            registrar,
            recipient,
        });
        info!(asset_id, %registrar, %recipient, "asset released");

        if recipient == registrar
            && released
                .registrar
                .on_returned(self.identity, asset_id, self.total_assets)
        {
            self.register_asset(released.registrar);
        }
        Ok(())
    }

    /// registrar of the asset, `Party::NONE` when unregistered or released
    pub fn registrar_of(&self, asset_id: AssetId) -> Party {
        self.assets
            .get(&asset_id)
            .map(|entry| entry.registrar.party())
            .unwrap_or(Party::NONE)
    }

    pub fn is_reserved(&self, asset_id: AssetId) -> bool {
        self.assets
            .get(&asset_id)
            .map(|entry| entry.reserved)
            .unwrap_or(false)
    }

    /// number of identifiers ever issued
    pub fn total_assets(&self) -> u64 {
        self.total_assets
    }

    fn ensure_controller(&self, caller: Party) -> Result<()> {
        if caller != self.controller {
            warn!(%caller, "privileged asset call rejected");
            return Err(LedgerError::NotController { caller });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::registrar::MockRegistrar;
    use crate::errors::ErrorKind;

    struct Fixture {
        controller: Party,
        registry: AssetRegistry,
        first: Arc<MockRegistrar>,
        second: Arc<MockRegistrar>,
    }

    fn fixture(config: fn(Party) -> LedgerConfig) -> Fixture {
        let controller = Party::generate();
        Fixture {
            controller,
            registry: AssetRegistry::new(&config(controller)),
            first: Arc::new(MockRegistrar::new(Party::generate())),
            second: Arc::new(MockRegistrar::new(Party::generate())),
        }
    }

    #[test]
    fn test_register_assets() {
        let Fixture { mut registry, first, second, .. } = fixture(LedgerConfig::new);

        assert_eq!(registry.register_asset(first.clone()), 0);
        assert_eq!(registry.register_asset(second.clone()), 1);

        assert_eq!(registry.registrar_of(0), first.party());
        assert_eq!(registry.registrar_of(1), second.party());
        assert_eq!(registry.registrar_of(2), Party::NONE);
        assert_eq!(registry.total_assets(), 2);
        assert_eq!(
            registry.events.events()[1],
            Event::Registration { asset_id: 1, registrar: second.party() }
        );
    }

    #[test]
    fn test_reserve() {
        let Fixture { controller, mut registry, first, .. } = fixture(LedgerConfig::new);
        let asset_id = registry.register_asset(first.clone());

        let err = registry.reserve(first.party(), asset_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        assert_eq!(
            registry.reserve(controller, 9),
            Err(LedgerError::InvalidAsset { asset_id: 9 })
        );

        registry.reserve(controller, asset_id).unwrap();
        assert!(registry.is_reserved(asset_id));
        assert_eq!(
            registry.reserve(controller, asset_id),
            Err(LedgerError::AlreadyReserved { asset_id })
        );
    }

    #[test]
    fn test_reserved_release_needs_controller() {
        let Fixture { controller, mut registry, first, second } = fixture(LedgerConfig::new);
        registry.register_asset(first.clone());
        let asset_id = registry.register_asset(second.clone());
        let recipient = Party::generate();

        registry.reserve(controller, asset_id).unwrap();

        let err = registry
            .release_asset_to(second.party(), asset_id, recipient)
            .unwrap_err();
        assert_eq!(err, LedgerError::NotController { caller: second.party() });
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        registry.release_asset_to(controller, asset_id, recipient).unwrap();
        assert!(!registry.is_reserved(asset_id));
        assert_eq!(registry.registrar_of(asset_id), Party::NONE);
        assert_eq!(registry.total_assets(), 2);
        assert_eq!(second.releases(), vec![(asset_id, recipient)]);
    }

    #[test]
    fn test_registrar_releases_unreserved() {
        let Fixture { mut registry, first, second, .. } = fixture(LedgerConfig::new);
        let asset_id = registry.register_asset(first.clone());
        let recipient = Party::generate();

        assert_eq!(
            registry.release_asset_to(second.party(), asset_id, recipient),
            Err(LedgerError::NotRegistrar { asset_id, caller: second.party() })
        );

        registry.release_asset_to(first.party(), asset_id, recipient).unwrap();
        assert_eq!(first.releases(), vec![(asset_id, recipient)]);
        assert!(second.releases().is_empty());
    }

    #[test]
    fn test_permissionless_release() {
        let Fixture { controller, mut registry, first, .. } = fixture(LedgerConfig::permissive);
        let asset_id = registry.register_asset(first.clone());
        let stranger = Party::generate();

        registry.release_asset_to(stranger, asset_id, stranger).unwrap();
        assert_eq!(first.releases(), vec![(asset_id, stranger)]);

        // reservation still protects the asset
        let reserved = registry.register_asset(first.clone());
        registry.reserve(controller, reserved).unwrap();
        assert!(registry.release_asset_to(stranger, reserved, stranger).is_err());
    }

    #[test]
    fn test_double_release_fails() {
        let Fixture { controller, mut registry, first, .. } = fixture(LedgerConfig::new);
        let asset_id = registry.register_asset(first.clone());
        let recipient = Party::generate();

        registry.release_asset_to(controller, asset_id, recipient).unwrap();

        let err = registry
            .release_asset_to(controller, asset_id, recipient)
            .unwrap_err();
        assert_eq!(err, LedgerError::InvalidAsset { asset_id });
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(registry.reserve(controller, asset_id).is_err());
    }

    #[test]
    fn test_failed_hook_keeps_entry() {
        let Fixture { controller, mut registry, first, .. } = fixture(LedgerConfig::new);
        let asset_id = registry.register_asset(first.clone());
        registry.reserve(controller, asset_id).unwrap();
        registry.events.clear();

        first.set_failing(true);
        assert!(registry.release_asset_to(controller, asset_id, Party::generate()).is_err());
        assert_eq!(registry.registrar_of(asset_id), first.party());
        assert!(registry.is_reserved(asset_id));
        assert!(registry.events.events().is_empty());
    }

    #[test]
    fn test_release_to_own_registrar_is_not_reregistered_by_default() {
        let Fixture { controller, mut registry, first, .. } = fixture(LedgerConfig::new);
        let asset_id = registry.register_asset(first.clone());

        registry.release_asset_to(controller, asset_id, first.party()).unwrap();
        assert_eq!(registry.total_assets(), 1);
        assert_eq!(registry.registrar_of(asset_id), Party::NONE);
        assert_eq!(first.releases(), vec![(asset_id, first.party())]);
    }

    #[test]
    fn test_release_to_nil_identity() {
        let Fixture { controller, mut registry, first, .. } = fixture(LedgerConfig::new);
        let asset_id = registry.register_asset(first.clone());

        assert_eq!(
            registry.release_asset_to(controller, asset_id, Party::NONE),
            Err(LedgerError::InvalidRecipient { recipient: Party::NONE })
        );
        assert_eq!(registry.registrar_of(asset_id), first.party());
    }
}
