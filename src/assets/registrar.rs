use parking_lot::Mutex;

use crate::errors::{LedgerError, Result};
use crate::types::{AssetId, Party};

/// owner of registered assets, told when one of them is released
pub trait AssetRegistrar: Send + Sync {
    /// identity recorded as the registrar of every asset this registers
    fn party(&self) -> Party;

    /// hand the asset over to `recipient`; `registry` is the identity of the calling registry
    fn on_release(&self, registry: Party, asset_id: AssetId, recipient: Party) -> Result<()>;

    /// `released` was handed back to this registrar; returning `true` registers it again
    /// under `asset_id`
    fn on_returned(&self, _registry: Party, _released: AssetId, _asset_id: AssetId) -> bool {
        false
    }
}

/// registrar that only records the releases it is told about
#[derive(Debug)]
pub struct MockRegistrar {
    party: Party,
    releases: Mutex<Vec<(AssetId, Party)>>,
    failing: Mutex<bool>,
}

impl MockRegistrar {
    pub fn new(party: Party) -> Self {
        Self {
            party,
            releases: Mutex::new(Vec::new()),
            failing: Mutex::new(false),
        }
    }

    /// make every following release hook fail
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    /// `(asset_id, recipient)` of every release, in order
    pub fn releases(&self) -> Vec<(AssetId, Party)> {
        self.releases.lock().clone()
    }
}

impl AssetRegistrar for MockRegistrar {
    fn party(&self) -> Party {
        self.party
    }

    fn on_release(&self, _registry: Party, asset_id: AssetId, recipient: Party) -> Result<()> {
        if *self.failing.lock() {
            return Err(LedgerError::UnknownCustody { asset_id });
        }

        self.releases.lock().push((asset_id, recipient));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_records_releases() {
        let registrar = MockRegistrar::new(Party::generate());
        let recipient = Party::generate();

        registrar.on_release(Party::NONE, 3, recipient).unwrap();
        registrar.on_release(Party::NONE, 5, recipient).unwrap();

        assert_eq!(registrar.releases(), vec![(3, recipient), (5, recipient)]);
    }

    #[test]
    fn test_mock_failing() {
        let registrar = MockRegistrar::new(Party::generate());
        registrar.set_failing(true);

        assert!(registrar.on_release(Party::NONE, 1, Party::generate()).is_err());
        assert!(registrar.releases().is_empty());
    }
}
