use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::types::Party;

/// length of one era unit in seconds (12 hours)
pub const DEFAULT_ERA_UNIT_SECS: u64 = 43_200;

pub const DEFAULT_RIGHTS_NAME: &str = "Loan Rights Registry";
pub const DEFAULT_RIGHTS_SYMBOL: &str = "LRR";

/// ledger configuration shared by all components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// the single trusted identity allowed to drive privileged operations
    pub controller: Party,
    pub era_unit_secs: u64,
    pub assets: AssetRegistryConfig,
    pub rights: RightsRegistryConfig,
    pub payments: PaymentsConfig,
}

/// who may release an asset that is not reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ReleasePolicy {
    /// the asset's registrar, or the controller
    #[default]
    RegistrarOrController,
    /// any caller
    Permissionless,
}

/// asset registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AssetRegistryConfig {
    pub release_policy: ReleasePolicy,
}

/// rights registry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RightsRegistryConfig {
    pub name: String,
    pub symbol: String,
}

impl Default for RightsRegistryConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_RIGHTS_NAME.to_string(),
            symbol: DEFAULT_RIGHTS_SYMBOL.to_string(),
        }
    }
}

/// payments manager configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// identity holding the received tokens
    pub holder: Party,
    /// reject assignments larger than the available balance
    pub enforce_available: bool,
}

impl PaymentsConfig {
    pub fn new(holder: Party) -> Self {
        Self {
            holder,
            enforce_available: false,
        }
    }
}

impl LedgerConfig {
    /// default configuration for a controller, with a freshly generated payments holder
    pub fn new(controller: Party) -> Self {
        Self {
            controller,
            era_unit_secs: DEFAULT_ERA_UNIT_SECS,
            assets: AssetRegistryConfig::default(),
            rights: RightsRegistryConfig::default(),
            payments: PaymentsConfig::new(Party::generate()),
        }
    }

    /// anyone may release unreserved assets and assignments are trusted
    pub fn permissive(controller: Party) -> Self {
        Self::new(controller).with_release_policy(ReleasePolicy::Permissionless)
    }

    /// configuration that hardens the payments manager against over-assignment
    pub fn strict(controller: Party) -> Self {
        Self::new(controller).with_enforced_available(true)
    }

    pub fn with_era_unit(mut self, secs: u64) -> Self {
        self.era_unit_secs = secs;
        self
    }

    pub fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.assets.release_policy = policy;
        self
    }

    pub fn with_enforced_available(mut self, enforce: bool) -> Self {
        self.payments.enforce_available = enforce;
        self
    }

    pub fn with_payments_holder(mut self, holder: Party) -> Self {
        self.payments.holder = holder;
        self
    }

    pub fn with_rights_metadata(mut self, name: &str, symbol: &str) -> Self {
        self.rights.name = name.to_string();
        self.rights.symbol = symbol.to_string();
        self
    }

    /// check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.controller.is_none() {
            return Err(LedgerError::InvalidConfiguration {
                message: "controller must not be the nil identity".to_string(),
            });
        }

        if self.era_unit_secs == 0 {
            return Err(LedgerError::InvalidConfiguration {
                message: "era unit must be non-zero".to_string(),
            });
        }

        if self.payments.holder.is_none() {
            return Err(LedgerError::InvalidConfiguration {
                message: "payments holder must not be the nil identity".to_string(),
            });
        }

        if self.rights.name.is_empty() || self.rights.symbol.is_empty() {
            return Err(LedgerError::InvalidConfiguration {
                message: "rights registry needs a name and a symbol".to_string(),
            });
        }

        Ok(())
    }

    /// parse and validate a json configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)
            .map_err(|e| LedgerError::InvalidConfiguration { message: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::InvalidConfiguration { message: e.to_string() })
    }
}
