use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// sequential loan identifier
pub type LoanId = u64;

/// sequential collateral asset identifier
pub type AssetId = u64;

/// rights token identifier (two per loan)
pub type RightsTokenId = u64;

/// unix timestamp in seconds
pub type Timestamp = u64;

/// identity of a controller, registrar, lender, borrower, token contract or recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Party(Uuid);

impl Party {
    /// the nil identity: no owner, burned, unregistered
    pub const NONE: Party = Party(Uuid::nil());

    /// generate a fresh identity
    pub fn generate() -> Self {
        Party(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Party(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for Party {
    fn from(uuid: Uuid) -> Self {
        Party(uuid)
    }
}

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LoanStatus {
    /// never created
    #[default]
    Uninitialized,
    /// accruing and accepting payments
    Open,
    /// terminal, borrower failed to keep up
    Defaulted,
    /// terminal, fully repaid and closed
    PayedOff,
}

impl LoanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Defaulted | LoanStatus::PayedOff)
    }
}

/// legal position represented by a rights token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Lender,
    Borrower,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Lender => write!(f, "lender"),
            Role::Borrower => write!(f, "borrower"),
        }
    }
}
