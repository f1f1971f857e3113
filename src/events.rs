use serde::{Deserialize, Serialize};

use crate::types::{AssetId, LoanId, LoanStatus, Party, RightsTokenId, Timestamp};
use crate::units::{Amount, Rate};

/// all events that can be emitted by the ledger components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // loan events
    LoanCreated {
        loan_id: LoanId,
        principal: Amount,
        interest_rate: Rate,
        duration: u64,
        era_duration: u64,
        start_time: Timestamp,
        min_payment: Amount,
    },
    /// eras `first_era..=last_era` accrued with the same per-era payment
    EraAccrued {
        loan_id: LoanId,
        first_era: u64,
        last_era: u64,
        interest: Amount,
        payment: Amount,
        outstanding: Amount,
    },
    PrincipalPaid {
        loan_id: LoanId,
        era: u64,
        payment: Amount,
        outstanding: Amount,
    },
    LoanStatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
    },

    // asset registry events
    Registration {
        asset_id: AssetId,
        registrar: Party,
    },
    Reserved {
        asset_id: AssetId,
    },
    AssetRelease {
        asset_id: AssetId,
        registrar: Party,
        recipient: Party,
    },

    // custody events raised by registrars
    FungibleDeposited {
        asset_id: AssetId,
        token: Party,
        amount: Amount,
        from: Party,
    },
    FungibleReleased {
        asset_id: AssetId,
        token: Party,
        amount: Amount,
        recipient: Party,
    },
    NftRegistered {
        asset_id: AssetId,
        collection: Party,
        token_id: u128,
        from: Party,
    },
    NftReleased {
        asset_id: AssetId,
        collection: Party,
        token_id: u128,
        recipient: Party,
    },

    // rights registry events
    Registered {
        loan_id: LoanId,
        lender: Party,
        borrower: Party,
    },
    RightsTransfer {
        from: Party,
        to: Party,
        token_id: RightsTokenId,
    },
    RightsApproval {
        owner: Party,
        approved: Party,
        token_id: RightsTokenId,
    },
    RightsApprovalForAll {
        owner: Party,
        operator: Party,
        approved: bool,
    },

    // payments events
    BalanceAssigned {
        token: Party,
        party: Party,
        amount: Amount,
    },
    PendingReleased {
        token: Party,
        party: Party,
        amount: Amount,
    },
    Skimmed {
        token: Party,
        recipient: Party,
        amount: Amount,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
