use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::rights::ownership::OwnershipTable;
use crate::types::{LoanId, Party, RightsTokenId, Role};

/// lender token of a loan; `None` when the id has no token in range
pub fn lender_token(loan_id: LoanId) -> Option<RightsTokenId> {
    loan_id.checked_mul(2)
}

/// borrower token of a loan; `None` when the id has no token in range
pub fn borrower_token(loan_id: LoanId) -> Option<RightsTokenId> {
    lender_token(loan_id)?.checked_add(1)
}

/// loan a rights token belongs to
pub fn loan_of(token_id: RightsTokenId) -> LoanId {
    token_id / 2
}

pub fn role_of(token_id: RightsTokenId) -> Role {
    if token_id % 2 == 0 {
        Role::Lender
    } else {
        Role::Borrower
    }
}

fn token_for(loan_id: LoanId, role: Role) -> Result<RightsTokenId> {
    match role {
        Role::Lender => lender_token(loan_id),
        Role::Borrower => borrower_token(loan_id),
    }
    .ok_or(LedgerError::UnknownLoan { loan_id })
}

/// transferable lender and borrower rights, two tokens per loan
pub struct RightsRegistry {
    controller: Party,
    name: String,
    symbol: String,
    table: OwnershipTable,
    total_loans: u64,
    pub events: EventStore,
}

impl RightsRegistry {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            controller: config.controller,
            name: config.rights.name.clone(),
            symbol: config.rights.symbol.clone(),
            table: OwnershipTable::new(),
            total_loans: 0,
            events: EventStore::new(),
        }
    }

    pub fn controller(&self) -> Party {
        self.controller
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// mint the lender and borrower tokens of the next loan
    pub fn register(&mut self, caller: Party, lender: Party, borrower: Party) -> Result<LoanId> {
        self.ensure_controller(caller)?;
        for recipient in [lender, borrower] {
            if recipient.is_none() {
                return Err(LedgerError::InvalidRecipient { recipient });
            }
        }

        let loan_id = self.total_loans;
        let lender_id = token_for(loan_id, Role::Lender)?;
        let borrower_id = token_for(loan_id, Role::Borrower)?;
        self.mint(lender_id, lender)?;
        self.mint(borrower_id, borrower)?;
        self.total_loans += 1;

        self.events.emit(Event::Registered {
            loan_id,
            lender,
            borrower,
        });
        info!(loan_id, %lender, %borrower, "loan rights registered");

        Ok(loan_id)
    }

    pub fn lender_of(&self, loan_id: LoanId) -> Result<Party> {
        self.table.owner_of(token_for(loan_id, Role::Lender)?)
    }

    pub fn borrower_of(&self, loan_id: LoanId) -> Result<Party> {
        self.table.owner_of(token_for(loan_id, Role::Borrower)?)
    }

    /// `party` owns the lender token or is approved to act for it
    pub fn is_lender_of(&self, loan_id: LoanId, party: Party) -> Result<bool> {
        self.table.is_approved_or_owner(party, token_for(loan_id, Role::Lender)?)
    }

    /// `party` owns the borrower token or is approved to act for it
    pub fn is_borrower_of(&self, loan_id: LoanId, party: Party) -> Result<bool> {
        self.table.is_approved_or_owner(party, token_for(loan_id, Role::Borrower)?)
    }

    pub fn delete_lender_of(&mut self, caller: Party, loan_id: LoanId) -> Result<()> {
        self.delete(caller, loan_id, Role::Lender)
    }

    pub fn delete_borrower_of(&mut self, caller: Party, loan_id: LoanId) -> Result<()> {
        self.delete(caller, loan_id, Role::Borrower)
    }

    /// move a token; `caller` must own it, be approved for it, or operate for its owner
    pub fn transfer_from(&mut self, caller: Party, from: Party, to: Party, token_id: RightsTokenId) -> Result<()> {
        if !self.table.is_approved_or_owner(caller, token_id)? {
            warn!(token_id, %caller, "rights transfer rejected");
            return Err(LedgerError::NotOwnerOrApproved { token_id, caller });
        }

        self.table.transfer(token_id, from, to)?;

        self.events.emit(Event::RightsTransfer { from, to, token_id });
        debug!(token_id, %from, %to, role = %role_of(token_id), "rights transferred");
        Ok(())
    }

    /// let `spender` move one token; `Party::NONE` clears the approval
    pub fn approve(&mut self, caller: Party, spender: Party, token_id: RightsTokenId) -> Result<()> {
        let owner = self.table.owner_of(token_id)?;
        if caller != owner && !self.table.is_operator(owner, caller) {
            warn!(token_id, %caller, "rights approval rejected");
            return Err(LedgerError::NotOwnerOrApproved { token_id, caller });
        }
        if spender == owner {
            return Err(LedgerError::InvalidRecipient { recipient: spender });
        }

        self.table.approve(token_id, spender)?;

        self.events.emit(Event::RightsApproval {
            owner,
            approved: spender,
            token_id,
        });
        debug!(token_id, %owner, %spender, "rights approval set");
        Ok(())
    }

    /// let `operator` act for every token `owner` holds
    pub fn set_approval_for_all(&mut self, owner: Party, operator: Party, approved: bool) -> Result<()> {
        if operator == owner || operator.is_none() {
            return Err(LedgerError::InvalidRecipient { recipient: operator });
        }

        self.table.set_operator(owner, operator, approved);

        self.events.emit(Event::RightsApprovalForAll {
            owner,
            operator,
            approved,
        });
        debug!(%owner, %operator, approved, "rights operator set");
        Ok(())
    }

    pub fn get_approved(&self, token_id: RightsTokenId) -> Result<Party> {
        self.table.get_approved(token_id)
    }

    pub fn is_approved_for_all(&self, owner: Party, operator: Party) -> bool {
        self.table.is_operator(owner, operator)
    }

    pub fn owner_of(&self, token_id: RightsTokenId) -> Result<Party> {
        self.table.owner_of(token_id)
    }

    pub fn balance_of(&self, owner: Party) -> u64 {
        self.table.balance_of(owner)
    }

    pub fn tokens_of(&self, owner: Party) -> Vec<RightsTokenId> {
        self.table.tokens_of(owner)
    }

    /// tokens ever minted
    pub fn total_tokens_issued(&self) -> u64 {
        self.total_loans * 2
    }

    /// tokens not yet burned
    pub fn total_supply(&self) -> u64 {
        self.table.total_supply()
    }

    pub fn total_loans(&self) -> u64 {
        self.total_loans
    }

    fn mint(&mut self, token_id: RightsTokenId, to: Party) -> Result<()> {
        self.table.mint(token_id, to)?;
        self.events.emit(Event::RightsTransfer {
            from: Party::NONE,
            to,
            token_id,
        });
        Ok(())
    }

    fn delete(&mut self, caller: Party, loan_id: LoanId, role: Role) -> Result<()> {
        self.ensure_controller(caller)?;

        let token_id = token_for(loan_id, role)?;
        let owner = self.table.burn(token_id)?;

        self.events.emit(Event::RightsTransfer {
            from: owner,
            to: Party::NONE,
            token_id,
        });
        info!(loan_id, %role, %owner, "loan rights burned");
        Ok(())
    }

    fn ensure_controller(&self, caller: Party) -> Result<()> {
        if caller != self.controller {
            warn!(%caller, "privileged rights call rejected");
            return Err(LedgerError::NotController { caller });
        }
        Ok(())
    }
}
