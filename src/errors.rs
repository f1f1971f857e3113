use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{AssetId, LoanId, LoanStatus, Party, RightsTokenId};
use crate::units::Amount;

/// broad failure classes callers can match on without caring about the exact variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    PermissionDenied,
    InvalidState,
    InsufficientPayment,
    PreconditionNotMet,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid era duration: must be non-zero")]
    InvalidEraDuration,

    #[error("no principal: loan principal must be non-zero")]
    NoPrincipal,

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow in {operation}")]
    Overflow {
        operation: &'static str,
    },

    #[error("invalid interest rate: {value}")]
    InvalidRate {
        value: Decimal,
    },

    #[error("payment exceeds balance: balance {balance}, payment {payment}")]
    PaymentExceedsBalance {
        balance: Amount,
        payment: Amount,
    },

    #[error("pay down must cover at least one era")]
    NoEras,

    #[error("invalid amount: {value:?}")]
    InvalidAmount {
        value: String,
    },

    #[error("invalid recipient: {recipient}")]
    InvalidRecipient {
        recipient: Party,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("caller {caller} is not the controller")]
    NotController {
        caller: Party,
    },

    #[error("caller {caller} is not the registrar of asset {asset_id}")]
    NotRegistrar {
        asset_id: AssetId,
        caller: Party,
    },

    #[error("caller {caller} is not the asset registry")]
    NotRegistry {
        caller: Party,
    },

    #[error("caller {caller} is not owner nor approved for rights token {token_id}")]
    NotOwnerOrApproved {
        token_id: RightsTokenId,
        caller: Party,
    },

    #[error("caller {caller} cannot move tokens held by {from}")]
    NotTokenHolder {
        caller: Party,
        from: Party,
    },

    #[error("unknown loan: {loan_id}")]
    UnknownLoan {
        loan_id: LoanId,
    },

    #[error("loan {loan_id} not open: current status is {status:?}")]
    NotOpen {
        loan_id: LoanId,
        status: LoanStatus,
    },

    #[error("invalid asset: {asset_id}")]
    InvalidAsset {
        asset_id: AssetId,
    },

    #[error("asset {asset_id} already reserved")]
    AlreadyReserved {
        asset_id: AssetId,
    },

    #[error("nonexistent rights token: {token_id}")]
    NonexistentToken {
        token_id: RightsTokenId,
    },

    #[error("rights token {token_id} is not owned by {from}")]
    WrongOwner {
        token_id: RightsTokenId,
        from: Party,
    },

    #[error("token {token_id} of collection {collection} is not owned by {from}")]
    NotNftOwner {
        collection: Party,
        token_id: u128,
        from: Party,
    },

    #[error("no custody record for asset {asset_id}")]
    UnknownCustody {
        asset_id: AssetId,
    },

    #[error("payment below minimum: minimum {minimum}, provided {provided}")]
    PaymentBelowMinimum {
        minimum: Amount,
        provided: Amount,
    },

    #[error("total payment below minimum: minimum {minimum}, provided {provided}")]
    TotalPaymentBelowMinimum {
        minimum: Amount,
        provided: Amount,
    },

    #[error("loan {loan_id} not payed off: outstanding {outstanding}")]
    NotPayedOff {
        loan_id: LoanId,
        outstanding: Amount,
    },

    #[error("loan {loan_id} already payed off")]
    AlreadyPayedOff {
        loan_id: LoanId,
    },

    #[error("loan {loan_id} has nothing past due")]
    NothingPastDue {
        loan_id: LoanId,
    },

    #[error("loan {loan_id} has no current era to pay off")]
    NoCurrentEra {
        loan_id: LoanId,
    },

    #[error("insufficient available balance of {token}: available {available}, requested {requested}")]
    InsufficientAvailable {
        token: Party,
        available: Amount,
        requested: Amount,
    },

    #[error("insufficient pending balance of {token}: pending {pending}, requested {requested}")]
    InsufficientPending {
        token: Party,
        pending: Amount,
        requested: Amount,
    },

    #[error("insufficient token balance of {token}: balance {balance}, requested {requested}")]
    InsufficientTokenBalance {
        token: Party,
        balance: Amount,
        requested: Amount,
    },
}

impl LedgerError {
    /// classify the failure
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;

        match self {
            InvalidEraDuration
            | NoPrincipal
            | DivisionByZero
            | Overflow { .. }
            | InvalidRate { .. }
            | PaymentExceedsBalance { .. }
            | NoEras
            | InvalidAmount { .. }
            | InvalidRecipient { .. }
            | InvalidConfiguration { .. } => ErrorKind::InvalidInput,

            NotController { .. }
            | NotRegistrar { .. }
            | NotRegistry { .. }
            | NotOwnerOrApproved { .. }
            | NotTokenHolder { .. } => ErrorKind::PermissionDenied,

            UnknownLoan { .. }
            | NotOpen { .. }
            | InvalidAsset { .. }
            | AlreadyReserved { .. }
            | NonexistentToken { .. }
            | WrongOwner { .. }
            | NotNftOwner { .. }
            | UnknownCustody { .. } => ErrorKind::InvalidState,

            PaymentBelowMinimum { .. } | TotalPaymentBelowMinimum { .. } => {
                ErrorKind::InsufficientPayment
            }

            NotPayedOff { .. }
            | AlreadyPayedOff { .. }
            | NothingPastDue { .. }
            | NoCurrentEra { .. }
            | InsufficientAvailable { .. }
            | InsufficientPending { .. }
            | InsufficientTokenBalance { .. } => ErrorKind::PreconditionNotMet,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
