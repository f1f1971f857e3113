pub mod assets;
pub mod config;
pub mod errors;
pub mod events;
pub mod interest;
pub mod loans;
pub mod payments;
pub mod rights;
pub mod sync;
pub mod types;
pub mod units;

// re-export key types
pub use assets::{
    AssetRegistrar, AssetRegistry, FungibleDeposit, FungiblePoolRegistrar, InMemoryNftBank,
    MockRegistrar, NftBank, NftCustodyRegistrar, NftToken,
};
pub use config::{
    AssetRegistryConfig, LedgerConfig, PaymentsConfig, ReleasePolicy, RightsRegistryConfig,
};
pub use errors::{ErrorKind, LedgerError, Result};
pub use events::{Event, EventStore};
pub use interest::{
    accrue_many, accrue_once, compound, div, growth_factor, mul, pow, to_percent, AccrualEngine,
    EraAccrual,
};
pub use loans::{Loan, LoanLedger, LoanSnapshot, LoanTerms, LoanTermsBuilder, LoanView};
pub use payments::{InMemoryTokenBank, PaymentsManager, TokenBank};
pub use rights::{borrower_token, lender_token, loan_of, role_of, RightsRegistry};
pub use sync::Shared;
pub use types::{AssetId, LoanId, LoanStatus, Party, RightsTokenId, Role, Timestamp};
pub use units::{Amount, Rate, SCALE};

// re-export external dependencies that users will need
pub use alloy_primitives::U256;
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
