pub mod ledger;
pub mod loan;
pub mod terms;
pub mod view;

pub use ledger::LoanLedger;
pub use loan::{Loan, LoanSnapshot};
pub use terms::{to_timestamp, LoanTerms, LoanTermsBuilder};
pub use view::{BalanceView, LoanView, ScheduleView};
