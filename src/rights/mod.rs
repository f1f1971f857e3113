pub mod ownership;
pub mod registry;

pub use ownership::OwnershipTable;
pub use registry::{borrower_token, lender_token, loan_of, role_of, RightsRegistry};
