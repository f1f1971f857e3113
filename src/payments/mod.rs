pub mod bank;
pub mod manager;

pub use bank::{InMemoryTokenBank, TokenBank};
pub use manager::PaymentsManager;
