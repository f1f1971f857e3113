pub mod accrual;
pub mod compound;
pub mod fixed;

pub use accrual::{accrue_many, accrue_once, interest_on, AccrualEngine, EraAccrual};
pub use compound::{compound, growth_factor};
pub use fixed::{div, mul, pow, to_percent};
