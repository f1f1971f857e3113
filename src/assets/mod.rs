pub mod fungible;
pub mod nft;
pub mod registrar;
pub mod registry;

pub use fungible::{FungibleDeposit, FungiblePoolRegistrar};
pub use nft::{InMemoryNftBank, NftBank, NftCustodyRegistrar, NftToken};
pub use registrar::{AssetRegistrar, MockRegistrar};
pub use registry::AssetRegistry;
