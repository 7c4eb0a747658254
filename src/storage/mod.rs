pub mod wallet;

pub use wallet::{FileSystemWallet, InMemoryWallet, Wallet, WalletError};
