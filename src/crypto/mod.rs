pub mod certificate;
pub mod compact;
pub mod hashing;
pub mod keys;
pub mod password;
