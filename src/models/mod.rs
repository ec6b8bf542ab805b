pub mod account;
pub mod challenge;
pub mod signature;
pub mod verification;
