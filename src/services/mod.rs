pub mod auth;
pub mod verifier;
