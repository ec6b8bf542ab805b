use std::fmt;

use super::account::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Missing or non-string request fields, rejected before verification.
    ValidationError,
    MalformedSignature,
    MalformedAddress,
    /// Signature decodes but does not recover to a public key (includes high-s).
    RecoveryFailed,
    /// Valid signature for a different account.
    AddressMismatch,
    /// The signed message is not the live challenge issued for the account.
    ChallengeRejected,
    InternalError,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::ValidationError => "validation error",
            FailureReason::MalformedSignature => "malformed signature",
            FailureReason::MalformedAddress => "malformed address",
            FailureReason::RecoveryFailed => "public key recovery failed",
            FailureReason::AddressMismatch => "recovered address does not match",
            FailureReason::ChallengeRejected => "challenge missing, expired or mismatched",
            FailureReason::InternalError => "internal error",
        };
        f.write_str(s)
    }
}

impl std::error::Error for FailureReason {}

/// Outcome of one verification. `recovered_address` may be set on rejection and is only
/// meant for audit logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub accepted: bool,
    pub recovered_address: Option<Account>,
    pub failure_reason: Option<FailureReason>,
}

impl VerificationResult {
    pub fn accepted(recovered: Account) -> Self {
        VerificationResult {
            accepted: true,
            recovered_address: Some(recovered),
            failure_reason: None,
        }
    }

    pub fn rejected(reason: FailureReason, recovered: Option<Account>) -> Self {
        VerificationResult {
            accepted: false,
            recovered_address: recovered,
            failure_reason: Some(reason),
        }
    }
}
