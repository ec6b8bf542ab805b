use once_cell::sync::Lazy;
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, Secp256k1, VerifyOnly,
};
use sha3::{Digest, Keccak256};

use crate::models::{
    account::Account,
    signature::Signature,
    verification::{FailureReason, VerificationResult},
};

pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

static SECP: Lazy<Secp256k1<VerifyOnly>> = Lazy::new(Secp256k1::verification_only);

/// keccak256("\x19Ethereum Signed Message:\n" ++ len(message) ++ message)
pub fn hash_message(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message.as_bytes());

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

// high-s signatures are refused
pub fn recover_account(message: &str, signature: &Signature) -> Result<Account, FailureReason> {
    if !signature.is_low_s() {
        return Err(FailureReason::RecoveryFailed);
    }

    let rec_id = RecoveryId::from_i32(i32::from(signature.recovery_id()))
        .map_err(|_| FailureReason::MalformedSignature)?;
    let sig = RecoverableSignature::from_compact(&signature.compact(), rec_id)
        .map_err(|_| FailureReason::MalformedSignature)?;
    let digest = Message::from_digest(hash_message(message));

    let public_key = SECP
        .recover_ecdsa(&digest, &sig)
        .map_err(|_| FailureReason::RecoveryFailed)?;

    let uncompressed = public_key.serialize_uncompressed();
    let mut xy = [0u8; 64];
    xy.copy_from_slice(&uncompressed[1..]);
    Ok(Account::from_public_key(&xy))
}

pub fn verify(message: &str, signature: &str, claimed_address: &str) -> VerificationResult {
    let signature = match signature.parse::<Signature>() {
        Ok(sig) => sig,
        Err(reason) => return VerificationResult::rejected(reason, None),
    };
    let claimed = match claimed_address.parse::<Account>() {
        Ok(account) => account,
        Err(_) => return VerificationResult::rejected(FailureReason::MalformedAddress, None),
    };

    match recover_account(message, &signature) {
        Ok(recovered) if recovered == claimed => VerificationResult::accepted(recovered),
        Ok(recovered) => {
            VerificationResult::rejected(FailureReason::AddressMismatch, Some(recovered))
        }
        Err(reason) => VerificationResult::rejected(reason, None),
    }
}
