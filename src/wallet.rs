use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};

use crate::{
    models::{account::Account, signature::Signature},
    serialize::auth::LoginReq,
    services::verifier::hash_message,
};

static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Whatever holds the user's key, e.g. an injected browser wallet.
pub trait WalletProvider {
    fn account(&self) -> Result<Account>;
    fn sign_message(&self, message: &str) -> Result<Signature>;
}

pub fn sign_login<W: WalletProvider + ?Sized>(wallet: &W, message: &str) -> Result<LoginReq> {
    let account = wallet.account()?;
    let signature = wallet.sign_message(message)?;

    Ok(LoginReq {
        address: account.to_checksum(),
        message: message.to_string(),
        signature: signature.to_string(),
    })
}

#[derive(Clone)]
pub struct LocalWallet {
    secret_key: SecretKey,
}

impl LocalWallet {
    pub fn new(secret_key: SecretKey) -> Self {
        LocalWallet { secret_key }
    }
}

impl FromStr for LocalWallet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .context("private key is not valid hex")?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|e| anyhow!("invalid private key: {}", e))?;
        Ok(LocalWallet::new(secret_key))
    }
}

impl WalletProvider for LocalWallet {
    fn account(&self) -> Result<Account> {
        let public_key = PublicKey::from_secret_key(&*SECP, &self.secret_key);
        let uncompressed = public_key.serialize_uncompressed();

        let mut xy = [0u8; 64];
        xy.copy_from_slice(&uncompressed[1..]);
        Ok(Account::from_public_key(&xy))
    }

    fn sign_message(&self, message: &str) -> Result<Signature> {
        let digest = Message::from_digest(hash_message(message));
        let (rec_id, compact) = SECP
            .sign_ecdsa_recoverable(&digest, &self.secret_key)
            .serialize_compact();

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&compact);
        bytes[64] = 27 + rec_id.to_i32() as u8;
        Ok(Signature::from_bytes(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::verifier::verify;

    #[test]
    fn test_known_addresses() {
        let wallet: LocalWallet = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
            .parse()
            .unwrap();
        assert_eq!(
            wallet.account().unwrap().to_checksum(),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );

        let wallet: LocalWallet = "0000000000000000000000000000000000000000000000000000000000000001"
            .parse()
            .unwrap();
        assert_eq!(
            wallet.account().unwrap().to_checksum(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!("0x1234".parse::<LocalWallet>().is_err());
        assert!("zz".parse::<LocalWallet>().is_err());
        assert!("0x0000000000000000000000000000000000000000000000000000000000000000"
            .parse::<LocalWallet>()
            .is_err());
    }

    #[test]
    fn test_signatures_are_deterministic_and_low_s() {
        let wallet: LocalWallet = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
            .parse()
            .unwrap();

        let first = wallet.sign_message("hello").unwrap();
        let second = wallet.sign_message("hello").unwrap();

        assert_eq!(first, second);
        assert!(first.is_low_s());
        assert!(first.v() == 27 || first.v() == 28);
    }

    #[test]
    fn test_sign_login_verifies() {
        let wallet: LocalWallet = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
            .parse()
            .unwrap();

        let req = sign_login(&wallet, "Login into Laravel Web3 App!").unwrap();

        assert_eq!(req.address, "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23");
        assert!(verify(&req.message, &req.signature, &req.address).accepted);
    }
}
