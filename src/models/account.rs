use std::{fmt, str::FromStr};

use sha3::{Digest, Keccak256};

pub const ACCOUNT_LEN: usize = 20;

/// A 20 byte account address. Parsing ignores letter case, so two renderings of the
/// same bytes always compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Account([u8; ACCOUNT_LEN]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedAccount;

impl fmt::Display for MalformedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "address must be 40 hex digits with an optional 0x prefix")
    }
}

impl std::error::Error for MalformedAccount {}

impl Account {
    pub fn from_bytes(bytes: [u8; ACCOUNT_LEN]) -> Self {
        Account(bytes)
    }

    /// Derives the account from a 64 byte uncompressed public key (X || Y, no 0x04 tag).
    pub fn from_public_key(xy: &[u8; 64]) -> Self {
        let hash = Keccak256::digest(xy);
        let mut bytes = [0u8; ACCOUNT_LEN];
        bytes.copy_from_slice(&hash[12..]);
        Account(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_LEN] {
        &self.0
    }

    /// EIP-55 mixed case rendering, the form browser wallets hand out.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(2 + ACCOUNT_LEN * 2);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl FromStr for Account {
    type Err = MalformedAccount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if body.len() != ACCOUNT_LEN * 2 {
            return Err(MalformedAccount);
        }

        let mut bytes = [0u8; ACCOUNT_LEN];
        hex::decode_to_slice(body, &mut bytes).map_err(|_| MalformedAccount)?;
        Ok(Account(bytes))
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
