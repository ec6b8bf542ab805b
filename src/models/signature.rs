use std::{fmt, str::FromStr};

use secp256k1::constants::CURVE_ORDER;

use super::verification::FailureReason;

pub const SIGNATURE_LEN: usize = 65;

/// n / 2 for secp256k1. Signatures with `s` above it are the malleable twin (EIP-2).
pub const HALF_CURVE_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// A decoded `r || s || v` signature. Construction through [`Signature::from_bytes`] or
/// [`FromStr`] guarantees r and s are in `[1, n)` and v maps to a recovery id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
    v: u8,
}

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FailureReason> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(FailureReason::MalformedSignature);
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        let v = bytes[64];

        // big-endian byte arrays order the same way as the integers they encode
        for scalar in [&r, &s] {
            if *scalar == [0u8; 32] || *scalar >= CURVE_ORDER {
                return Err(FailureReason::MalformedSignature);
            }
        }
        if normalize_v(v).is_none() {
            return Err(FailureReason::MalformedSignature);
        }

        Ok(Signature { r, s, v })
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    pub fn v(&self) -> u8 {
        self.v
    }

    /// Recovery id in `{0, 1}`.
    pub fn recovery_id(&self) -> u8 {
        // checked at construction
        normalize_v(self.v).unwrap_or_default()
    }

    pub fn is_low_s(&self) -> bool {
        self.s <= HALF_CURVE_ORDER
    }

    /// `r || s`, the layout secp256k1 calls compact.
    pub fn compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&self.compact());
        out[64] = self.v;
        out
    }
}

fn normalize_v(v: u8) -> Option<u8> {
    match v {
        0 | 27 => Some(0),
        1 | 28 => Some(1),
        _ => None,
    }
}

impl FromStr for Signature {
    type Err = FailureReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(body).map_err(|_| FailureReason::MalformedSignature)?;
        Signature::from_bytes(&bytes)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}
