use chrono::{Duration, NaiveDateTime, Utc};
use uuid::Uuid;

use super::account::Account;

const NONCE_LABEL: &str = "\nNonce: ";

#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    pub address: Account,
    pub nonce: String,
    pub message: String,
    pub expires_at: NaiveDateTime,
}

impl Challenge {
    pub fn new(address: Account, statement: &str, ttl: Duration) -> Challenge {
        let nonce = Uuid::new_v4().to_string();
        Challenge {
            message: format!("{}\n\nAddress: {}{}{}", statement, address, NONCE_LABEL, nonce),
            address,
            nonce,
            expires_at: Utc::now().naive_utc() + ttl,
        }
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now >= self.expires_at
    }

    /// Nonce on the last line of a signed challenge message, if any.
    pub fn nonce_of(message: &str) -> Option<&str> {
        message
            .rsplit_once(NONCE_LABEL)
            .map(|(_, nonce)| nonce)
            .filter(|nonce| !nonce.is_empty() && !nonce.contains('\n'))
    }
}
