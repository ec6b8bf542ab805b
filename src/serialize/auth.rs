use chrono::{NaiveDateTime, TimeZone, Utc};
use serde_derive::{Deserialize, Serialize};

use crate::models::challenge::Challenge;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoginReq {
    pub address: String,
    pub signature: String,
    pub message: String,
}

impl LoginReq {
    /// All three fields must carry something other than whitespace.
    pub fn is_complete(&self) -> bool {
        [&self.address, &self.signature, &self.message]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginRes {
    pub message: String,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChallengeRes {
    pub address: String,
    pub nonce: String,
    pub message: String,
    pub expires_at: i64,
}

impl From<&Challenge> for ChallengeRes {
    fn from(challenge: &Challenge) -> Self {
        ChallengeRes {
            address: challenge.address.to_string(),
            nonce: challenge.nonce.clone(),
            message: challenge.message.clone(),
            expires_at: timestamp(challenge.expires_at),
        }
    }
}

fn timestamp(at: NaiveDateTime) -> i64 {
    Utc.from_utc_datetime(&at).timestamp()
}
