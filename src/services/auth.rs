use std::panic::{self, AssertUnwindSafe};

use chrono::{Duration, Utc};

use crate::{
    config,
    models::{account::Account, challenge::Challenge, verification::FailureReason},
    repositories::challenge::ChallengeDao,
    serialize::{
        auth::{ChallengeRes, LoginReq, LoginRes},
        error::AppError,
    },
    services::verifier,
};

pub const LOGIN_SUCCESS: &str = "Login Success!";

#[derive(Clone, Debug)]
pub struct AuthSrv {
    challenge_dao: ChallengeDao,
    require_challenge: bool,
    challenge_ttl: Duration,
    challenge_statement: String,
}

/// Runs `f`, mapping a panic to a logged 500.
pub fn catch_panic<T, F: FnOnce() -> T>(f: F) -> Result<T, AppError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        log::error!("Web3 Login Error: {}", reason);
        AppError::internal()
    })
}

impl AuthSrv {
    pub fn new(
        challenge_dao: ChallengeDao,
        require_challenge: bool,
        challenge_ttl: Duration,
        challenge_statement: &str,
    ) -> Self {
        AuthSrv {
            challenge_dao,
            require_challenge,
            challenge_ttl,
            challenge_statement: challenge_statement.to_string(),
        }
    }

    pub fn from_config(challenge_dao: ChallengeDao) -> Self {
        let require_challenge: bool = config::get_or("require_challenge", false);
        let ttl: i64 = config::get_or("challenge_ttl_seconds", 300);
        let statement: String =
            config::get_or("challenge_statement", "Login into Web3 App!".to_string());

        AuthSrv::new(
            challenge_dao,
            require_challenge,
            Duration::seconds(ttl),
            &statement,
        )
    }

    pub fn requires_challenge(&self) -> bool {
        self.require_challenge
    }

    pub fn get_challenge(&self, address: &str) -> Result<ChallengeRes, AppError> {
        let account = address.parse::<Account>().map_err(|_| {
            log::warn!("Challenge requested for malformed address {:?}", address);
            AppError::invalid_data()
        })?;

        let challenge = Challenge::new(account, &self.challenge_statement, self.challenge_ttl);
        match self
            .challenge_dao
            .add_challenge(challenge, Utc::now().naive_utc())
        {
            Some(challenge) => {
                log::info!("Issued challenge for {}", account);
                Ok(ChallengeRes::from(&challenge))
            }
            None => {
                log::warn!("Challenge table full, refusing challenge for {}", account);
                Err(AppError::unavailable())
            }
        }
    }

    pub fn login(&self, req: LoginReq) -> Result<LoginRes, AppError> {
        if !req.is_complete() {
            log::warn!("Web3 login rejected: {}", FailureReason::ValidationError);
            return Err(AppError::invalid_data());
        }

        let result =
            catch_panic(|| verifier::verify(&req.message, &req.signature, &req.address))?;
        let recovered = match (result.accepted, result.recovered_address) {
            (true, Some(recovered)) => recovered,
            _ => {
                log::warn!(
                    "Web3 login rejected for {}: {} (recovered {:?})",
                    req.address,
                    result
                        .failure_reason
                        .unwrap_or(FailureReason::InternalError),
                    result.recovered_address.map(|a| a.to_string()),
                );
                return Err(AppError::verification_failed());
            }
        };

        if self.require_challenge {
            self.redeem_challenge(&recovered, &req.message)?;
        }

        log::info!("Web3 login success for {}", recovered);
        Ok(LoginRes {
            message: LOGIN_SUCCESS.to_string(),
            address: req.address,
        })
    }

    // Consumes only the exact challenge that was signed; replays and stale messages
    // leave every pending challenge untouched.
    fn redeem_challenge(&self, account: &Account, message: &str) -> Result<(), AppError> {
        let redeemed = Challenge::nonce_of(message).and_then(|nonce| {
            self.challenge_dao
                .take_matching(nonce, account, message, Utc::now().naive_utc())
        });

        if redeemed.is_none() {
            log::warn!(
                "Web3 login rejected for {}: {}",
                account,
                FailureReason::ChallengeRejected
            );
            return Err(AppError::verification_failed());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        serialize::error::{INVALID_DATA, VERIFICATION_FAILED},
        wallet::{sign_login, LocalWallet},
    };

    const KEY_A: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const KEY_B: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";
    const LOGIN_MESSAGE: &str = "Login into Laravel Web3 App!";

    fn srv(require_challenge: bool) -> AuthSrv {
        AuthSrv::new(
            ChallengeDao::new(100),
            require_challenge,
            Duration::seconds(60),
            "Login into Web3 App!",
        )
    }

    fn wallet(key: &str) -> LocalWallet {
        key.parse().unwrap()
    }

    fn address(key: &str) -> String {
        sign_login(&wallet(key), "").unwrap().address
    }

    #[test]
    fn test_login_success_echoes_address() {
        let req = sign_login(&wallet(KEY_A), LOGIN_MESSAGE).unwrap();

        let res = srv(false).login(req.clone()).unwrap();

        assert_eq!(res.message, LOGIN_SUCCESS);
        assert_eq!(res.address, req.address);
    }

    #[test]
    fn test_empty_signature_is_invalid_data() {
        let mut req = sign_login(&wallet(KEY_A), LOGIN_MESSAGE).unwrap();
        req.signature = String::new();

        let err = srv(false).login(req).unwrap_err();

        assert_eq!(err.code, 422);
        assert_eq!(err.message, INVALID_DATA);
    }

    #[test]
    fn test_mismatch_is_generic_401() {
        let mut req = sign_login(&wallet(KEY_A), LOGIN_MESSAGE).unwrap();
        req.address = address(KEY_B);

        let err = srv(false).login(req).unwrap_err();

        assert_eq!(err.code, 401);
        assert_eq!(err.message, VERIFICATION_FAILED);
    }

    #[test]
    fn test_malformed_inputs_are_same_generic_401() {
        let good = sign_login(&wallet(KEY_A), LOGIN_MESSAGE).unwrap();

        let mut bad_sig = good.clone();
        bad_sig.signature = "0x1234".to_string();
        let mut bad_addr = good;
        bad_addr.address = "0x1234".to_string();

        for req in [bad_sig, bad_addr] {
            assert_eq!(srv(false).login(req).unwrap_err(), AppError::verification_failed());
        }
    }

    #[test]
    fn test_catch_panic_maps_to_internal() {
        let ok = catch_panic(|| 7);
        assert_eq!(ok, Ok(7));

        let err = catch_panic(|| -> u8 { panic!("curve point exploded") }).unwrap_err();
        assert_eq!(err, AppError::internal());

        let err = catch_panic(|| -> u8 { panic!("{}", String::from("owned payload")) }).unwrap_err();
        assert_eq!(err.code, 500);
    }

    #[test]
    fn test_challenge_for_malformed_address() {
        assert_eq!(
            srv(false).get_challenge("nope").unwrap_err(),
            AppError::invalid_data()
        );
    }

    #[test]
    fn test_challenge_flow() {
        let auth = srv(true);
        let signer = wallet(KEY_A);

        let challenge = auth.get_challenge(&address(KEY_A)).unwrap();
        assert_eq!(challenge.address, address(KEY_A).to_lowercase());

        let req = sign_login(&signer, &challenge.message).unwrap();
        assert!(auth.login(req.clone()).is_ok());

        // single use
        assert_eq!(auth.login(req).unwrap_err(), AppError::verification_failed());
    }

    #[test]
    fn test_challenge_required_rejects_static_message() {
        let req = sign_login(&wallet(KEY_A), LOGIN_MESSAGE).unwrap();

        assert_eq!(
            srv(true).login(req).unwrap_err(),
            AppError::verification_failed()
        );
    }

    #[test]
    fn test_reissue_does_not_cancel_pending_challenge() {
        let auth = srv(true);
        let victim = wallet(KEY_A);

        let pending = auth.get_challenge(&address(KEY_A)).unwrap();
        let req = sign_login(&victim, &pending.message).unwrap();

        // anyone may request more challenges for the same address
        auth.get_challenge(&address(KEY_A)).unwrap();
        auth.get_challenge(&address(KEY_A)).unwrap();

        assert!(auth.login(req).is_ok());
    }

    #[test]
    fn test_replayed_login_does_not_burn_current_challenge() {
        let auth = srv(true);
        let victim = wallet(KEY_A);

        let first = auth.get_challenge(&address(KEY_A)).unwrap();
        let captured = sign_login(&victim, &first.message).unwrap();
        assert!(auth.login(captured.clone()).is_ok());

        let second = auth.get_challenge(&address(KEY_A)).unwrap();
        assert_eq!(auth.login(captured).unwrap_err(), AppError::verification_failed());

        let req = sign_login(&victim, &second.message).unwrap();
        assert!(auth.login(req).is_ok());
    }

    #[test]
    fn test_challenge_of_other_account_is_rejected() {
        let auth = srv(true);
        let challenge = auth.get_challenge(&address(KEY_A)).unwrap();

        let req = sign_login(&wallet(KEY_B), &challenge.message).unwrap();
        assert_eq!(auth.login(req).unwrap_err(), AppError::verification_failed());

        let req = sign_login(&wallet(KEY_A), &challenge.message).unwrap();
        assert!(auth.login(req).is_ok());
    }

    #[test]
    fn test_challenge_survives_forged_attempts() {
        let auth = srv(true);
        let challenge = auth.get_challenge(&address(KEY_A)).unwrap();

        let mut forged = sign_login(&wallet(KEY_B), &challenge.message).unwrap();
        forged.address = address(KEY_A);
        assert!(auth.login(forged).is_err());

        let req = sign_login(&wallet(KEY_A), &challenge.message).unwrap();
        assert!(auth.login(req).is_ok());
    }

    #[test]
    fn test_expired_challenge_is_rejected() {
        let auth = AuthSrv::new(ChallengeDao::new(100), true, Duration::seconds(0), "x");
        let challenge = auth.get_challenge(&address(KEY_A)).unwrap();

        let req = sign_login(&wallet(KEY_A), &challenge.message).unwrap();
        assert_eq!(auth.login(req).unwrap_err(), AppError::verification_failed());
    }

    #[test]
    fn test_challenge_table_is_bounded() {
        let dao = ChallengeDao::new(50);
        let auth = AuthSrv::new(dao.clone(), true, Duration::seconds(60), "x");

        for i in 0..50u8 {
            let mut bytes = [0u8; 20];
            bytes[0] = i;
            let account = Account::from_bytes(bytes);
            auth.get_challenge(&account.to_string()).unwrap();
        }

        assert_eq!(
            auth.get_challenge(&address(KEY_A)).unwrap_err(),
            AppError::unavailable()
        );
        assert_eq!(dao.len(), 50);
    }
}
