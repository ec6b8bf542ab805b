use std::env;

use anyhow::{Context, Result};
use web3_login_api::wallet::{sign_login, LocalWallet, WalletProvider};

const DEFAULT_MESSAGE: &str = "Login into Laravel Web3 App!";

// Usage: sign_message [private_key] [message]
// The key falls back to APP_PRIVATE_KEY.
fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let mut args = env::args().skip(1);

    let key = match args.next() {
        Some(key) => key,
        None => env::var("APP_PRIVATE_KEY").context("pass a private key or set APP_PRIVATE_KEY")?,
    };
    let message = args.next().unwrap_or_else(|| DEFAULT_MESSAGE.to_string());

    let wallet: LocalWallet = key.parse()?;
    eprintln!("signer {}", wallet.account()?.to_checksum());

    let req = sign_login(&wallet, &message)?;
    println!("{}", serde_json::to_string_pretty(&req)?);

    Ok(())
}
