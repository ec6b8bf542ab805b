use std::io;
use web3_login_api::app;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> io::Result<()> {
    app::create_app().await
}
