use std::time::Duration;

use crate::{config, handlers::auth, repositories::challenge::ChallengeDao, services};
use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use chrono::Utc;
use tracing_subscriber::EnvFilter;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    auth::route(cfg);
}

/// Installs the log backend. `RUST_LOG` wins over the configured `log_level`.
pub fn init_logging() {
    let log_level: String = config::get_or("log_level", "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if let Err(err) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("logger already initialized: {}", err);
    }
}

/// Drops expired challenges every `period`, so the table never waits for a full
/// capacity sweep to shrink.
pub fn spawn_challenge_purge(challenge_dao: ChallengeDao, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let purged = challenge_dao.purge_expired(Utc::now().naive_utc());
            if purged > 0 {
                log::debug!(
                    "Purged {} expired challenges, {} pending",
                    purged,
                    challenge_dao.len()
                );
            }
        }
    });
}

pub async fn create_app() -> std::io::Result<()> {
    init_logging();

    let capacity: usize = config::get_or("challenge_capacity", 10_000);
    let purge_seconds: u64 = config::get_or("challenge_purge_seconds", 60);
    let challenge_dao = ChallengeDao::new(capacity);
    spawn_challenge_purge(challenge_dao.clone(), Duration::from_secs(purge_seconds.max(1)));

    let auth_service = web::Data::new(services::auth::AuthSrv::from_config(challenge_dao));

    let listen_address: String = config::get_or("listen_address", "127.0.0.1:8080".to_string());

    log::info!(
        "Listening and serving HTTP on {} (challenge required: {})",
        listen_address,
        auth_service.requires_challenge()
    );

    HttpServer::new(move || {
        let cors: Cors = Cors::default()
            .allow_any_origin()
            .allow_any_header()
            .allow_any_method()
            .max_age(3600);

        App::new()
            .app_data(auth_service.clone())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(init_routes)
    })
    .bind(listen_address)?
    .run()
    .await
}
