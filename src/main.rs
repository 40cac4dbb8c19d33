use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

use wins_backend::config::Config;
use wins_backend::controllers;
use wins_backend::db::Database;
use wins_backend::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    if config.cron_secret.is_none() {
        log::warn!("CRON_SECRET not set - cron endpoints will reject all requests");
    }
    if config.email.is_some() {
        log::info!("Weekly summary email dispatch enabled");
    } else {
        log::info!("No email credentials configured - weekly summaries will not be mailed");
    }

    log::info!("Starting wins-backend server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::agents::config)
            .configure(controllers::leaderboard::config)
            .configure(controllers::cron::config)
            .configure(controllers::admin::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
