pub mod config;
pub mod controllers;
pub mod db;
pub mod feedback;
pub mod models;
pub mod ranking;
pub mod summary;

use std::sync::Arc;

use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
}
