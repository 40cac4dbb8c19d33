pub mod admin;
pub mod agents;
pub mod cron;
pub mod health;
pub mod leaderboard;
