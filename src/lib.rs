pub mod app;
pub mod clock;
pub mod config;
pub mod errors;
pub mod goals;
pub mod handlers;
pub mod leaderboard;
pub mod models;
pub mod progress;
pub mod scheduler;
pub mod state;
pub mod stats;
pub mod storage;
pub mod streak;
pub mod timekeeping;
pub mod tracker;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::Store;
pub use tracker::{Tracker, TrackerSettings};
