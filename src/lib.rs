pub mod app;
pub mod auth;
pub mod backend;
pub mod config;
pub mod errors;
pub mod export;
pub mod fetcher;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod stats;
pub mod storage;
pub mod store;
pub mod ui;
pub mod state;

pub use app::router;
pub use config::Config;
pub use fetcher::Poller;
pub use state::AppState;
pub use storage::LocalStore;
