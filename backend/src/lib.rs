pub mod ai;
pub mod auth;
pub mod bills;
pub mod config;
pub mod entries;
pub mod error;
pub mod extract;
pub mod insights;
pub mod profile;
pub mod router;
pub mod server;
pub mod store;
pub mod voice;

pub use config::Config;
pub use error::{ApiError, Result};
pub use router::create_router;
pub use server::run_server;
pub use store::Store;

use std::sync::Arc;

/// Shared application state handed to every handler.
pub struct AppState {
    pub store: Store,
    pub config: Config,
    pub ai: Option<ai::OllamaClient>,
}

pub type SharedState = Arc<AppState>;
