pub mod config;
pub mod extractor;
pub mod filter;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod scraper;
pub mod ticket_checker;
pub mod utils;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
