//! Common utilities and shared infrastructure
//!
//! - Error handling and the unified API response envelope
//! - Logging setup

pub mod error;
pub mod logger;

// Re-export commonly used items
pub use error::{ok, AppError, AppResponse, AppResult};
pub use logger::init_logger;
