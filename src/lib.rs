pub mod api;
pub mod browser;
pub mod core;
pub mod engine;
pub mod resume;
pub mod storage;
pub mod supervisor;

// --- Primary core exports ---
pub use crate::core::types;
pub use crate::core::AppState;
pub use storage::Database;
pub use supervisor::Supervisor;
