// Re-export modules
pub mod analysis;
pub mod config;
pub mod crawlers;
pub mod debug_store;
pub mod error;
pub mod filter;
pub mod llm;
pub mod parsers;
pub mod results;
pub mod server;
pub mod status;
pub mod translate;
pub mod utils;

// Re-export commonly used types for convenience
pub use analysis::{AnalysisMode, AnalysisRequest, Analyzer, Language};
pub use config::AppConfig;
pub use results::PageRecord;
pub use status::{InMemoryStatusStore, StatusStore, TaskStatus, TaskStep};
