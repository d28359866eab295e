// Library crate for taipo - enables testing and benchmarking

pub mod candidates;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod extract;
pub mod hook;
pub mod input;
pub mod openai;
pub mod pipeline;
pub mod policy;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::{AppConfig, AutomationMode, RunContext};
pub use error::{Result, TaipoError};
