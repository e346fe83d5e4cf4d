pub mod config;
pub mod error;
pub mod safety;
pub mod types;

pub use config::AskDbConfig;
pub use error::{AskDbError, Result};
pub use safety::{SafetyGate, SafetyVerdict, BLOCKED_KEYWORDS};
pub use types::*;
