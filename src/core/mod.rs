//! Core module containing the fundamental types of procmem

pub mod types;

pub use types::{
    Address, MemoryError, MemoryResult, ModuleEntry, ModuleInfo, OsFailure, Pattern,
    ProcessEntry, ProcessId, Protection,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
