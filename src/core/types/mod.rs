//! Core type definitions for procmem
//!
//! Addresses in a target process, module and process enumeration records,
//! byte signatures, and the error taxonomy shared by every operation.

mod address;
mod error;
mod module_info;
mod pattern;
mod protection;

pub use address::Address;
pub use error::{AccessDirection, AddressParseError, MemoryError, MemoryResult, OsFailure};
pub use module_info::{ModuleEntry, ModuleInfo, ProcessEntry};
pub use pattern::{Pattern, PatternBuilder, PatternByte, PatternParseError};
pub use protection::Protection;

/// Opaque OS process identifier; reused by the OS after the process exits
pub type ProcessId = u32;
