//! Memory operations on another process: typed access, protection and pattern scanning
//!
//! - [`accessor`]: one-call typed and raw reads/writes and protection changes
//! - [`protection`]: protection changes that restore themselves
//! - [`scanner`]: masked byte-pattern search, whole-range or in bounded steps
//! - [`wrapper`]: [`ProcessMemory`], an attached process owning its handle

pub mod accessor;
pub mod protection;
pub mod scanner;
pub mod wrapper;

pub use protection::{with_writable, ProtectionGuard};
pub use scanner::{
    pattern_scan, pattern_scan_masked, PatternScan, ScanOutcome, ScanStep, DEFAULT_STEP_BUDGET,
};
pub use wrapper::{ProcessMemory, SharedProcessMemory};
