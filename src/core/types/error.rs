//! Error types for remote memory operations

use super::{Address, ProcessId};
use crate::windows::utils::ErrorCode;
use std::fmt;
use thiserror::Error;

/// Context shared by every failure: which process, where, and what the OS said.
///
/// Captured at the moment of failure so callers never need to re-query state
/// that may already have changed (process exited, module unloaded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsFailure {
    pub pid: ProcessId,
    pub address: Option<Address>,
    pub code: ErrorCode,
}

impl OsFailure {
    /// Failure that is not tied to a particular address
    pub fn new(pid: ProcessId, code: impl Into<ErrorCode>) -> Self {
        OsFailure {
            pid,
            address: None,
            code: code.into(),
        }
    }

    /// Failure at a specific remote address
    pub fn at(pid: ProcessId, address: Address, code: impl Into<ErrorCode>) -> Self {
        OsFailure {
            pid,
            address: Some(address),
            code: code.into(),
        }
    }
}

impl fmt::Display for OsFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "process {}", self.pid)?;
        if let Some(address) = self.address {
            write!(f, " at {}", address)?;
        }
        write!(f, ": {}", self.code)
    }
}

/// Direction of a failed memory access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDirection {
    Read,
    Write,
}

/// Failure of an operation at the OS boundary.
///
/// "Nothing there" outcomes (no process, no module, no pattern match) are
/// never errors; they are reported as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("failed to attach to {0}")]
    Attach(OsFailure),

    #[error("failed to read memory of {0}")]
    Read(OsFailure),

    #[error("failed to write memory of {0}")]
    Write(OsFailure),

    #[error("failed to change memory protection of {0}")]
    Protect(OsFailure),

    #[error("failed to enumerate {0}")]
    Enumerate(OsFailure),
}

/// Result type alias for memory operations
pub type MemoryResult<T> = Result<T, MemoryError>;

impl MemoryError {
    pub fn attach(pid: ProcessId, code: impl Into<ErrorCode>) -> Self {
        MemoryError::Attach(OsFailure::new(pid, code))
    }

    pub fn read(pid: ProcessId, address: Address, code: impl Into<ErrorCode>) -> Self {
        MemoryError::Read(OsFailure::at(pid, address, code))
    }

    pub fn write(pid: ProcessId, address: Address, code: impl Into<ErrorCode>) -> Self {
        MemoryError::Write(OsFailure::at(pid, address, code))
    }

    pub fn protect(pid: ProcessId, address: Address, code: impl Into<ErrorCode>) -> Self {
        MemoryError::Protect(OsFailure::at(pid, address, code))
    }

    pub fn enumerate(pid: ProcessId, code: impl Into<ErrorCode>) -> Self {
        MemoryError::Enumerate(OsFailure::new(pid, code))
    }

    /// The diagnostic payload carried by every variant
    pub fn failure(&self) -> &OsFailure {
        match self {
            MemoryError::Attach(f)
            | MemoryError::Read(f)
            | MemoryError::Write(f)
            | MemoryError::Protect(f)
            | MemoryError::Enumerate(f) => f,
        }
    }

    pub fn pid(&self) -> ProcessId {
        self.failure().pid
    }

    pub fn address(&self) -> Option<Address> {
        self.failure().address
    }

    pub fn os_code(&self) -> ErrorCode {
        self.failure().code
    }

    /// Read and write failures form one family, told apart only by direction
    pub fn access_direction(&self) -> Option<AccessDirection> {
        match self {
            MemoryError::Read(_) => Some(AccessDirection::Read),
            MemoryError::Write(_) => Some(AccessDirection::Write),
            _ => None,
        }
    }

    pub fn is_access_failure(&self) -> bool {
        self.access_direction().is_some()
    }
}

/// Error returned when parsing an [`Address`] from text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid address: {0:?}")]
pub struct AddressParseError(pub String);
