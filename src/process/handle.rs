//! Owned process handle with RAII semantics

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId, Protection};
use crate::system::{RawHandle, SystemApi};
use crate::windows::utils::ErrorCode;
use std::fmt;
use tracing::{debug, trace};

/// Access rights for process handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAccess {
    value: u32,
}

impl ProcessAccess {
    /// Read memory access
    pub const VM_READ: Self = Self { value: 0x0010 };
    /// Write memory access
    pub const VM_WRITE: Self = Self { value: 0x0020 };
    /// Protection changes and other address-space operations
    pub const VM_OPERATION: Self = Self { value: 0x0008 };
    /// Rights needed for read, write and protect
    pub const MEMORY: Self = Self { value: 0x0038 };

    /// Combine access rights
    pub const fn combine(rights: &[Self]) -> Self {
        let mut value = 0;
        let mut i = 0;
        while i < rights.len() {
            value |= rights[i].value;
            i += 1;
        }
        Self { value }
    }

    /// Every right in `other` is also granted by `self`
    pub const fn contains(&self, other: Self) -> bool {
        self.value & other.value == other.value
    }

    /// Get raw value
    pub const fn value(&self) -> u32 {
        self.value
    }
}

/// A process handle owned exclusively by this value.
///
/// The handle is released exactly once, when the value is dropped, so it can
/// never be used after release. `A` is the OS service the handle came from.
pub struct ProcessHandle<A: SystemApi> {
    api: A,
    raw: RawHandle,
    pid: ProcessId,
    access: ProcessAccess,
}

impl<A: SystemApi> ProcessHandle<A> {
    /// Open a non-inheritable handle to `pid` with the given rights
    pub fn open(api: A, pid: ProcessId, access: ProcessAccess) -> MemoryResult<Self> {
        match api.open_process(pid, access) {
            Ok(raw) => {
                debug!(pid, handle = raw.0, access = access.value(), "process handle opened");
                Ok(ProcessHandle {
                    api,
                    raw,
                    pid,
                    access,
                })
            }
            Err(code) => {
                debug!(pid, code, "failed to open process");
                Err(MemoryError::attach(pid, code))
            }
        }
    }

    /// Open a process for reading memory
    pub fn open_for_read(api: A, pid: ProcessId) -> MemoryResult<Self> {
        Self::open(api, pid, ProcessAccess::VM_READ)
    }

    /// Open a process for reading, writing and re-protecting memory
    pub fn open_for_read_write(api: A, pid: ProcessId) -> MemoryResult<Self> {
        Self::open(api, pid, ProcessAccess::MEMORY)
    }

    /// Get the process ID
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Get the access rights
    pub fn access(&self) -> ProcessAccess {
        self.access
    }

    /// The raw OS handle; only valid while `self` is alive
    pub fn raw(&self) -> RawHandle {
        self.raw
    }

    /// The OS service this handle belongs to
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fill `buffer` from remote memory; a short transfer is a failure
    pub fn read_memory(&self, address: Address, buffer: &mut [u8]) -> MemoryResult<()> {
        trace!(pid = self.pid, %address, len = buffer.len(), "read");
        match self.api.read_memory(self.raw, address, buffer) {
            Ok(n) if n == buffer.len() => Ok(()),
            Ok(_) => Err(MemoryError::read(self.pid, address, ErrorCode::PartialCopy)),
            Err(code) => Err(MemoryError::read(self.pid, address, code)),
        }
    }

    /// Copy `data` into remote memory; a short transfer is a failure
    pub fn write_memory(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        trace!(pid = self.pid, %address, len = data.len(), "write");
        match self.api.write_memory(self.raw, address, data) {
            Ok(n) if n == data.len() => Ok(()),
            Ok(_) => Err(MemoryError::write(self.pid, address, ErrorCode::PartialCopy)),
            Err(code) => Err(MemoryError::write(self.pid, address, code)),
        }
    }

    /// Change the protection of `size` bytes at `address`, returning the previous protection
    pub fn protect_memory(
        &self,
        address: Address,
        size: usize,
        protection: Protection,
    ) -> MemoryResult<Protection> {
        match self
            .api
            .protect_memory(self.raw, address, size, protection.raw())
        {
            Ok(old) => {
                debug!(pid = self.pid, %address, size, %protection, old = %Protection::new(old), "protection changed");
                Ok(Protection::new(old))
            }
            Err(code) => Err(MemoryError::protect(self.pid, address, code)),
        }
    }
}

impl<A: SystemApi> Drop for ProcessHandle<A> {
    fn drop(&mut self) {
        self.api.close_handle(self.raw);
        debug!(pid = self.pid, handle = self.raw.0, "process handle released");
    }
}

impl<A: SystemApi> fmt::Debug for ProcessHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("handle", &format!("0x{:X}", self.raw.0))
            .field("access", &format!("0x{:X}", self.access.value()))
            .finish()
    }
}

impl<A: SystemApi> fmt::Display for ProcessHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessHandle(pid={})", self.pid)
    }
}
