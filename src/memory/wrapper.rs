//! An attached process: one owned handle plus every memory operation on it

use crate::core::types::{Address, MemoryResult, ModuleInfo, Pattern, ProcessId, Protection};
use crate::memory::accessor;
use crate::memory::protection::ProtectionGuard;
use crate::memory::scanner::{self, PatternScan};
use crate::process::{modules, ProcessHandle};
use crate::system::SystemApi;
use bytemuck::Pod;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Owns exactly one [`ProcessHandle`] and routes accessor and scanner calls through it
pub struct ProcessMemory<A: SystemApi> {
    handle: ProcessHandle<A>,
}

impl<A: SystemApi> ProcessMemory<A> {
    /// Open `pid` with read, write and protect rights
    pub fn attach(api: A, pid: ProcessId) -> MemoryResult<Self> {
        let handle = accessor::open(api, pid)?;
        Ok(Self { handle })
    }

    /// Take ownership of an already opened handle
    pub fn from_handle(handle: ProcessHandle<A>) -> Self {
        Self { handle }
    }

    pub fn pid(&self) -> ProcessId {
        self.handle.pid()
    }

    pub fn handle(&self) -> &ProcessHandle<A> {
        &self.handle
    }

    pub fn read<T: Pod>(&self, address: Address) -> MemoryResult<T> {
        accessor::read(&self.handle, address)
    }

    pub fn write<T: Pod>(&self, address: Address, value: T) -> MemoryResult<()> {
        accessor::write(&self.handle, address, value)
    }

    pub fn read_bytes(&self, address: Address, size: usize) -> MemoryResult<Vec<u8>> {
        accessor::read_bytes(&self.handle, address, size)
    }

    pub fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        accessor::write_bytes(&self.handle, address, data)
    }

    /// Change protection over `size_of::<T>()` bytes, returning the previous protection
    pub fn protect<T>(&self, address: Address, protection: Protection) -> MemoryResult<Protection> {
        accessor::protect::<T, A>(&self.handle, address, protection)
    }

    pub fn protect_region(
        &self,
        address: Address,
        size: usize,
        protection: Protection,
    ) -> MemoryResult<Protection> {
        accessor::protect_region(&self.handle, address, size, protection)
    }

    /// Change protection until the returned guard is dropped
    pub fn protect_scoped(
        &self,
        address: Address,
        size: usize,
        protection: Protection,
    ) -> MemoryResult<ProtectionGuard<'_, A>> {
        ProtectionGuard::new(&self.handle, address, size, protection)
    }

    pub fn pattern_scan(
        &self,
        start: Address,
        length: usize,
        pattern: &Pattern,
    ) -> MemoryResult<Option<Address>> {
        scanner::pattern_scan(&self.handle, start, length, pattern)
    }

    pub fn pattern_scan_masked(
        &self,
        start: Address,
        length: usize,
        mask: &str,
        bytes: &[u8],
    ) -> MemoryResult<Option<Address>> {
        scanner::pattern_scan_masked(&self.handle, start, length, mask, bytes)
    }

    /// Resumable scan over `start..start + length`
    pub fn scan(&self, start: Address, length: usize, pattern: Pattern) -> PatternScan<'_, A> {
        PatternScan::new(&self.handle, start, length, pattern)
    }

    /// Base and size of `module_name` in the attached process
    pub fn module_info(&self, module_name: &str) -> MemoryResult<Option<ModuleInfo>> {
        modules::resolve_module_info(self.handle.api(), module_name, self.pid())
    }

    /// Attach to `pid` instead.
    ///
    /// The current handle is released before the new one is opened, so at no
    /// point are two handles alive. On failure nothing remains attached.
    pub fn retarget(self, pid: ProcessId) -> MemoryResult<Self>
    where
        A: Clone,
    {
        let api = self.handle.api().clone();
        debug!(from = self.pid(), to = pid, "retargeting");
        drop(self);
        Self::attach(api, pid)
    }

    /// Move into a mutex so several threads can share the handle
    pub fn into_shared(self) -> SharedProcessMemory<A> {
        SharedProcessMemory {
            inner: Arc::new(Mutex::new(self)),
        }
    }
}

impl<A: SystemApi> fmt::Debug for ProcessMemory<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessMemory")
            .field("handle", &self.handle)
            .finish()
    }
}

/// Cloneable, thread-safe access to one [`ProcessMemory`].
///
/// Each [`with`](Self::with) call holds the lock for its whole closure, so a
/// read-modify-write inside one call is not interleaved with other users.
pub struct SharedProcessMemory<A: SystemApi> {
    inner: Arc<Mutex<ProcessMemory<A>>>,
}

impl<A: SystemApi> SharedProcessMemory<A> {
    pub fn with<R>(&self, f: impl FnOnce(&ProcessMemory<A>) -> R) -> R {
        // Operations never leave ProcessMemory half-updated, so a poisoned lock is still usable
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn pid(&self) -> ProcessId {
        self.with(|mem| mem.pid())
    }
}

impl<A: SystemApi> Clone for SharedProcessMemory<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: SystemApi> fmt::Debug for SharedProcessMemory<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedProcessMemory")
            .field("pid", &self.pid())
            .finish()
    }
}
