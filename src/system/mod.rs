//! Contract with the operating system's process and memory services
//!
//! Everything above this layer (locator, module resolver, accessor, scanner)
//! talks to the OS exclusively through [`SystemApi`]. The Windows
//! implementation lives in [`crate::windows::NativeApi`];
//! [`SimulatedSystem`] is an in-memory implementation with a resource ledger.

pub mod simulated;
pub mod snapshot;

pub use simulated::SimulatedSystem;
pub use snapshot::{ModuleSnapshot, ProcessSnapshot, Snapshot};

use crate::core::types::{Address, ModuleEntry, ProcessEntry, ProcessId};
use crate::process::ProcessAccess;

/// Raw Win32 error value reported by a failed call
pub type OsCode = u32;

/// An OS handle (process handle or ToolHelp snapshot), as an opaque integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub usize);

/// A top-level window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub usize);

/// What a snapshot enumerates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Processes,
    Modules,
}

/// OS primitives required by the crate.
///
/// Every `RawHandle` returned by [`create_snapshot`](SystemApi::create_snapshot)
/// or [`open_process`](SystemApi::open_process) must be passed to
/// [`close_handle`](SystemApi::close_handle) exactly once. Callers in this
/// crate never do this by hand; [`Snapshot`] and
/// [`ProcessHandle`](crate::process::ProcessHandle) release in `Drop`.
pub trait SystemApi {
    /// Take a snapshot of running processes, or of the modules of `pid`
    fn create_snapshot(&self, kind: SnapshotKind, pid: ProcessId) -> Result<RawHandle, OsCode>;

    /// First (`first == true`) or next process of a snapshot; `Ok(None)` at the end
    fn next_process(&self, snapshot: RawHandle, first: bool)
        -> Result<Option<ProcessEntry>, OsCode>;

    /// First (`first == true`) or next module of a snapshot; `Ok(None)` at the end
    fn next_module(&self, snapshot: RawHandle, first: bool) -> Result<Option<ModuleEntry>, OsCode>;

    /// Top-level window whose title is exactly `title`
    fn find_window(&self, title: &str) -> Option<WindowId>;

    /// Process that created `window`
    fn window_process_id(&self, window: WindowId) -> Option<ProcessId>;

    /// Open a non-inheritable process handle with the given rights
    fn open_process(&self, pid: ProcessId, access: ProcessAccess) -> Result<RawHandle, OsCode>;

    /// Copy remote memory into `buffer`, returning the number of bytes transferred
    fn read_memory(
        &self,
        handle: RawHandle,
        address: Address,
        buffer: &mut [u8],
    ) -> Result<usize, OsCode>;

    /// Copy `data` into remote memory, returning the number of bytes transferred
    fn write_memory(&self, handle: RawHandle, address: Address, data: &[u8])
        -> Result<usize, OsCode>;

    /// Change page protection of `size` bytes at `address`, returning the previous value
    fn protect_memory(
        &self,
        handle: RawHandle,
        address: Address,
        size: usize,
        protection: u32,
    ) -> Result<u32, OsCode>;

    /// Release a handle or snapshot
    fn close_handle(&self, handle: RawHandle);
}

impl<A: SystemApi + ?Sized> SystemApi for &A {
    fn create_snapshot(&self, kind: SnapshotKind, pid: ProcessId) -> Result<RawHandle, OsCode> {
        (**self).create_snapshot(kind, pid)
    }

    fn next_process(
        &self,
        snapshot: RawHandle,
        first: bool,
    ) -> Result<Option<ProcessEntry>, OsCode> {
        (**self).next_process(snapshot, first)
    }

    fn next_module(&self, snapshot: RawHandle, first: bool) -> Result<Option<ModuleEntry>, OsCode> {
        (**self).next_module(snapshot, first)
    }

    fn find_window(&self, title: &str) -> Option<WindowId> {
        (**self).find_window(title)
    }

    fn window_process_id(&self, window: WindowId) -> Option<ProcessId> {
        (**self).window_process_id(window)
    }

    fn open_process(&self, pid: ProcessId, access: ProcessAccess) -> Result<RawHandle, OsCode> {
        (**self).open_process(pid, access)
    }

    fn read_memory(
        &self,
        handle: RawHandle,
        address: Address,
        buffer: &mut [u8],
    ) -> Result<usize, OsCode> {
        (**self).read_memory(handle, address, buffer)
    }

    fn write_memory(
        &self,
        handle: RawHandle,
        address: Address,
        data: &[u8],
    ) -> Result<usize, OsCode> {
        (**self).write_memory(handle, address, data)
    }

    fn protect_memory(
        &self,
        handle: RawHandle,
        address: Address,
        size: usize,
        protection: u32,
    ) -> Result<u32, OsCode> {
        (**self).protect_memory(handle, address, size, protection)
    }

    fn close_handle(&self, handle: RawHandle) {
        (**self).close_handle(handle)
    }
}
