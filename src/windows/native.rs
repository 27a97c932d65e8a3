//! [`SystemApi`] backed by the live Windows kernel

use crate::core::types::{Address, ModuleEntry, ProcessEntry, ProcessId};
use crate::process::ProcessAccess;
use crate::system::{OsCode, RawHandle, SnapshotKind, SystemApi, WindowId};
use crate::windows::bindings::{kernel32, toolhelp, user32};
use tracing::warn;
use winapi::shared::windef::HWND;
use winapi::um::winnt::HANDLE;

/// The real OS. Zero-sized; every call goes straight to the Win32 API.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeApi;

fn to_raw(handle: HANDLE) -> RawHandle {
    RawHandle(handle as usize)
}

fn from_raw(handle: RawHandle) -> HANDLE {
    handle.0 as HANDLE
}

impl SystemApi for NativeApi {
    fn create_snapshot(&self, kind: SnapshotKind, pid: ProcessId) -> Result<RawHandle, OsCode> {
        match kind {
            SnapshotKind::Processes => toolhelp::snapshot_processes(),
            SnapshotKind::Modules => toolhelp::snapshot_modules(pid),
        }
        .map(to_raw)
    }

    fn next_process(
        &self,
        snapshot: RawHandle,
        first: bool,
    ) -> Result<Option<ProcessEntry>, OsCode> {
        unsafe { toolhelp::next_process(from_raw(snapshot), first) }
    }

    fn next_module(&self, snapshot: RawHandle, first: bool) -> Result<Option<ModuleEntry>, OsCode> {
        unsafe { toolhelp::next_module(from_raw(snapshot), first) }
    }

    fn find_window(&self, title: &str) -> Option<WindowId> {
        user32::find_window(title).map(|hwnd| WindowId(hwnd as usize))
    }

    fn window_process_id(&self, window: WindowId) -> Option<ProcessId> {
        user32::window_process_id(window.0 as HWND)
    }

    fn open_process(&self, pid: ProcessId, access: ProcessAccess) -> Result<RawHandle, OsCode> {
        kernel32::open_process(pid, access.value()).map(to_raw)
    }

    fn read_memory(
        &self,
        handle: RawHandle,
        address: Address,
        buffer: &mut [u8],
    ) -> Result<usize, OsCode> {
        unsafe { kernel32::read_process_memory(from_raw(handle), address.as_usize(), buffer) }
    }

    fn write_memory(
        &self,
        handle: RawHandle,
        address: Address,
        data: &[u8],
    ) -> Result<usize, OsCode> {
        unsafe { kernel32::write_process_memory(from_raw(handle), address.as_usize(), data) }
    }

    fn protect_memory(
        &self,
        handle: RawHandle,
        address: Address,
        size: usize,
        protection: u32,
    ) -> Result<u32, OsCode> {
        unsafe {
            kernel32::virtual_protect_ex(from_raw(handle), address.as_usize(), size, protection)
        }
    }

    fn close_handle(&self, handle: RawHandle) {
        if let Err(code) = unsafe { kernel32::close_handle(from_raw(handle)) } {
            warn!(handle = handle.0, code, "CloseHandle failed");
        }
    }
}
