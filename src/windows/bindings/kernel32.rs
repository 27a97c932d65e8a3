//! Kernel32.dll bindings for process handles and virtual memory
//!
//! Every wrapper returns the raw `GetLastError` value on failure.

use crate::windows::utils::ErrorCode;
use winapi::shared::minwindef::{DWORD, FALSE, LPCVOID, LPVOID};
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, VirtualProtectEx, WriteProcessMemory};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::winnt::HANDLE;

fn last_error() -> u32 {
    ErrorCode::last_error().code()
}

/// Open a non-inheritable handle to `pid`
pub fn open_process(pid: u32, desired_access: u32) -> Result<HANDLE, u32> {
    let handle = unsafe { OpenProcess(desired_access, FALSE, pid) };
    if handle.is_null() {
        Err(last_error())
    } else {
        Ok(handle)
    }
}

/// Safe wrapper for CloseHandle
///
/// # Safety
/// `handle` must be a handle this process owns and has not closed yet
pub unsafe fn close_handle(handle: HANDLE) -> Result<(), u32> {
    if handle.is_null() {
        return Ok(());
    }

    if CloseHandle(handle) == FALSE {
        Err(last_error())
    } else {
        Ok(())
    }
}

/// Safe wrapper for ReadProcessMemory
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_VM_READ`
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: usize,
    buffer: &mut [u8],
) -> Result<usize, u32> {
    let mut bytes_read = 0;

    let result = ReadProcessMemory(
        handle,
        address as LPCVOID,
        buffer.as_mut_ptr() as LPVOID,
        buffer.len(),
        &mut bytes_read,
    );

    if result == FALSE {
        Err(last_error())
    } else {
        Ok(bytes_read)
    }
}

/// Safe wrapper for WriteProcessMemory
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_VM_WRITE | PROCESS_VM_OPERATION`
pub unsafe fn write_process_memory(
    handle: HANDLE,
    address: usize,
    data: &[u8],
) -> Result<usize, u32> {
    let mut bytes_written = 0;

    let result = WriteProcessMemory(
        handle,
        address as LPVOID,
        data.as_ptr() as LPCVOID,
        data.len(),
        &mut bytes_written,
    );

    if result == FALSE {
        Err(last_error())
    } else {
        Ok(bytes_written)
    }
}

/// Safe wrapper for VirtualProtectEx, returning the previous protection
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_VM_OPERATION`
pub unsafe fn virtual_protect_ex(
    handle: HANDLE,
    address: usize,
    size: usize,
    new_protection: u32,
) -> Result<u32, u32> {
    let mut old_protection: DWORD = 0;

    let result = VirtualProtectEx(
        handle,
        address as LPVOID,
        size,
        new_protection,
        &mut old_protection,
    );

    if result == FALSE {
        Err(last_error())
    } else {
        Ok(old_protection)
    }
}
