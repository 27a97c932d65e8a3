//! ToolHelp32 snapshot bindings for process and module enumeration

use crate::core::types::{Address, ModuleEntry, ProcessEntry};
use crate::windows::utils::{wide_to_string, ErrorCode};
use std::mem;
use winapi::shared::minwindef::FALSE;
use winapi::shared::winerror::ERROR_NO_MORE_FILES;
use winapi::um::handleapi::INVALID_HANDLE_VALUE;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, Process32FirstW, Process32NextW,
    MODULEENTRY32W, PROCESSENTRY32W, TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
};
use winapi::um::winnt::HANDLE;

/// Snapshot of every running process
pub fn snapshot_processes() -> Result<HANDLE, u32> {
    create_snapshot(TH32CS_SNAPPROCESS, 0)
}

/// Snapshot of the modules of `pid`, 32-bit modules included
pub fn snapshot_modules(pid: u32) -> Result<HANDLE, u32> {
    create_snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid)
}

fn create_snapshot(flags: u32, pid: u32) -> Result<HANDLE, u32> {
    let snapshot = unsafe { CreateToolhelp32Snapshot(flags, pid) };
    if snapshot.is_null() || snapshot == INVALID_HANDLE_VALUE {
        Err(ErrorCode::last_error().code())
    } else {
        Ok(snapshot)
    }
}

/// `Ok(None)` when the walk reached the end, the error code otherwise
fn end_or_error() -> Result<Option<()>, u32> {
    match ErrorCode::last_error().code() {
        ERROR_NO_MORE_FILES => Ok(None),
        code => Err(code),
    }
}

/// First or next process of a process snapshot
///
/// # Safety
/// `snapshot` must come from [`snapshot_processes`] and still be open
pub unsafe fn next_process(snapshot: HANDLE, first: bool) -> Result<Option<ProcessEntry>, u32> {
    let mut entry: PROCESSENTRY32W = mem::zeroed();
    entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

    let success = if first {
        Process32FirstW(snapshot, &mut entry)
    } else {
        Process32NextW(snapshot, &mut entry)
    };

    if success == FALSE {
        return end_or_error().map(|_| None);
    }

    Ok(Some(ProcessEntry::new(
        entry.th32ProcessID,
        wide_to_string(&entry.szExeFile),
    )))
}

/// First or next module of a module snapshot
///
/// # Safety
/// `snapshot` must come from [`snapshot_modules`] and still be open
pub unsafe fn next_module(snapshot: HANDLE, first: bool) -> Result<Option<ModuleEntry>, u32> {
    let mut entry: MODULEENTRY32W = mem::zeroed();
    entry.dwSize = mem::size_of::<MODULEENTRY32W>() as u32;

    let success = if first {
        Module32FirstW(snapshot, &mut entry)
    } else {
        Module32NextW(snapshot, &mut entry)
    };

    if success == FALSE {
        return end_or_error().map(|_| None);
    }

    Ok(Some(ModuleEntry::new(
        wide_to_string(&entry.szModule),
        Address::new(entry.modBaseAddr as usize),
        entry.modBaseSize as usize,
    )))
}
