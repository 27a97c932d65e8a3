//! Locating a target process by window title or executable name

use crate::core::types::{MemoryError, MemoryResult, ProcessEntry, ProcessId};
use crate::system::{ProcessSnapshot, SystemApi};
use tracing::{debug, warn};

/// Process that owns the top-level window titled exactly `title`.
///
/// `None` when no such window exists; that is a normal outcome.
pub fn find_pid_by_window<A: SystemApi + ?Sized>(api: &A, title: &str) -> Option<ProcessId> {
    let window = api.find_window(title)?;
    let pid = api.window_process_id(window).filter(|&pid| pid != 0);
    debug!(title, ?pid, "window lookup");
    pid
}

/// First running process whose executable file name contains `name`.
///
/// Substring, case-sensitive match; the first process in enumeration order
/// wins, and that order is defined by the OS. Failure to take or walk the
/// process snapshot is reported as [`MemoryError::Enumerate`], never as
/// "not found".
pub fn find_pid_by_name<A: SystemApi + ?Sized>(
    api: &A,
    name: &str,
) -> MemoryResult<Option<ProcessId>> {
    Ok(find_process_by_name(api, name)?.map(|entry| entry.pid))
}

/// Like [`find_pid_by_name`], returning the whole matching entry
pub fn find_process_by_name<A: SystemApi + ?Sized>(
    api: &A,
    name: &str,
) -> MemoryResult<Option<ProcessEntry>> {
    let snapshot = ProcessSnapshot::open(api).map_err(enumeration_failed)?;

    for entry in snapshot {
        let entry = entry.map_err(enumeration_failed)?;
        if entry.exe_file.contains(name) {
            debug!(name, pid = entry.pid, exe = %entry.exe_file, "process found");
            return Ok(Some(entry));
        }
    }

    debug!(name, "no matching process");
    Ok(None)
}

/// Every running process, in enumeration order
pub fn enumerate_processes<A: SystemApi + ?Sized>(api: &A) -> MemoryResult<Vec<ProcessEntry>> {
    ProcessSnapshot::open(api)
        .map_err(enumeration_failed)?
        .map(|entry| entry.map_err(enumeration_failed))
        .collect()
}

fn enumeration_failed(code: u32) -> MemoryError {
    warn!(code, "process enumeration failed");
    MemoryError::enumerate(0, code)
}
