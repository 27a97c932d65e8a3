//! Module enumeration and base-address resolution

use crate::core::types::{Address, MemoryError, MemoryResult, ModuleEntry, ModuleInfo, ProcessId};
use crate::system::{ModuleSnapshot, OsCode, SystemApi};
use tracing::{debug, warn};

/// Every module mapped into `pid`, in enumeration order
pub fn enumerate_modules<A: SystemApi + ?Sized>(
    api: &A,
    pid: ProcessId,
) -> MemoryResult<Vec<ModuleEntry>> {
    let failed = |code| enumeration_failed(pid, code);
    ModuleSnapshot::open(api, pid)
        .map_err(failed)?
        .map(|entry| entry.map_err(failed))
        .collect()
}

/// First module of `pid` whose name is exactly `module_name`.
///
/// The comparison is case-sensitive against the name as the OS reports it.
/// A missing module is `Ok(None)`; a failed enumeration is
/// [`MemoryError::Enumerate`].
pub fn find_module<A: SystemApi + ?Sized>(
    api: &A,
    module_name: &str,
    pid: ProcessId,
) -> MemoryResult<Option<ModuleEntry>> {
    let snapshot = ModuleSnapshot::open(api, pid).map_err(|code| enumeration_failed(pid, code))?;

    for entry in snapshot {
        let entry = entry.map_err(|code| enumeration_failed(pid, code))?;
        if entry.name == module_name {
            debug!(pid, module_name, base = %entry.base_address, size = entry.size, "module found");
            return Ok(Some(entry));
        }
    }

    debug!(pid, module_name, "module not loaded");
    Ok(None)
}

/// Base address of `module_name` inside `pid`
pub fn resolve_base_address<A: SystemApi + ?Sized>(
    api: &A,
    module_name: &str,
    pid: ProcessId,
) -> MemoryResult<Option<Address>> {
    Ok(find_module(api, module_name, pid)?.map(|m| m.base_address))
}

/// Base address and size of `module_name` inside `pid`
pub fn resolve_module_info<A: SystemApi + ?Sized>(
    api: &A,
    module_name: &str,
    pid: ProcessId,
) -> MemoryResult<Option<ModuleInfo>> {
    Ok(find_module(api, module_name, pid)?.map(|m| m.info()))
}

fn enumeration_failed(pid: ProcessId, code: OsCode) -> MemoryError {
    warn!(pid, code, "module enumeration failed");
    MemoryError::enumerate(pid, code)
}
