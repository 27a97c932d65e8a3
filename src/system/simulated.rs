//! In-memory implementation of [`SystemApi`] with a resource ledger
//!
//! Models processes, their modules and mapped memory regions, top-level
//! windows, and the handles and snapshots handed out. The ledger records
//! every acquire and release so callers can verify that each resource is
//! released exactly once, and counts remote reads and writes.

use super::{OsCode, RawHandle, SnapshotKind, SystemApi, WindowId};
use crate::core::types::{Address, ModuleEntry, ProcessEntry, ProcessId, Protection};
use crate::process::ProcessAccess;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const ERROR_ACCESS_DENIED: OsCode = 5;
const ERROR_INVALID_HANDLE: OsCode = 6;
const ERROR_INVALID_PARAMETER: OsCode = 87;
const ERROR_PARTIAL_COPY: OsCode = 299;
const ERROR_INVALID_ADDRESS: OsCode = 487;
const ERROR_NOACCESS: OsCode = 998;

#[derive(Debug)]
struct Region {
    base: usize,
    data: Vec<u8>,
    protection: Protection,
}

impl Region {
    fn end(&self) -> usize {
        self.base + self.data.len()
    }

    fn contains(&self, address: usize, len: usize) -> bool {
        address >= self.base
            && address
                .checked_add(len)
                .is_some_and(|end| end <= self.end())
    }
}

#[derive(Debug)]
struct Process {
    pid: ProcessId,
    exe_file: String,
    modules: Vec<ModuleEntry>,
    regions: Vec<Region>,
    denied: bool,
    running: bool,
}

impl Process {
    fn region_at(&self, address: usize) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(address, 1))
    }

    fn region_at_mut(&mut self, address: usize) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.contains(address, 1))
    }

    /// Every byte of `[address, address + len)` satisfies `allowed`
    fn range_allowed(&self, address: usize, len: usize, allowed: fn(&Protection) -> bool) -> bool {
        let Some(end) = address.checked_add(len) else {
            return false;
        };
        let mut cursor = address;
        while cursor < end {
            match self.region_at(cursor) {
                Some(region) if allowed(&region.protection) => cursor = region.end(),
                _ => return false,
            }
        }
        true
    }
}

#[derive(Debug)]
enum Resource {
    Process {
        pid: ProcessId,
        access: ProcessAccess,
    },
    Snapshot {
        kind: SnapshotKind,
        processes: Vec<ProcessEntry>,
        modules: Vec<ModuleEntry>,
        cursor: usize,
    },
}

#[derive(Debug, Default)]
struct State {
    processes: Vec<Process>,
    windows: Vec<(String, ProcessId)>,
    resources: HashMap<usize, Resource>,
    next_handle: usize,
    acquired: usize,
    released: usize,
    invalid_releases: usize,
    read_calls: usize,
    write_calls: usize,
    snapshot_failure: Option<OsCode>,
    enumeration_failure: Option<(usize, OsCode)>,
}

impl State {
    fn process(&self, pid: ProcessId) -> Option<&Process> {
        self.processes.iter().find(|p| p.pid == pid)
    }

    fn process_mut(&mut self, pid: ProcessId) -> Option<&mut Process> {
        self.processes.iter_mut().find(|p| p.pid == pid)
    }

    fn allocate(&mut self, resource: Resource) -> RawHandle {
        self.next_handle += 4;
        let raw = self.next_handle;
        self.resources.insert(raw, resource);
        self.acquired += 1;
        RawHandle(raw)
    }

    /// Resolve a process handle to its pid after checking the requested rights
    fn handle_target(&self, handle: RawHandle, needed: ProcessAccess) -> Result<ProcessId, OsCode> {
        match self.resources.get(&handle.0) {
            Some(Resource::Process { pid, access }) => {
                if !access.contains(needed) {
                    return Err(ERROR_ACCESS_DENIED);
                }
                match self.process(*pid) {
                    Some(process) if process.running => Ok(*pid),
                    _ => Err(ERROR_ACCESS_DENIED),
                }
            }
            _ => Err(ERROR_INVALID_HANDLE),
        }
    }

    /// Position the cursor of a snapshot and return the index to produce
    fn snapshot_cursor(
        &mut self,
        snapshot: RawHandle,
        expected: SnapshotKind,
        first: bool,
    ) -> Result<usize, OsCode> {
        let failure = self.enumeration_failure;
        match self.resources.get_mut(&snapshot.0) {
            Some(Resource::Snapshot { kind, cursor, .. }) if *kind == expected => {
                if first {
                    *cursor = 0;
                }
                if let Some((after, code)) = failure {
                    if *cursor == after {
                        return Err(code);
                    }
                }
                let index = *cursor;
                *cursor += 1;
                Ok(index)
            }
            _ => Err(ERROR_INVALID_HANDLE),
        }
    }
}

/// Simulated OS process model.
///
/// Cloning shares the same underlying state, so a clone can be handed to a
/// [`ProcessHandle`](crate::process::ProcessHandle) while the original is
/// kept for inspecting the ledger.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSystem {
    state: Arc<Mutex<State>>,
}

impl SimulatedSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a running process; enumeration order is registration order
    pub fn add_process(&self, pid: ProcessId, exe_file: &str) {
        self.state().processes.push(Process {
            pid,
            exe_file: exe_file.to_string(),
            modules: Vec::new(),
            regions: Vec::new(),
            denied: false,
            running: true,
        });
    }

    /// Register a loaded module; enumeration order is registration order
    pub fn add_module(&self, pid: ProcessId, name: &str, base_address: Address, size: usize) {
        if let Some(process) = self.state().process_mut(pid) {
            process
                .modules
                .push(ModuleEntry::new(name, base_address, size));
        }
    }

    /// Map `data` at `base` with the given protection
    pub fn map_region(&self, pid: ProcessId, base: Address, data: &[u8], protection: Protection) {
        if let Some(process) = self.state().process_mut(pid) {
            process.regions.push(Region {
                base: base.as_usize(),
                data: data.to_vec(),
                protection,
            });
        }
    }

    /// Register a top-level window owned by `pid`
    pub fn add_window(&self, title: &str, pid: ProcessId) {
        self.state().windows.push((title.to_string(), pid));
    }

    /// Make `open_process` and module snapshots of `pid` fail with access denied
    pub fn deny_access(&self, pid: ProcessId) {
        if let Some(process) = self.state().process_mut(pid) {
            process.denied = true;
        }
    }

    /// Mark the process as exited; existing handles stay allocated but stop working
    pub fn terminate(&self, pid: ProcessId) {
        if let Some(process) = self.state().process_mut(pid) {
            process.running = false;
        }
    }

    /// Make every subsequent `create_snapshot` fail with `code`, or clear the fault
    pub fn fail_snapshots(&self, code: Option<OsCode>) {
        self.state().snapshot_failure = code;
    }

    /// Fail snapshot iteration once `entries` items have been produced
    pub fn fail_enumeration_after(&self, entries: usize, code: OsCode) {
        self.state().enumeration_failure = Some((entries, code));
    }

    /// Copy of remote bytes, bypassing protections and the ledger
    pub fn peek(&self, pid: ProcessId, address: Address, len: usize) -> Option<Vec<u8>> {
        let state = self.state();
        let process = state.process(pid)?;
        let region = process
            .regions
            .iter()
            .find(|r| r.contains(address.as_usize(), len))?;
        let offset = address.as_usize() - region.base;
        Some(region.data[offset..offset + len].to_vec())
    }

    /// Current protection of the region containing `address`
    pub fn protection_at(&self, pid: ProcessId, address: Address) -> Option<Protection> {
        let state = self.state();
        state
            .process(pid)?
            .region_at(address.as_usize())
            .map(|r| r.protection)
    }

    /// Handles and snapshots handed out so far
    pub fn acquired(&self) -> usize {
        self.state().acquired
    }

    /// Handles and snapshots released so far
    pub fn released(&self) -> usize {
        self.state().released
    }

    /// Handles and snapshots currently live
    pub fn open_resources(&self) -> usize {
        self.state().resources.len()
    }

    /// Close calls on a handle that was not live (double release or garbage)
    pub fn invalid_releases(&self) -> usize {
        self.state().invalid_releases
    }

    /// Number of `read_memory` calls received
    pub fn read_calls(&self) -> usize {
        self.state().read_calls
    }

    /// Number of `write_memory` calls received
    pub fn write_calls(&self) -> usize {
        self.state().write_calls
    }
}

impl SystemApi for SimulatedSystem {
    fn create_snapshot(&self, kind: SnapshotKind, pid: ProcessId) -> Result<RawHandle, OsCode> {
        let mut state = self.state();
        if let Some(code) = state.snapshot_failure {
            return Err(code);
        }

        let (processes, modules) = match kind {
            SnapshotKind::Processes => (
                state
                    .processes
                    .iter()
                    .filter(|p| p.running)
                    .map(|p| ProcessEntry::new(p.pid, p.exe_file.clone()))
                    .collect(),
                Vec::new(),
            ),
            SnapshotKind::Modules => match state.process(pid) {
                Some(process) if process.denied => return Err(ERROR_ACCESS_DENIED),
                Some(process) if process.running => (Vec::new(), process.modules.clone()),
                _ => return Err(ERROR_INVALID_PARAMETER),
            },
        };

        Ok(state.allocate(Resource::Snapshot {
            kind,
            processes,
            modules,
            cursor: 0,
        }))
    }

    fn next_process(
        &self,
        snapshot: RawHandle,
        first: bool,
    ) -> Result<Option<ProcessEntry>, OsCode> {
        let mut state = self.state();
        let index = state.snapshot_cursor(snapshot, SnapshotKind::Processes, first)?;
        match state.resources.get(&snapshot.0) {
            Some(Resource::Snapshot { processes, .. }) => Ok(processes.get(index).cloned()),
            _ => Err(ERROR_INVALID_HANDLE),
        }
    }

    fn next_module(&self, snapshot: RawHandle, first: bool) -> Result<Option<ModuleEntry>, OsCode> {
        let mut state = self.state();
        let index = state.snapshot_cursor(snapshot, SnapshotKind::Modules, first)?;
        match state.resources.get(&snapshot.0) {
            Some(Resource::Snapshot { modules, .. }) => Ok(modules.get(index).cloned()),
            _ => Err(ERROR_INVALID_HANDLE),
        }
    }

    fn find_window(&self, title: &str) -> Option<WindowId> {
        self.state()
            .windows
            .iter()
            .position(|(t, _)| t == title)
            .map(|index| WindowId(index + 1))
    }

    fn window_process_id(&self, window: WindowId) -> Option<ProcessId> {
        let state = self.state();
        let index = window.0.checked_sub(1)?;
        state
            .windows
            .get(index)
            .map(|(_, pid)| *pid)
            .filter(|pid| *pid != 0)
    }

    fn open_process(&self, pid: ProcessId, access: ProcessAccess) -> Result<RawHandle, OsCode> {
        let mut state = self.state();
        match state.process(pid) {
            Some(process) if process.denied => Err(ERROR_ACCESS_DENIED),
            Some(process) if process.running && pid != 0 => {
                Ok(state.allocate(Resource::Process { pid, access }))
            }
            _ => Err(ERROR_INVALID_PARAMETER),
        }
    }

    fn read_memory(
        &self,
        handle: RawHandle,
        address: Address,
        buffer: &mut [u8],
    ) -> Result<usize, OsCode> {
        let mut state = self.state();
        state.read_calls += 1;

        let pid = state.handle_target(handle, ProcessAccess::VM_READ)?;
        let process = state.process(pid).ok_or(ERROR_INVALID_HANDLE)?;
        let start = address.as_usize();

        if !process.range_allowed(start, buffer.len(), Protection::is_readable) {
            return Err(ERROR_PARTIAL_COPY);
        }

        for (i, byte) in buffer.iter_mut().enumerate() {
            let at = start + i;
            let region = process.region_at(at).ok_or(ERROR_PARTIAL_COPY)?;
            *byte = region.data[at - region.base];
        }

        Ok(buffer.len())
    }

    fn write_memory(
        &self,
        handle: RawHandle,
        address: Address,
        data: &[u8],
    ) -> Result<usize, OsCode> {
        let mut state = self.state();
        state.write_calls += 1;

        let needed = ProcessAccess::combine(&[ProcessAccess::VM_WRITE, ProcessAccess::VM_OPERATION]);
        let pid = state.handle_target(handle, needed)?;
        let process = state.process_mut(pid).ok_or(ERROR_INVALID_HANDLE)?;
        let start = address.as_usize();

        if !process.range_allowed(start, data.len(), Protection::is_writable) {
            return Err(ERROR_NOACCESS);
        }

        for (i, byte) in data.iter().enumerate() {
            let at = start + i;
            let region = process.region_at_mut(at).ok_or(ERROR_NOACCESS)?;
            let offset = at - region.base;
            region.data[offset] = *byte;
        }

        Ok(data.len())
    }

    fn protect_memory(
        &self,
        handle: RawHandle,
        address: Address,
        size: usize,
        protection: u32,
    ) -> Result<u32, OsCode> {
        let mut state = self.state();
        let pid = state.handle_target(handle, ProcessAccess::VM_OPERATION)?;

        if protection == 0 {
            return Err(ERROR_INVALID_PARAMETER);
        }

        let process = state.process_mut(pid).ok_or(ERROR_INVALID_HANDLE)?;
        let region = process
            .regions
            .iter_mut()
            .find(|r| r.contains(address.as_usize(), size.max(1)))
            .ok_or(ERROR_INVALID_ADDRESS)?;

        let old = region.protection;
        region.protection = Protection::new(protection);
        Ok(old.raw())
    }

    fn close_handle(&self, handle: RawHandle) {
        let mut state = self.state();
        if state.resources.remove(&handle.0).is_some() {
            state.released += 1;
        } else {
            state.invalid_releases += 1;
        }
    }
}
