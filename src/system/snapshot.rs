//! RAII guards for ToolHelp-style snapshots

use super::{OsCode, RawHandle, SnapshotKind, SystemApi};
use crate::core::types::{ModuleEntry, ProcessEntry, ProcessId};
use tracing::debug;

/// An open snapshot, closed exactly once when dropped.
///
/// Dropping happens on every exit path of the enumerating code, including an
/// early return on the first match and `?` on an enumeration failure.
pub struct Snapshot<'a, A: SystemApi + ?Sized> {
    api: &'a A,
    raw: RawHandle,
    kind: SnapshotKind,
    started: bool,
    finished: bool,
}

impl<'a, A: SystemApi + ?Sized> Snapshot<'a, A> {
    /// Create a snapshot of `kind` for `pid` (ignored for process snapshots)
    pub fn open(api: &'a A, kind: SnapshotKind, pid: ProcessId) -> Result<Self, OsCode> {
        let raw = api.create_snapshot(kind, pid)?;
        debug!(?kind, pid, handle = raw.0, "snapshot created");
        Ok(Snapshot {
            api,
            raw,
            kind,
            started: false,
            finished: false,
        })
    }

    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }

    fn advance<T>(
        &mut self,
        fetch: impl FnOnce(&A, RawHandle, bool) -> Result<Option<T>, OsCode>,
    ) -> Option<Result<T, OsCode>> {
        if self.finished {
            return None;
        }

        let first = !self.started;
        self.started = true;

        match fetch(self.api, self.raw, first) {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(code) => {
                self.finished = true;
                Some(Err(code))
            }
        }
    }
}

impl<A: SystemApi + ?Sized> Drop for Snapshot<'_, A> {
    fn drop(&mut self) {
        self.api.close_handle(self.raw);
        debug!(kind = ?self.kind, handle = self.raw.0, "snapshot released");
    }
}

/// Iterator over the processes of a snapshot
pub struct ProcessSnapshot<'a, A: SystemApi + ?Sized>(Snapshot<'a, A>);

impl<'a, A: SystemApi + ?Sized> ProcessSnapshot<'a, A> {
    pub fn open(api: &'a A) -> Result<Self, OsCode> {
        Snapshot::open(api, SnapshotKind::Processes, 0).map(ProcessSnapshot)
    }
}

impl<A: SystemApi + ?Sized> Iterator for ProcessSnapshot<'_, A> {
    type Item = Result<ProcessEntry, OsCode>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.advance(|api, raw, first| api.next_process(raw, first))
    }
}

/// Iterator over the modules of one process
pub struct ModuleSnapshot<'a, A: SystemApi + ?Sized>(Snapshot<'a, A>);

impl<'a, A: SystemApi + ?Sized> ModuleSnapshot<'a, A> {
    pub fn open(api: &'a A, pid: ProcessId) -> Result<Self, OsCode> {
        Snapshot::open(api, SnapshotKind::Modules, pid).map(ModuleSnapshot)
    }
}

impl<A: SystemApi + ?Sized> Iterator for ModuleSnapshot<'_, A> {
    type Item = Result<ModuleEntry, OsCode>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.advance(|api, raw, first| api.next_module(raw, first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Address;
    use crate::system::SimulatedSystem;

    #[test]
    fn test_snapshot_released_on_drop() {
        let sim = SimulatedSystem::new();
        sim.add_process(10, "a.exe");
        {
            let snapshot = ProcessSnapshot::open(&sim).unwrap();
            assert_eq!(snapshot.0.kind(), SnapshotKind::Processes);
            assert_eq!(sim.open_resources(), 1);
        }
        assert_eq!(sim.open_resources(), 0);
        assert_eq!(sim.released(), 1);
    }

    #[test]
    fn test_process_iteration_in_order() {
        let sim = SimulatedSystem::new();
        sim.add_process(10, "a.exe");
        sim.add_process(20, "b.exe");

        let pids: Vec<_> = ProcessSnapshot::open(&sim)
            .unwrap()
            .map(|entry| entry.unwrap().pid)
            .collect();
        assert_eq!(pids, vec![10, 20]);
    }

    #[test]
    fn test_iteration_stops_after_error() {
        let sim = SimulatedSystem::new();
        sim.add_process(10, "a.exe");
        sim.add_module(10, "a.exe", Address::new(0x400000), 0x1000);
        sim.add_module(10, "b.dll", Address::new(0x800000), 0x1000);
        sim.fail_enumeration_after(1, 5);

        let mut modules = ModuleSnapshot::open(&sim, 10).unwrap();
        assert!(modules.next().unwrap().is_ok());
        assert_eq!(modules.next(), Some(Err(5)));
        assert_eq!(modules.next(), None);
        drop(modules);
        assert_eq!(sim.open_resources(), 0);
    }

    #[test]
    fn test_failed_open_acquires_nothing() {
        let sim = SimulatedSystem::new();
        sim.fail_snapshots(Some(8));
        assert!(ProcessSnapshot::open(&sim).is_err());
        assert_eq!(sim.acquired(), 0);
        assert_eq!(sim.released(), 0);
    }
}
