//! Temporary protection changes that restore themselves

use crate::core::types::{Address, MemoryResult, Protection};
use crate::process::ProcessHandle;
use crate::system::SystemApi;
use tracing::warn;

/// Holds a changed protection over a range and puts the previous one back on drop.
///
/// The usual patching sequence is: make code writable, write, restore.
///
/// ```ignore
/// let guard = ProtectionGuard::new(&handle, addr, 5, Protection::execute_read_write())?;
/// accessor::write_bytes(&handle, addr, &[0x90; 5])?;
/// guard.restore()?;
/// ```
///
/// Dropping the guard restores too, but can only log a failure;
/// [`restore`](ProtectionGuard::restore) reports it.
pub struct ProtectionGuard<'a, A: SystemApi> {
    handle: &'a ProcessHandle<A>,
    address: Address,
    size: usize,
    previous: Protection,
    restored: bool,
}

impl<'a, A: SystemApi> ProtectionGuard<'a, A> {
    /// Apply `protection` to `size` bytes at `address`
    pub fn new(
        handle: &'a ProcessHandle<A>,
        address: Address,
        size: usize,
        protection: Protection,
    ) -> MemoryResult<Self> {
        let previous = handle.protect_memory(address, size, protection)?;
        Ok(Self {
            handle,
            address,
            size,
            previous,
            restored: false,
        })
    }

    /// Protection that will be restored
    pub fn previous(&self) -> Protection {
        self.previous
    }

    /// Restore the previous protection now
    pub fn restore(mut self) -> MemoryResult<()> {
        self.restored = true;
        self.handle
            .protect_memory(self.address, self.size, self.previous)
            .map(|_| ())
    }
}

impl<A: SystemApi> Drop for ProtectionGuard<'_, A> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(err) = self
            .handle
            .protect_memory(self.address, self.size, self.previous)
        {
            warn!(%err, "failed to restore memory protection");
        }
    }
}

/// Run `operation` with `size` bytes at `address` made writable, then restore.
///
/// The operation's error takes precedence over a failed restore.
pub fn with_writable<A, F, R>(
    handle: &ProcessHandle<A>,
    address: Address,
    size: usize,
    operation: F,
) -> MemoryResult<R>
where
    A: SystemApi,
    F: FnOnce() -> MemoryResult<R>,
{
    let guard = ProtectionGuard::new(handle, address, size, Protection::execute_read_write())?;
    let result = operation()?;
    guard.restore()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MemoryError;
    use crate::memory::accessor;
    use crate::system::SimulatedSystem;

    const CODE: Address = Address::new(0x40_1000);

    fn sim() -> SimulatedSystem {
        let sim = SimulatedSystem::new();
        sim.add_process(7, "patched.exe");
        sim.map_region(7, CODE, &[0x74, 0x05, 0xC3], Protection::execute_read());
        sim
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let sim = sim();
        let handle = accessor::open(&sim, 7).unwrap();
        {
            let guard =
                ProtectionGuard::new(&handle, CODE, 2, Protection::execute_read_write()).unwrap();
            assert_eq!(guard.previous(), Protection::execute_read());
            accessor::write_bytes(&handle, CODE, &[0x90, 0x90]).unwrap();
        }
        assert_eq!(sim.protection_at(7, CODE), Some(Protection::execute_read()));
        assert_eq!(sim.peek(7, CODE, 3), Some(vec![0x90, 0x90, 0xC3]));
    }

    #[test]
    fn test_explicit_restore() {
        let sim = sim();
        let handle = accessor::open(&sim, 7).unwrap();

        let guard = ProtectionGuard::new(&handle, CODE, 1, Protection::read_write()).unwrap();
        assert_eq!(sim.protection_at(7, CODE), Some(Protection::read_write()));
        guard.restore().unwrap();
        assert_eq!(sim.protection_at(7, CODE), Some(Protection::execute_read()));
    }

    #[test]
    fn test_with_writable_patches_code() {
        let sim = sim();
        let handle = accessor::open(&sim, 7).unwrap();

        with_writable(&handle, CODE, 1, || accessor::write(&handle, CODE, 0xEBu8)).unwrap();
        assert_eq!(sim.peek(7, CODE, 1), Some(vec![0xEB]));
        assert_eq!(sim.protection_at(7, CODE), Some(Protection::execute_read()));
    }

    #[test]
    fn test_with_writable_restores_after_failed_operation() {
        let sim = sim();
        let handle = accessor::open(&sim, 7).unwrap();

        let err = with_writable(&handle, CODE, 1, || {
            accessor::write(&handle, Address::new(0x10), 0u8)
        })
        .unwrap_err();
        assert!(matches!(err, MemoryError::Write(_)));
        assert_eq!(sim.protection_at(7, CODE), Some(Protection::execute_read()));
    }

    #[test]
    fn test_guard_on_unmapped_range_fails() {
        let sim = sim();
        let handle = accessor::open(&sim, 7).unwrap();

        let result = ProtectionGuard::new(&handle, Address::new(0x10), 1, Protection::read_write());
        assert!(matches!(result, Err(MemoryError::Protect(_))));
    }
}
