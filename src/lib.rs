//! procmem: inspect and patch the memory of another process
//!
//! Locate a process by window title or executable name, resolve a module's
//! base address, then read, write, re-protect and pattern-scan its memory.
//! Every OS call goes through [`system::SystemApi`]; on Windows that is
//! [`windows::NativeApi`], and [`system::SimulatedSystem`] stands in for it
//! anywhere else.
//!
//! ```ignore
//! use procmem::{memory::ProcessMemory, process, windows::NativeApi};
//!
//! let pid = process::find_pid_by_name(&NativeApi, "game.exe")?.expect("not running");
//! let base = process::resolve_base_address(&NativeApi, "game.exe", pid)?.expect("no module");
//! let mem = ProcessMemory::attach(NativeApi, pid)?;
//! let health: i32 = mem.read(base.offset(0x1F4))?;
//! mem.write(base.offset(0x1F4), health + 100)?;
//! ```

pub mod config;
pub mod core;
pub mod memory;
pub mod process;
pub mod system;
pub mod windows;

// Re-export main types from core module
pub use crate::core::types::{
    AccessDirection, Address, MemoryError, MemoryResult, ModuleEntry, ModuleInfo, OsFailure,
    Pattern, PatternByte, ProcessEntry, ProcessId, Protection,
};
pub use crate::core::{AUTHORS, VERSION};

pub use crate::memory::{ProcessMemory, SharedProcessMemory};
pub use crate::process::{ProcessAccess, ProcessHandle};
pub use crate::system::{SimulatedSystem, SystemApi};
pub use crate::windows::ErrorCode;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(AUTHORS, env!("CARGO_PKG_AUTHORS"));
    }

    #[test]
    fn test_address_reexport() {
        let addr = Address::new(0x1000);
        assert_eq!(addr.as_usize(), 0x1000);
        assert!(Address::null().is_null());
    }

    #[test]
    fn test_memory_error_reexport() {
        let error = MemoryError::attach(1234, ErrorCode::AccessDenied);
        assert_eq!(
            error.to_string(),
            "failed to attach to process 1234: Access denied (5)"
        );

        let result: MemoryResult<u32> = Err(error);
        assert!(result.is_err());
    }

    #[test]
    fn test_end_to_end_on_simulated_system() {
        let sim = SimulatedSystem::new();
        sim.add_process(40, "game.exe");
        sim.add_window("Game", 40);
        sim.add_module(40, "game.exe", Address::new(0x40_0000), 0x1000);
        sim.map_region(40, Address::new(0x40_0000), &[0u8; 0x1000], Protection::read_write());

        let pid = process::find_pid_by_window(&sim, "Game").unwrap();
        let module = process::resolve_module_info(&sim, "game.exe", pid)
            .unwrap()
            .unwrap();
        let mem = ProcessMemory::attach(&sim, pid).unwrap();

        let health = module.base_address.offset(0x1F4);
        mem.write(health, 100i32).unwrap();
        let current: i32 = mem.read(health).unwrap();
        mem.write(health, current + 100).unwrap();

        assert_eq!(mem.read::<i32>(health).unwrap(), 200);
        assert_eq!(
            mem.pattern_scan(module.base_address, module.size, &Pattern::exact(&200i32.to_le_bytes()))
                .unwrap(),
            Some(health)
        );
        drop(mem);
        assert_eq!(sim.open_resources(), 0);
    }
}
