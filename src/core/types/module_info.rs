//! Module and process enumeration records

use super::{Address, ProcessId};
use serde::{Deserialize, Serialize};

/// Where a module is mapped inside a target process.
///
/// A point-in-time snapshot: valid only for the process that produced it and
/// only until the module is unloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub base_address: Address,
    pub size: usize,
}

impl ModuleInfo {
    pub fn new(base_address: Address, size: usize) -> Self {
        ModuleInfo { base_address, size }
    }

    /// Check if an address is within this module
    pub fn contains_address(&self, addr: Address) -> bool {
        addr.distance_from(self.base_address)
            .is_some_and(|offset| offset < self.size)
    }

    /// One past the last byte of the module
    pub fn end_address(&self) -> Address {
        Address::new(self.base_address.as_usize().saturating_add(self.size))
    }
}

/// A module as reported by the OS module enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub name: String,
    pub base_address: Address,
    pub size: usize,
}

impl ModuleEntry {
    pub fn new(name: impl Into<String>, base_address: Address, size: usize) -> Self {
        ModuleEntry {
            name: name.into(),
            base_address,
            size,
        }
    }

    pub fn info(&self) -> ModuleInfo {
        ModuleInfo::new(self.base_address, self.size)
    }
}

/// A process as reported by the OS process enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: ProcessId,
    pub exe_file: String,
}

impl ProcessEntry {
    pub fn new(pid: ProcessId, exe_file: impl Into<String>) -> Self {
        ProcessEntry {
            pid,
            exe_file: exe_file.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_info() {
        let module = ModuleInfo::new(Address::new(0x10000), 0x1000);

        assert!(module.contains_address(Address::new(0x10000)));
        assert!(module.contains_address(Address::new(0x10FFF)));
        assert!(!module.contains_address(Address::new(0x11000)));
        assert!(!module.contains_address(Address::new(0xFFFF)));
        assert_eq!(module.end_address(), Address::new(0x11000));
    }

    #[test]
    fn test_module_entry_info() {
        let entry = ModuleEntry::new("a.dll", Address::new(0x2000), 0x300);
        assert_eq!(entry.info(), ModuleInfo::new(Address::new(0x2000), 0x300));
    }
}
