//! Page protection flags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page protection of a region in a target process (`PAGE_*` values)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Protection(u32);

impl Protection {
    pub const PAGE_NOACCESS: u32 = 0x01;
    pub const PAGE_READONLY: u32 = 0x02;
    pub const PAGE_READWRITE: u32 = 0x04;
    pub const PAGE_WRITECOPY: u32 = 0x08;
    pub const PAGE_EXECUTE: u32 = 0x10;
    pub const PAGE_EXECUTE_READ: u32 = 0x20;
    pub const PAGE_EXECUTE_READWRITE: u32 = 0x40;
    pub const PAGE_EXECUTE_WRITECOPY: u32 = 0x80;
    pub const PAGE_GUARD: u32 = 0x100;
    pub const PAGE_NOCACHE: u32 = 0x200;

    const WRITABLE: u32 = Self::PAGE_READWRITE
        | Self::PAGE_WRITECOPY
        | Self::PAGE_EXECUTE_READWRITE
        | Self::PAGE_EXECUTE_WRITECOPY;
    const EXECUTABLE: u32 = Self::PAGE_EXECUTE
        | Self::PAGE_EXECUTE_READ
        | Self::PAGE_EXECUTE_READWRITE
        | Self::PAGE_EXECUTE_WRITECOPY;

    pub const fn new(value: u32) -> Self {
        Protection(value)
    }

    pub const fn no_access() -> Self {
        Protection(Self::PAGE_NOACCESS)
    }

    pub const fn read_only() -> Self {
        Protection(Self::PAGE_READONLY)
    }

    pub const fn read_write() -> Self {
        Protection(Self::PAGE_READWRITE)
    }

    pub const fn execute_read() -> Self {
        Protection(Self::PAGE_EXECUTE_READ)
    }

    pub const fn execute_read_write() -> Self {
        Protection(Self::PAGE_EXECUTE_READWRITE)
    }

    /// Base protection without the modifier bits
    fn base(&self) -> u32 {
        self.0 & 0xFF
    }

    pub fn is_readable(&self) -> bool {
        let base = self.base();
        base != 0 && base != Self::PAGE_NOACCESS && base != Self::PAGE_EXECUTE && !self.is_guard()
    }

    pub fn is_writable(&self) -> bool {
        self.base() & Self::WRITABLE != 0 && !self.is_guard()
    }

    pub fn is_executable(&self) -> bool {
        self.base() & Self::EXECUTABLE != 0
    }

    pub fn is_guard(&self) -> bool {
        self.0 & Self::PAGE_GUARD != 0
    }

    pub fn with_guard(self) -> Self {
        Protection(self.0 | Self::PAGE_GUARD)
    }

    pub const fn raw(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Protection {
    fn from(value: u32) -> Self {
        Protection(value)
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.base() {
            Self::PAGE_NOACCESS => "NOACCESS",
            Self::PAGE_READONLY => "R",
            Self::PAGE_READWRITE => "RW",
            Self::PAGE_WRITECOPY => "WC",
            Self::PAGE_EXECUTE => "X",
            Self::PAGE_EXECUTE_READ => "RX",
            Self::PAGE_EXECUTE_READWRITE => "RWX",
            Self::PAGE_EXECUTE_WRITECOPY => "WCX",
            _ => "UNKNOWN",
        };
        f.write_str(base)?;

        if self.is_guard() {
            f.write_str("+G")?;
        }
        if self.0 & Self::PAGE_NOCACHE != 0 {
            f.write_str("+NC")?;
        }
        Ok(())
    }
}
