//! Typed and raw access to another process's memory

use crate::core::types::{Address, MemoryResult, ProcessId, Protection};
use crate::process::ProcessHandle;
use crate::system::SystemApi;
use bytemuck::Pod;
use std::mem;

/// Open `pid` with the rights every accessor operation needs
/// (`VM_READ | VM_WRITE | VM_OPERATION`).
pub fn open<A: SystemApi>(api: A, pid: ProcessId) -> MemoryResult<ProcessHandle<A>> {
    ProcessHandle::open_for_read_write(api, pid)
}

/// Read one `T` at `address`.
///
/// Exactly `size_of::<T>()` bytes are transferred in a single call; anything
/// less is a [`MemoryError::Read`](crate::MemoryError::Read).
pub fn read<T: Pod, A: SystemApi>(handle: &ProcessHandle<A>, address: Address) -> MemoryResult<T> {
    let mut value = T::zeroed();
    handle.read_memory(address, bytemuck::bytes_of_mut(&mut value))?;
    Ok(value)
}

/// Write `value` at `address`
pub fn write<T: Pod, A: SystemApi>(
    handle: &ProcessHandle<A>,
    address: Address,
    value: T,
) -> MemoryResult<()> {
    handle.write_memory(address, bytemuck::bytes_of(&value))
}

/// Read `size` raw bytes at `address`
pub fn read_bytes<A: SystemApi>(
    handle: &ProcessHandle<A>,
    address: Address,
    size: usize,
) -> MemoryResult<Vec<u8>> {
    let mut buffer = vec![0u8; size];
    handle.read_memory(address, &mut buffer)?;
    Ok(buffer)
}

/// Write raw bytes at `address`
pub fn write_bytes<A: SystemApi>(
    handle: &ProcessHandle<A>,
    address: Address,
    data: &[u8],
) -> MemoryResult<()> {
    handle.write_memory(address, data)
}

/// Change the protection of the `size_of::<T>()` bytes at `address`.
///
/// Returns the protection that was in effect before the change.
pub fn protect<T, A: SystemApi>(
    handle: &ProcessHandle<A>,
    address: Address,
    protection: Protection,
) -> MemoryResult<Protection> {
    protect_region(handle, address, mem::size_of::<T>(), protection)
}

/// Change the protection of `size` bytes at `address`, returning the previous protection
pub fn protect_region<A: SystemApi>(
    handle: &ProcessHandle<A>,
    address: Address,
    size: usize,
    protection: Protection,
) -> MemoryResult<Protection> {
    handle.protect_memory(address, size, protection)
}
