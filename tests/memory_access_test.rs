//! Typed access, protection and error reporting against a simulated target

use bytemuck::{Pod, Zeroable};
use pretty_assertions::assert_eq;
use procmem::memory::{accessor, with_writable, ProcessMemory};
use procmem::{AccessDirection, Address, ErrorCode, MemoryError, Protection, SimulatedSystem};

const PID: u32 = 2024;
const HEAP: Address = Address::new(0x2000_0000);
const TEXT: Address = Address::new(0x40_1000);

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Player {
    health: i32,
    armor: i32,
    position: [f32; 3],
}

fn target() -> SimulatedSystem {
    let sim = SimulatedSystem::new();
    sim.add_process(PID, "game.exe");
    sim.map_region(PID, HEAP, &[0u8; 0x1000], Protection::read_write());
    sim.map_region(PID, TEXT, &[0xC3; 0x100], Protection::execute_read());
    sim.map_region(PID, Address::new(0x5000_0000), &[0u8; 0x10], Protection::no_access());
    sim
}

#[test]
fn test_struct_round_trip() {
    let sim = target();
    let mem = ProcessMemory::attach(&sim, PID).unwrap();
    let player = Player {
        health: 100,
        armor: 50,
        position: [1.0, -2.5, 3.25],
    };

    mem.write(HEAP.offset(0x10), player).unwrap();
    assert_eq!(mem.read::<Player>(HEAP.offset(0x10)).unwrap(), player);
    assert_eq!(mem.read::<i32>(HEAP.offset(0x14)).unwrap(), 50);
    assert_eq!(sim.write_calls(), 1);
}

#[test]
fn test_each_transfer_is_one_call() {
    let sim = target();
    let handle = accessor::open(&sim, PID).unwrap();

    accessor::write(&handle, HEAP, [7u64; 4]).unwrap();
    let _: [u64; 4] = accessor::read(&handle, HEAP).unwrap();
    let _ = accessor::read_bytes(&handle, HEAP, 0x200).unwrap();

    assert_eq!(sim.write_calls(), 1);
    assert_eq!(sim.read_calls(), 2);
}

#[test]
fn test_failures_carry_diagnostics() {
    let sim = target();
    let mem = ProcessMemory::attach(&sim, PID).unwrap();

    let err = mem.read::<u32>(Address::new(0x5000_0000)).unwrap_err();
    assert!(matches!(err, MemoryError::Read(_)));
    assert_eq!(err.pid(), PID);
    assert_eq!(err.address(), Some(Address::new(0x5000_0000)));
    assert_eq!(err.access_direction(), Some(AccessDirection::Read));
    assert_eq!(err.os_code(), ErrorCode::PartialCopy);
    assert!(err.is_access_failure());

    let err = mem.write(TEXT, 0u8).unwrap_err();
    assert_eq!(err.access_direction(), Some(AccessDirection::Write));
    assert!(err.to_string().contains("process 2024"));
}

#[test]
fn test_read_straddling_regions() {
    let sim = target();
    let mem = ProcessMemory::attach(&sim, PID).unwrap();

    // The heap region ends at HEAP + 0x1000 and nothing is mapped after it
    assert!(mem.read::<u64>(HEAP.offset(0xFFC)).is_err());
    assert!(mem.read::<u32>(HEAP.offset(0xFFC)).is_ok());
}

#[test]
fn test_patch_code_with_writable_window() {
    let sim = target();
    let handle = accessor::open(&sim, PID).unwrap();

    with_writable(&handle, TEXT, 2, || accessor::write_bytes(&handle, TEXT, &[0x90, 0x90])).unwrap();
    assert_eq!(sim.peek(PID, TEXT, 3), Some(vec![0x90, 0x90, 0xC3]));
    assert_eq!(sim.protection_at(PID, TEXT), Some(Protection::execute_read()));
}

#[test]
fn test_protect_reports_previous_value() {
    let sim = target();
    let mem = ProcessMemory::attach(&sim, PID).unwrap();

    let previous = mem.protect::<u64>(TEXT, Protection::execute_read_write()).unwrap();
    assert_eq!(previous, Protection::execute_read());
    assert_eq!(
        mem.protect_region(TEXT, 0x100, previous).unwrap(),
        Protection::execute_read_write()
    );
}

#[test]
fn test_protect_unmapped_is_protect_error() {
    let sim = target();
    let mem = ProcessMemory::attach(&sim, PID).unwrap();

    let err = mem.protect::<u32>(Address::new(0x10), Protection::read_write()).unwrap_err();
    assert!(matches!(err, MemoryError::Protect(_)));
    assert_eq!(err.access_direction(), None);
}

#[test]
fn test_attach_failures() {
    let sim = target();
    sim.add_process(666, "protected.exe");
    sim.deny_access(666);

    let err = ProcessMemory::attach(&sim, 666).unwrap_err();
    assert_eq!(err.os_code(), ErrorCode::AccessDenied);

    let err = ProcessMemory::attach(&sim, 31337).unwrap_err();
    assert!(matches!(err, MemoryError::Attach(_)));
    assert_eq!(err.address(), None);

    assert_eq!(sim.acquired(), 0);
}
