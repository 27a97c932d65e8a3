//! End-to-end flows and resource accounting on the simulated OS

use pretty_assertions::assert_eq;
use procmem::memory::ScanOutcome;
use procmem::process::{
    enumerate_modules, enumerate_processes, find_pid_by_name, find_pid_by_window,
    resolve_base_address, resolve_module_info,
};
use procmem::{
    Address, MemoryError, ModuleInfo, Pattern, ProcessEntry, ProcessMemory, Protection,
    SimulatedSystem,
};
use std::sync::atomic::{AtomicBool, Ordering};

fn desktop() -> SimulatedSystem {
    let sim = SimulatedSystem::new();
    sim.add_process(4, "System");
    sim.add_process(10, "notepad.exe");
    sim.add_process(20, "notepad2.exe");
    sim.add_window("Untitled - Notepad", 10);

    sim.add_module(10, "notepad.exe", Address::new(0x7FF6_0000_0000), 0x3_8000);
    sim.add_module(10, "a.dll", Address::new(0x1000), 0x800);
    sim.add_module(10, "a.dll", Address::new(0x2000), 0x800);

    let mut image = vec![0u8; 0x800];
    image[0x700..0x704].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    sim.map_region(10, Address::new(0x1000), &image, Protection::execute_read_write());
    sim
}

#[test]
fn test_locate_by_name_prefers_first_match() {
    let sim = desktop();
    assert_eq!(find_pid_by_name(&sim, "notepad").unwrap(), Some(10));
    assert_eq!(find_pid_by_name(&sim, "calc").unwrap(), None);
}

#[test]
fn test_locate_by_window() {
    let sim = desktop();
    assert_eq!(find_pid_by_window(&sim, "Untitled - Notepad"), Some(10));
    assert_eq!(find_pid_by_window(&sim, "Untitled"), None);
}

#[test]
fn test_duplicate_module_names_resolve_to_first() {
    let sim = desktop();
    assert_eq!(
        resolve_base_address(&sim, "a.dll", 10).unwrap(),
        Some(Address::new(0x1000))
    );
    assert_eq!(resolve_base_address(&sim, "b.dll", 10).unwrap(), None);
}

#[test]
fn test_enumerations() {
    let sim = desktop();
    assert_eq!(
        enumerate_processes(&sim).unwrap(),
        vec![
            ProcessEntry::new(4, "System"),
            ProcessEntry::new(10, "notepad.exe"),
            ProcessEntry::new(20, "notepad2.exe"),
        ]
    );
    assert_eq!(enumerate_modules(&sim, 10).unwrap().len(), 3);
    assert!(enumerate_modules(&sim, 20).unwrap().is_empty());
}

#[test]
fn test_locate_resolve_scan_patch() {
    let sim = desktop();
    let pid = find_pid_by_window(&sim, "Untitled - Notepad").unwrap();
    let module = resolve_module_info(&sim, "a.dll", pid).unwrap().unwrap();
    assert_eq!(module, ModuleInfo::new(Address::new(0x1000), 0x800));

    let mem = ProcessMemory::attach(&sim, pid).unwrap();
    let hit = mem
        .pattern_scan_masked(module.base_address, module.size, "x??x", &[0xDE, 0, 0, 0xEF])
        .unwrap()
        .unwrap();
    assert_eq!(hit, Address::new(0x1700));

    mem.write(hit, 0xCAFEBABEu32).unwrap();
    assert_eq!(mem.read::<u32>(hit).unwrap(), 0xCAFEBABE);
    assert_eq!(
        mem.pattern_scan(module.base_address, module.size, &Pattern::exact(&[0xDE, 0xAD]))
            .unwrap(),
        None
    );
}

#[test]
fn test_cancellable_scan() {
    let sim = desktop();
    let mem = ProcessMemory::attach(&sim, 10).unwrap();
    let cancel = AtomicBool::new(false);

    let mut scan = mem
        .scan(Address::new(0x1000), 0x800, "BE EF".parse().unwrap())
        .with_step_budget(64);
    assert_eq!(scan.run(&cancel).unwrap(), ScanOutcome::Found(Address::new(0x1702)));

    cancel.store(true, Ordering::Relaxed);
    let mut scan = mem.scan(Address::new(0x1000), 0x800, Pattern::exact(&[0xFF]));
    assert_eq!(scan.run(&cancel).unwrap(), ScanOutcome::Cancelled);
}

#[test]
fn test_every_resource_released_on_success_paths() {
    let sim = desktop();
    {
        let _ = find_pid_by_name(&sim, "notepad2").unwrap();
        let _ = enumerate_processes(&sim).unwrap();
        let _ = resolve_module_info(&sim, "a.dll", 10).unwrap();
        let mem = ProcessMemory::attach(&sim, 10).unwrap();
        let _ = mem.module_info("notepad.exe").unwrap();
        let mem = mem.retarget(20).unwrap();
        let shared = mem.into_shared();
        let _ = shared.clone().pid();
    }
    assert_eq!(sim.open_resources(), 0);
    assert_eq!(sim.acquired(), sim.released());
    assert_eq!(sim.invalid_releases(), 0);
}

#[test]
fn test_every_resource_released_on_failure_paths() {
    let sim = desktop();

    sim.fail_enumeration_after(1, 31);
    assert!(matches!(
        find_pid_by_name(&sim, "notepad2"),
        Err(MemoryError::Enumerate(_))
    ));
    assert!(matches!(
        resolve_module_info(&sim, "a.dll", 10),
        Err(MemoryError::Enumerate(_))
    ));

    sim.fail_snapshots(Some(8));
    assert!(matches!(enumerate_processes(&sim), Err(MemoryError::Enumerate(_))));
    sim.fail_snapshots(None);

    assert!(ProcessMemory::attach(&sim, 99).is_err());
    let mem = ProcessMemory::attach(&sim, 10).unwrap();
    assert!(mem.read::<u64>(Address::new(0xDEAD_0000)).is_err());
    assert!(mem.retarget(99).is_err());

    assert_eq!(sim.open_resources(), 0);
    assert_eq!(sim.acquired(), sim.released());
    assert_eq!(sim.invalid_releases(), 0);
}
