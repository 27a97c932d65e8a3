//! Linear masked byte-pattern search over a remote address range
//!
//! Each candidate address is tested by reading the target one byte at a time
//! and stopping at the first mismatch; wildcard positions are never read. That
//! is `O(length * pattern.len())` remote reads in the worst case, which is slow
//! for large ranges. Use [`PatternScan`] to bound the work done per call and to
//! cancel a long scan.
//!
//! A candidate's comparison may read up to `pattern.len() - 1` bytes past
//! `start + length`. A failed read ends the scan with that error.
//!
//! The range end is clamped to `usize::MAX`, so a range running off the top of
//! the address space never wraps around to low addresses. The topmost address
//! is then not a candidate; no user-mode address space reaches it.

use crate::core::types::{Address, MemoryResult, Pattern, PatternByte};
use crate::memory::accessor;
use crate::process::ProcessHandle;
use crate::system::SystemApi;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Candidates examined per [`PatternScan::step`] by [`PatternScan::run`] unless configured
pub const DEFAULT_STEP_BUDGET: usize = 4096;

/// Lowest address in `start..start + length` where `mask`/`bytes` matches.
///
/// `'x'` in `mask` marks a byte that must match; any other character is a
/// wildcard. Returns `Ok(None)` without touching the target when the mask and
/// byte lengths differ or when `length` is zero. An empty or all-wildcard
/// pattern matches at `start` without reading.
pub fn pattern_scan_masked<A: SystemApi>(
    handle: &ProcessHandle<A>,
    start: Address,
    length: usize,
    mask: &str,
    bytes: &[u8],
) -> MemoryResult<Option<Address>> {
    match Pattern::from_mask(mask, bytes) {
        Some(pattern) => pattern_scan(handle, start, length, &pattern),
        None => {
            debug!(mask_len = mask.len(), pattern_len = bytes.len(), "mask and pattern lengths differ");
            Ok(None)
        }
    }
}

/// Lowest address in `start..start + length` where `pattern` matches
pub fn pattern_scan<A: SystemApi>(
    handle: &ProcessHandle<A>,
    start: Address,
    length: usize,
    pattern: &Pattern,
) -> MemoryResult<Option<Address>> {
    let mut scan = PatternScan::new(handle, start, length, pattern.clone());
    loop {
        match scan.step(usize::MAX)? {
            ScanStep::Pending => continue,
            ScanStep::Found(address) => return Ok(Some(address)),
            ScanStep::NotFound => return Ok(None),
        }
    }
}

/// Progress reported by one [`PatternScan::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    /// Budget exhausted; candidates remain
    Pending,
    /// Match at the given address; the scan is finished
    Found(Address),
    /// Every candidate was rejected
    NotFound,
}

/// Final result of [`PatternScan::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Found(Address),
    NotFound,
    Cancelled,
}

/// A pattern scan that can be advanced in bounded steps.
///
/// Candidates are tested in ascending order, so the first reported match is
/// the lowest one regardless of how the work was split into steps.
pub struct PatternScan<'h, A: SystemApi> {
    handle: &'h ProcessHandle<A>,
    pattern: Pattern,
    next: usize,
    end: usize,
    step_budget: usize,
    finished: Option<ScanStep>,
}

impl<'h, A: SystemApi> PatternScan<'h, A> {
    /// Prepare a scan of `start..start + length`; nothing is read yet
    pub fn new(handle: &'h ProcessHandle<A>, start: Address, length: usize, pattern: Pattern) -> Self {
        let end = start.as_usize().saturating_add(length);
        let finished = (length == 0).then_some(ScanStep::NotFound);

        debug!(pid = handle.pid(), %start, length, %pattern, "pattern scan prepared");
        Self {
            handle,
            pattern,
            next: start.as_usize(),
            end,
            step_budget: DEFAULT_STEP_BUDGET,
            finished,
        }
    }

    /// Candidates examined per step by [`run`](Self::run); zero is treated as one
    pub fn with_step_budget(mut self, budget: usize) -> Self {
        self.step_budget = budget.max(1);
        self
    }

    /// Next candidate address, or `None` once the scan has finished
    pub fn position(&self) -> Option<Address> {
        self.finished.is_none().then_some(Address::new(self.next))
    }

    /// Candidates not yet examined
    pub fn remaining(&self) -> usize {
        match self.finished {
            Some(_) => 0,
            None => self.end - self.next,
        }
    }

    /// Examine at most `budget` more candidates.
    ///
    /// After `Found` or `NotFound` every further call returns the same value
    /// without reading. A read error is returned as-is and leaves the cursor
    /// on the failing candidate.
    pub fn step(&mut self, budget: usize) -> MemoryResult<ScanStep> {
        if let Some(done) = self.finished {
            return Ok(done);
        }

        let stop = self.end.min(self.next.saturating_add(budget));
        while self.next < stop {
            let candidate = self.next;
            if self.matches_at(candidate)? {
                let found = ScanStep::Found(Address::new(candidate));
                debug!(pid = self.handle.pid(), address = %Address::new(candidate), "pattern found");
                self.finished = Some(found);
                return Ok(found);
            }
            self.next += 1;
        }

        if self.next >= self.end {
            debug!(pid = self.handle.pid(), "pattern not found");
            self.finished = Some(ScanStep::NotFound);
            return Ok(ScanStep::NotFound);
        }

        trace!(pid = self.handle.pid(), next = %Address::new(self.next), "scan step yielded");
        Ok(ScanStep::Pending)
    }

    /// Step until the scan finishes, checking `cancel` before every step
    pub fn run(&mut self, cancel: &AtomicBool) -> MemoryResult<ScanOutcome> {
        loop {
            if self.finished.is_none() && cancel.load(Ordering::Relaxed) {
                debug!(pid = self.handle.pid(), next = %Address::new(self.next), "pattern scan cancelled");
                return Ok(ScanOutcome::Cancelled);
            }
            match self.step(self.step_budget)? {
                ScanStep::Pending => {}
                ScanStep::Found(address) => return Ok(ScanOutcome::Found(address)),
                ScanStep::NotFound => return Ok(ScanOutcome::NotFound),
            }
        }
    }

    fn matches_at(&self, candidate: usize) -> MemoryResult<bool> {
        for (offset, expected) in self.pattern.bytes().iter().enumerate() {
            let PatternByte::Exact(expected) = *expected else {
                continue;
            };
            let Some(address) = candidate.checked_add(offset) else {
                return Ok(false);
            };
            let actual: u8 = accessor::read(self.handle, Address::new(address))?;
            if actual != expected {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
