//! Trace replay.
//!
//! Parallel replay runs one thread per trace against the same [`System`];
//! the threads only meet at the system's bus lock. A returned byte that
//! differs from the trace's expectation is logged and counted, never fatal.

use std::thread;

use log::{debug, warn};
use serde::Serialize;

use super::trace::{Request, Trace};
use crate::common::AccessType;
use crate::common::error::{SimError, SimResult};
use crate::core::hierarchy::Hierarchy;
use crate::soc::System;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub requests: u64,
    /// Accesses whose result differed from the trace's expected byte.
    pub mismatches: u64,
}

impl RunReport {
    pub fn merge(&mut self, other: &RunReport) {
        self.requests += other.requests;
        self.mismatches += other.mismatches;
    }
}

/// Replays `trace` in order on the calling thread.
pub fn run_sequential(system: &System, trace: &Trace) -> SimResult<RunReport> {
    replay(system, trace.requests())
}

/// Replays each trace on its own thread and merges the reports. Every core
/// needs a trace; extra traces name cores that the system rejects.
pub fn run_parallel(system: &System, traces: &[Trace]) -> SimResult<RunReport> {
    if traces.len() < system.num_cores() {
        return Err(SimError::TooFewTraces {
            traces: traces.len(),
            num_cores: system.num_cores(),
        });
    }
    thread::scope(|s| -> SimResult<RunReport> {
        let handles: Vec<_> = traces
            .iter()
            .map(|trace| s.spawn(move || replay(system, trace.requests())))
            .collect();

        let mut report = RunReport::default();
        for handle in handles {
            let part = handle.join().map_err(|_| SimError::ReplayPanicked)??;
            report.merge(&part);
        }
        Ok(report)
    })
}

/// Replays `trace` through a single-core hierarchy. Core ids and data bytes
/// are ignored; only addresses and access kinds matter at tag level.
pub fn run_hierarchy(hierarchy: &mut Hierarchy, trace: &Trace) -> SimResult<RunReport> {
    let mut report = RunReport::default();
    for req in trace.requests() {
        hierarchy.access(req.addr, req.access)?;
        report.requests += 1;
    }
    Ok(report)
}

fn replay(system: &System, requests: &[Request]) -> SimResult<RunReport> {
    let mut report = RunReport::default();
    for req in requests {
        let got = system.access(req.core, req.addr, req.access, req.data)?;
        report.requests += 1;

        let arrow = match req.access {
            AccessType::Write => "w",
            AccessType::Read => "r",
            AccessType::Fetch => "i",
        };
        match req.expected {
            Some(expected) if expected != got => {
                report.mismatches += 1;
                warn!(
                    "core{} {arrow} {:#08x} => {got:#04x}, expected {expected:#04x}: MISMATCH",
                    req.core, req.addr
                );
            }
            _ => debug!("core{} {arrow} {:#08x} => {got:#04x}", req.core, req.addr),
        }
    }
    Ok(report)
}
