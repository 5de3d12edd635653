//! Run counters and the final test report

use serde::Serialize;
use tdsfdw_common::prompt::{MessageLevel, MessageSink};

/// Totals of one run.
///
/// Only the engine updates the counters. `total` counts fixtures that
/// passed version gating, so `total == ok + errors` always holds for a
/// completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    total: usize,
    ok: usize,
    errors: usize,
}

impl RunResult {
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn ok(&self) -> usize {
        self.ok
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub(crate) fn record_started(&mut self) {
        self.total += 1;
    }

    pub(crate) fn record_ok(&mut self) {
        self.ok += 1;
    }

    pub(crate) fn record_error(&mut self) {
        self.errors += 1;
    }
}

/// Print the TEST REPORT block, in the error color if anything failed
pub fn print_report<S: MessageSink + ?Sized>(sink: &mut S, result: &RunResult) {
    let level = if result.errors != 0 {
        MessageLevel::Error
    } else {
        MessageLevel::Ok
    };
    sink.message(level, "=========== TEST REPORT ==============");
    sink.message(level, &format!(" OK   : {}", result.ok));
    sink.message(level, &format!(" ERROR: {}", result.errors));
    sink.message(level, &format!(" Total: {}", result.total));
}
