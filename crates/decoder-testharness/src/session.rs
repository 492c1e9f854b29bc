//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Pass/fail results accumulated during one harness session."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use decoder_common::Console;
use indexmap::IndexMap;

use crate::checks::Check;

/// Insertion-ordered results; re-running a check overwrites its entry in place.
#[derive(Debug, Clone, Default)]
pub struct SessionResults {
    entries: IndexMap<Check, bool>,
}

impl SessionResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, check: Check, passed: bool) {
        self.entries.insert(check, passed);
    }

    pub fn contains(&self, check: Check) -> bool {
        self.entries.contains_key(&check)
    }

    pub fn get(&self, check: Check) -> Option<bool> {
        self.entries.get(&check).copied()
    }

    pub fn passed(&self) -> usize {
        self.entries.values().filter(|passed| **passed).count()
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed() == self.total()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Check, bool)> + '_ {
        self.entries.iter().map(|(check, passed)| (*check, *passed))
    }

    /// Print the final tally.
    pub fn print_summary(&self, console: &Console) {
        let p = console.palette();
        console.header("Final Test Summary");
        for (check, passed) in self.iter() {
            let status = if passed {
                console.paint(p.green, "PASS")
            } else {
                console.paint(p.red, "FAIL")
            };
            console.line(format!("{}: {}", status, check.result_name()));
        }
        console.blank();
        console.line(console.paint(
            p.bold,
            format!("Total: {}/{} tests passed", self.passed(), self.total()),
        ));
        console.blank();
        if self.all_passed() {
            console.line(format!("{}{}All tests passed!{}", p.green, p.bold, p.reset));
        } else {
            console.line(format!("{}{}[WARN] Some tests failed{}", p.red, p.bold, p.reset));
        }
    }
}
