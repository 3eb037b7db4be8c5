//! Batch report for compiling every program under the example directory.

use tracing::{error, info};

/// Tallies per-program outcomes for `medc all` and prints one line per
/// program plus a final total.
pub struct BatchReport {
    total: usize,
    compiled: usize,
    failures: Vec<String>,
}

impl BatchReport {
    pub fn new(total: usize) -> Self {
        info!("compiling {total} example programs");
        Self {
            total,
            compiled: 0,
            failures: Vec::new(),
        }
    }

    pub fn compiled(&mut self, program: &str, summary: &str) {
        self.compiled += 1;
        info!("ok {program}: {summary}");
    }

    pub fn failed(&mut self, program: &str, message: &str) {
        error!("failed {program}: {message}");
        self.failures.push(program.to_string());
    }

    /// Print the totals. Returns false when any program failed, so the
    /// binary can exit nonzero.
    pub fn finish(self) -> bool {
        info!(
            "compiled {} of {} example programs",
            self.compiled, self.total
        );
        if self.failures.is_empty() {
            return true;
        }
        error!("failed: {}", self.failures.join(", "));
        false
    }
}
