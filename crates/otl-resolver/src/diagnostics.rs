//! Diagnostic sink
//!
//! Human-readable progress lines (pruning counts, component sizes, search
//! attempts). Purely observational.

/// Line-oriented destination for resolver progress
pub trait DiagnosticSink {
    fn line(&mut self, line: &str);
}

/// Collect lines in memory
impl DiagnosticSink for Vec<String> {
    fn line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Discard everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn line(&mut self, _line: &str) {}
}

/// Forward lines as `tracing` debug events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn line(&mut self, line: &str) {
        tracing::debug!(target: "otl_resolver::diagnostics", "{}", line);
    }
}
