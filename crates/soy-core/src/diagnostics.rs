//! Shared diagnostic sink.
//!
//! One [`ErrorReporter`] is shared by every pass of a compilation. Reporting
//! takes `&self` so the reporter can sit behind an `Arc` and be used from the
//! parallel single-file phase.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::SoyError;

/// Severity of a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Makes the compilation fail.
    Error,
    /// Reported but does not fail the compilation.
    Warning,
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub error: SoyError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
        };
        write!(f, "{label}: {}", self.error)
    }
}

/// A position in the reporter's history, see [`ErrorReporter::errors_since`].
///
/// Checkpoints count every error ever reported, so draining the reporter with
/// [`ErrorReporter::take`] does not invalidate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    reported: u64,
}

#[derive(Debug, Default)]
struct Log {
    diagnostics: Vec<Diagnostic>,
    /// Errors reported over the reporter's lifetime. Never reset.
    reported: u64,
}

/// Accumulates diagnostics for a compilation.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    log: Mutex<Log>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        // A panic in another reporter can't leave the log half-written.
        self.log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Report an error.
    pub fn report(&self, error: SoyError) {
        tracing::trace!(%error, "diagnostic reported");
        let mut log = self.lock();
        log.reported += 1;
        log.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::Error,
            error,
        });
    }

    /// Report a warning.
    pub fn warn(&self, error: SoyError) {
        self.lock().diagnostics.push(Diagnostic {
            kind: DiagnosticKind::Warning,
            error,
        });
    }

    /// Remember how many errors have been reported so far.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            reported: self.lock().reported,
        }
    }

    /// Whether any error was reported after `checkpoint` was taken, drained
    /// or not.
    pub fn errors_since(&self, checkpoint: Checkpoint) -> bool {
        self.lock().reported > checkpoint.reported
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.lock()
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.lock()
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Warning)
            .count()
    }

    /// All reported errors, in report order.
    pub fn errors(&self) -> Vec<SoyError> {
        self.lock()
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Error)
            .map(|d| d.error.clone())
            .collect()
    }

    /// Every diagnostic, in report order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().diagnostics.clone()
    }

    /// Drain all diagnostics, leaving the reporter empty. Outstanding
    /// checkpoints stay valid.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.lock().diagnostics)
    }
}

impl fmt::Display for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in self.lock().diagnostics.iter() {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    fn duplicate(name: &str) -> SoyError {
        SoyError::DuplicateRecordField {
            name: name.to_string(),
            span: Span::point(1, 1),
        }
    }

    #[test]
    fn counts_errors_and_warnings_separately() {
        let reporter = ErrorReporter::new();
        reporter.report(duplicate("a"));
        reporter.warn(duplicate("b"));
        assert_eq!(reporter.error_count(), 1);
        assert_eq!(reporter.warning_count(), 1);
        assert!(reporter.has_errors());
    }

    #[test]
    fn checkpoint_only_sees_later_errors() {
        let reporter = ErrorReporter::new();
        reporter.report(duplicate("a"));
        let checkpoint = reporter.checkpoint();
        assert!(!reporter.errors_since(checkpoint));

        reporter.warn(duplicate("b"));
        assert!(!reporter.errors_since(checkpoint));

        reporter.report(duplicate("c"));
        assert!(reporter.errors_since(checkpoint));
    }

    #[test]
    fn take_drains() {
        let reporter = ErrorReporter::new();
        reporter.report(duplicate("a"));
        assert_eq!(reporter.take().len(), 1);
        assert!(!reporter.has_errors());
    }

    #[test]
    fn checkpoint_survives_take() {
        let reporter = ErrorReporter::new();
        reporter.report(duplicate("a"));
        reporter.report(duplicate("b"));
        let before = reporter.checkpoint();
        reporter.take();
        let after = reporter.checkpoint();
        assert!(!reporter.errors_since(before));
        assert!(!reporter.errors_since(after));

        // One error after draining two must still register.
        reporter.report(duplicate("c"));
        assert!(reporter.errors_since(before));
        assert!(reporter.errors_since(after));
        assert_eq!(reporter.error_count(), 1);
    }

    #[test]
    fn display_lists_each_diagnostic() {
        let reporter = ErrorReporter::new();
        reporter.report(duplicate("a"));
        assert_eq!(
            reporter.to_string(),
            "error: at 1:1: Duplicate field 'a' in record declaration.\n"
        );
    }
}
