//! Out-of-band diagnostics for degraded (but still working) calls.
//!
//! A live event feed that fails to start or breaks mid-stream does not
//! fail the call; it is reported here and the remaining backends carry on.

use std::sync::Arc;

use fedgate_core::BackendError;
use parking_lot::Mutex;
use tracing::warn;

/// What went wrong for one backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The live subscription could not be started
    SubscribeFailed,
    /// The live subscription ended with an error
    FeedFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Scope of the affected backend
    pub scope: String,
    pub kind: DiagnosticKind,
    pub error: BackendError,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            DiagnosticKind::SubscribeFailed => write!(
                f,
                "failed to start event stream for scope [{}]: {}",
                self.scope, self.error
            ),
            DiagnosticKind::FeedFailed => write!(
                f,
                "event stream for scope [{}] failed: {}",
                self.scope, self.error
            ),
        }
    }
}

/// Receiver of diagnostics, passed explicitly into streaming calls
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Logs every diagnostic at `warn`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        warn!(
            scope = %diagnostic.scope,
            kind = ?diagnostic.kind,
            error = %diagnostic.error,
            "{}",
            diagnostic
        );
    }
}

/// Keeps every diagnostic for later inspection
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics reported so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }
}
