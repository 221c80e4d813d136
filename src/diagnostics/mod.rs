//! Best-effort diagnostics: the message audit log and periodic status
//! reports.
//!
//! Nothing here can stall or fail the proxy. Audit records are submitted
//! without waiting and the writer task reports its own failures.

pub mod audit;
pub mod status;

pub use audit::{AuditCommand, AuditHandle, AuditLog, AuditRecord};
pub use status::StatusReport;
use thiserror::Error;

/// Errors ending a diagnostics task.
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    /// The audit file could not be opened, written or flushed.
    #[error("audit log I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
