//! Append-only CSV log of sent and delivered messages.
//!
//! The proxy submits [`AuditRecord`]s through an [`AuditHandle`]; a single
//! [`AuditLog`] task owns the file and appends one line per record:
//!
//! ```text
//! type, hash_hex, received, unix_seconds, target, elapsed_minutes
//! ```
//!
//! `elapsed_minutes` counts whole minutes since the writer started.

use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use tokio::{
    fs::OpenOptions,
    io::{AsyncWriteExt, BufWriter},
    sync::mpsc::{self, Receiver, Sender, error::TrySendError},
    time::Instant,
};
use tracing::{debug, warn};

use super::DiagnosticsError;
use crate::{hash::Hash, message::AppMessage};

/// One audited message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditRecord {
    /// Application message type.
    pub message_type: u8,
    /// Message hash.
    pub hash: Hash,
    /// `true` for a delivered message, `false` for a sent one.
    pub received: bool,
    /// Wall-clock time the record was taken.
    pub unix_seconds: u64,
    /// Network origin, or the empty string.
    pub target: String,
}

impl AuditRecord {
    /// Build a record for `message` stamped with the current time.
    #[must_use]
    pub fn for_message<M: AppMessage>(message: &M, received: bool) -> Self {
        let unix_seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Self {
            message_type: message.message_type(),
            hash: message.message_hash(),
            received,
            unix_seconds,
            target: message.network_origin().unwrap_or_default().to_owned(),
        }
    }

    /// Render the CSV line for this record.
    #[must_use]
    pub fn to_line(&self, elapsed_minutes: u64) -> String {
        format!(
            "{}, {}, {}, {}, {}, {}\n",
            self.message_type,
            self.hash.to_hex(),
            self.received,
            self.unix_seconds,
            self.target,
            elapsed_minutes
        )
    }
}

/// Instruction sent to the audit writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditCommand {
    /// Append a record.
    Record(AuditRecord),
    /// Flush and stop.
    Stop,
}

/// Submission side of the audit log.
#[derive(Clone, Debug)]
pub struct AuditHandle {
    tx: Sender<AuditCommand>,
}

impl AuditHandle {
    /// Queue a record without waiting.
    ///
    /// A full queue drops the record with a warning. Returns whether the
    /// record was queued.
    pub fn record(&self, record: AuditRecord) -> bool { self.submit(AuditCommand::Record(record)) }

    /// Ask the writer to flush and stop.
    pub fn stop(&self) -> bool { self.submit(AuditCommand::Stop) }

    fn submit(&self, command: AuditCommand) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("audit queue full; record dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("audit writer stopped; record dropped");
                false
            }
        }
    }
}

/// Writer task that owns the audit file.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    commands: Receiver<AuditCommand>,
}

impl AuditLog {
    /// Create a writer for `path` and the handle that feeds it.
    #[must_use]
    pub fn channel(path: impl Into<PathBuf>, capacity: usize) -> (Self, AuditHandle) {
        let (tx, commands) = mpsc::channel(capacity.max(1));
        (
            Self {
                path: path.into(),
                commands,
            },
            AuditHandle { tx },
        )
    }

    /// File this writer appends to.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    /// Append records until told to stop or every handle is dropped.
    ///
    /// Returns the number of lines written.
    ///
    /// # Errors
    ///
    /// Returns [`DiagnosticsError::Io`] if the file cannot be opened, written
    /// or flushed.
    pub async fn run(mut self) -> Result<u64, DiagnosticsError> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        options.mode(0o660);
        let file = options.open(&self.path).await?;
        let mut writer = BufWriter::new(file);
        let start = Instant::now();
        let mut written = 0;

        debug!(path = %self.path.display(), "audit log started");
        while let Some(command) = self.commands.recv().await {
            match command {
                AuditCommand::Record(record) => {
                    let elapsed_minutes = start.elapsed().as_secs() / 60;
                    writer
                        .write_all(record.to_line(elapsed_minutes).as_bytes())
                        .await?;
                    written += 1;
                }
                AuditCommand::Stop => break,
            }
        }
        writer.flush().await?;
        debug!(path = %self.path.display(), written, "audit log stopped");
        Ok(written)
    }
}
