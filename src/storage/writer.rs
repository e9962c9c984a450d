//! Background product writer
//!
//! During a crawl the storage backend is owned by a single blocking task that
//! drains a channel of product records. Stage tasks only ever send, so a slow
//! disk never stalls fetching or parsing.

use crate::pipeline::ProductRecord;
use crate::storage::Storage;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

/// What the writer did over its lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterReport {
    pub written: u64,
    pub failed: u64,
}

/// Sending side of a running writer
pub struct WriterHandle<S> {
    sender: mpsc::UnboundedSender<ProductRecord>,
    task: JoinHandle<(S, WriterReport)>,
}

impl<S> WriterHandle<S> {
    /// A sender for handing records to the writer
    pub fn sender(&self) -> mpsc::UnboundedSender<ProductRecord> {
        self.sender.clone()
    }

    /// Closes the channel and waits until every queued record is written
    ///
    /// Returns the storage backend so the caller can keep using it. Records
    /// sent through clones of [`WriterHandle::sender`] are drained only after
    /// all clones are dropped.
    pub async fn finish(self) -> Result<(S, WriterReport), JoinError> {
        drop(self.sender);
        self.task.await
    }
}

/// Moves `storage` onto a blocking task that persists every record it receives
pub fn spawn_writer<S>(mut storage: S) -> WriterHandle<S>
where
    S: Storage + Send + 'static,
{
    let (sender, mut receiver) = mpsc::unbounded_channel::<ProductRecord>();

    let task = tokio::task::spawn_blocking(move || {
        let mut report = WriterReport::default();

        while let Some(record) = receiver.blocking_recv() {
            match storage.upsert_product(&record) {
                Ok(id) => {
                    tracing::trace!("Stored product {} ({})", id, record.part_number);
                    report.written += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to store part {} for {} {}: {}",
                        record.part_number,
                        record.make,
                        record.model,
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            "Writer finished: {} written, {} failed",
            report.written,
            report.failed
        );
        (storage, report)
    });

    WriterHandle { sender, task }
}
