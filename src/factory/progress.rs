//! Progress reporting for factory runs.
//!
//! The pipeline never prints. It notifies a [`ProgressSink`] at fixed
//! checkpoints and the caller decides what to do with the events.

use std::path::PathBuf;

/// A checkpoint reached by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Copy generation is starting for `total` records
    CopiesStarted { total: usize },
    /// Copies for one record were generated (`index` is 1-based)
    RecordProcessed {
        index: usize,
        total: usize,
        sheet: String,
        row: u32,
    },
    /// One output document was assembled (`index` is 1-based)
    DocumentAssembled {
        index: usize,
        total: usize,
        instances: usize,
    },
    /// One output document was written
    DocumentWritten { path: PathBuf },
}

/// Receiver of pipeline progress events.
pub trait ProgressSink {
    /// Handle one event.
    fn on_event(&mut self, event: ProgressEvent);
}

impl<F: FnMut(ProgressEvent)> ProgressSink for F {
    fn on_event(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&mut self, _event: ProgressEvent) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_event(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::CopiesStarted { total } => {
                tracing::info!(records = total, "creating copies");
            },
            ProgressEvent::RecordProcessed {
                index,
                total,
                sheet,
                row,
            } => {
                tracing::debug!(
                    percent = index * 100 / total.max(1),
                    sheet = sheet.as_str(),
                    row,
                    "record processed"
                );
            },
            ProgressEvent::DocumentAssembled {
                index,
                total,
                instances,
            } => {
                tracing::debug!(document = index, of = total, instances, "document assembled");
            },
            ProgressEvent::DocumentWritten { path } => {
                tracing::info!(path = %path.display(), "document written");
            },
        }
    }
}
