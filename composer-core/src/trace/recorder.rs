//! Fire-and-forget trace recording

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use super::{PerformanceMonitor, PerformanceSummary, TraceLog, TraceRecord};
use crate::error::Result;

/// Traces kept in memory for feedback lookups
pub const RECENT_TRACES: usize = 1000;

/// Messages sent to the background trace writer task.
#[derive(Debug)]
enum WriterMessage {
    Record(Box<TraceRecord>),
    Shutdown,
}

struct Writer {
    tx: mpsc::UnboundedSender<WriterMessage>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// Records composition traces without blocking the caller.
///
/// Every trace is kept in a bounded in-memory window, counted by the
/// [`PerformanceMonitor`] and, when a log is attached, appended to it by a
/// background task in submission order.
pub struct TraceRecorder {
    log: Option<Arc<dyn TraceLog>>,
    writer: Option<Writer>,
    recent: Mutex<VecDeque<TraceRecord>>,
    monitor: PerformanceMonitor,
}

impl TraceRecorder {
    /// Recorder persisting to `log`. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn(log: Arc<dyn TraceLog>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Self::writer_task(Arc::clone(&log), rx));
        Self {
            log: Some(log),
            writer: Some(Writer {
                tx,
                handle: Mutex::new(Some(handle)),
            }),
            recent: Mutex::new(VecDeque::with_capacity(RECENT_TRACES)),
            monitor: PerformanceMonitor::new(),
        }
    }

    /// Memory-only recorder
    pub fn detached() -> Self {
        Self {
            log: None,
            writer: None,
            recent: Mutex::new(VecDeque::with_capacity(RECENT_TRACES)),
            monitor: PerformanceMonitor::new(),
        }
    }

    async fn writer_task(log: Arc<dyn TraceLog>, mut rx: mpsc::UnboundedReceiver<WriterMessage>) {
        debug!("Trace writer task started");

        while let Some(msg) = rx.recv().await {
            match msg {
                WriterMessage::Record(record) => {
                    if let Err(e) = log.append(&record).await {
                        error!(trace_id = %record.trace_id(), error = %e, "Failed to write trace");
                    }
                }
                WriterMessage::Shutdown => {
                    debug!("Trace writer received shutdown signal");
                    break;
                }
            }
        }

        debug!("Trace writer task stopped");
    }

    /// Record a trace. Non-blocking.
    pub fn record(&self, record: TraceRecord) {
        self.monitor.observe(&record);
        trace!(trace_id = %record.trace_id(), success = record.success, "Trace recorded");

        {
            let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
            if recent.len() == RECENT_TRACES {
                recent.pop_front();
            }
            recent.push_back(record.clone());
        }

        if let Some(writer) = &self.writer {
            if writer
                .tx
                .send(WriterMessage::Record(Box::new(record)))
                .is_err()
            {
                error!("Trace writer is gone, trace dropped");
            }
        }
    }

    /// Latest trace for `trace_id`, from memory first and then the log
    pub async fn lookup(&self, trace_id: &str) -> Result<Option<TraceRecord>> {
        let cached = self
            .recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|r| r.trace_id() == trace_id)
            .cloned();
        if cached.is_some() {
            return Ok(cached);
        }

        match &self.log {
            Some(log) => log.find(trace_id).await,
            None => Ok(None),
        }
    }

    pub fn performance(&self) -> PerformanceSummary {
        self.monitor.summary()
    }

    /// Stop the writer after everything already queued has been written
    pub async fn shutdown(&self) {
        let Some(writer) = &self.writer else {
            return;
        };
        let _ = writer.tx.send(WriterMessage::Shutdown);
        let handle = writer
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Trace writer task failed");
            }
        }
    }
}
