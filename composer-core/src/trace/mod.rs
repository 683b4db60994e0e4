//! Composition traces
//!
//! Every composition produces one [`TraceRecord`]. The [`TraceRecorder`]
//! keeps recent traces for feedback lookups, feeds the
//! [`PerformanceMonitor`] and appends to a [`TraceLog`] in the background.

mod log;
mod monitor;
mod record;
mod recorder;

pub use log::{InMemoryTraceLog, JsonlTraceLog, TraceLog};
pub use monitor::{PerformanceMonitor, PerformanceSummary, TIMING_WINDOW};
pub use record::{ANSWER_PREVIEW_CHARS, TraceRecord};
pub use recorder::{RECENT_TRACES, TraceRecorder};
