//! Pulse Pipeline - Ingestion, live sets and rotation
//!
//! Owns the bounded in-memory live sets and everything that mutates them.
//!
//! # Architecture
//!
//! ```text
//!  raw JSON ──→ Enricher ──→ LiveSet (VecDeque + Index) ──→ Persistence ──→ TapPoint
//!                 │             │ FIFO cap                   incremental     push / pull
//!            validation      SourceRegistry                  or bulk save    subscribers
//!              error
//!
//!  RotationScheduler ──poll──→ snapshot ──→ ArchiveStore ──→ clear snapshotted ids ──→ save
//! ```
//!
//! # Key Design
//!
//! - **No await under a lock**: live-set mutation and the paired index update
//!   happen synchronously inside one `parking_lot` critical section; durable
//!   writes and fan-out follow as separate steps
//! - **Shared entries**: entries are `Arc`-shared between the live set, the
//!   index, persistence snapshots and subscriber channels
//! - **Best-effort durability**: persistence never fails a submission, it is
//!   counted in [`IngestMetrics`]
//! - **Fail-fast batches**: a batch is validated in full before anything is
//!   inserted; bulk import collects per-item errors instead
//!
//! # Example
//!
//! ```ignore
//! let pipeline = Arc::new(Pipeline::new(&config.ingest, persistence, tap));
//! pipeline.load().await;
//!
//! let accepted = pipeline.submit_log(body, Some("web")).await?;
//! let page = pipeline.query_logs(&LogQuery::default());
//!
//! let scheduler = Arc::new(RotationScheduler::recover(pipeline, archives, &config.rotation).await);
//! scheduler.spawn(cancel.clone());
//! ```

mod enrich;
mod error;
mod live;
mod maintenance;
mod metrics;
mod pipeline;
mod query;
mod rotation;
mod sources;
mod structure;

#[cfg(test)]
mod testutil;

pub use enrich::{Enricher, generate_id};
pub use error::{PipelineError, Result};
pub use live::{Admission, BulkOutcome, LiveSet};
pub use maintenance::spawn_source_cleanup;
pub use metrics::{IngestMetrics, MetricsSnapshot};
pub use pipeline::{
    Accepted, ImportError, ImportReport, ImportRequest, IndexSummary, LoadReport, Pipeline,
    PipelineStats,
};
pub use query::{LogQuery, MonitoringQuery, Page, parse_time_bound};
pub use rotation::{
    RotationReport, RotationScheduler, RotationState, RotationStatus, RotationTrigger,
};
pub use sources::{Registration, SourceRegistry};
pub use structure::{MonitoringStructure, ScriptView};
