// ABN Bulk Extract - Core Library
// Scan -> normalize -> dedupe -> batch-load pipeline over the registry
// bulk extract, plus archive fetching and the SQLite entity store.

pub mod batch;
pub mod dedup;
pub mod entities;
pub mod error_log;
pub mod fetch;
pub mod loader;
pub mod normalizer;
pub mod pipeline;
pub mod scanner;
pub mod store;

// Re-export commonly used types
pub use batch::{EntityCounts, RecordBatch};
pub use entities::{
    Abn, AsicNumber, Blank, Dgr, EntityKind, Gst, LegalEntity, MainEntity, OtherEntity,
};
pub use error_log::ErrorLog;
pub use normalizer::{normalize, NormalizeError, RecordSet};
pub use pipeline::{process, PipelineError, RunReport};
pub use scanner::{Fragment, FragmentScanner};
pub use store::Store;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
