pub mod dedup;
pub mod extractor;
pub mod normalize;
pub mod orchestrator;
pub mod report;
pub mod resolver;

pub use orchestrator::{RetryPolicy, SyncOrchestrator, SyncPhase};
pub use report::{SkipKind, SkippedItem, SyncReport, SyncResponse};
pub use resolver::{EventRef, EventResolver, MatchTier, Resolution};
