use serde::Serialize;

/// Why a single record was left out of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipKind {
    /// The feed element could not be read as an event at all.
    FeedRecordRejected,
    /// No match and creating the event failed.
    EventResolutionSkipped,
    /// A head-to-head market could not be turned into a fight.
    ExtractionFailed,
    /// The store rejected an individual write.
    PersistenceWriteFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedItem {
    pub raw_identifier: String,
    pub kind: SkipKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub events_created: usize,
    pub events_matched: usize,
    pub fights_upserted: usize,
    pub skipped: Vec<SkippedItem>,
}

impl SyncReport {
    pub fn skip(&mut self, raw_identifier: impl Into<String>, kind: SkipKind, reason: impl Into<String>) {
        self.skipped.push(SkippedItem {
            raw_identifier: raw_identifier.into(),
            kind,
            reason: reason.into(),
        });
    }
}

/// Body of `GET /sync`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SyncResponse {
    Completed {
        success: bool,
        #[serde(flatten)]
        report: SyncReport,
    },
    Failed {
        success: bool,
        error: String,
    },
}

impl SyncResponse {
    pub fn completed(report: SyncReport) -> Self {
        SyncResponse::Completed { success: true, report }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        SyncResponse::Failed {
            success: false,
            error: error.into(),
        }
    }
}
