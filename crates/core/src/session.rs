use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tracking context for one wizard run, created on first use and cleared
/// when the flow completes. Replaces the source system's implicit
/// client-storage tracking ids with an explicit value that is passed to
/// whoever needs it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn start() -> Self {
        Self { id: Uuid::new_v4(), started_at: Utc::now() }
    }

    /// Consume the context once the flow is done. Returns the id so callers
    /// can log the completion against it.
    pub fn finish(self) -> Uuid {
        self.id
    }
}
