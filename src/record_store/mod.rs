//! RecordStore - Persistence for the four record kinds
//!
//! ## Responsibilities
//!
//! - Define the storage seam ([`RecordStore`]) used by the HTTP handlers
//! - MySQL implementation ([`MySqlRecordStore`]) with per-kind tables
//! - Schema bootstrap at startup
//!
//! Each operation is a single-table statement; there are no cross-entity
//! transactions and no caching. The store is injected into [`crate::AppState`]
//! as `Arc<dyn RecordStore>` so tests can substitute an in-memory
//! implementation.

mod repository;
mod types;

pub use repository::MySqlRecordStore;
pub use types::*;

use crate::error::Result;
use async_trait::async_trait;

/// Storage operations for the four record kinds.
///
/// Lookups use the entity's `id` field, never the database's own key.
/// Listings are ordered by primary timestamp descending and never fail on an
/// empty table.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Connectivity probe for the health endpoint
    async fn ping(&self) -> Result<()>;

    // ========================================
    // StatusCheck
    // ========================================

    async fn insert_status(&self, check: &StatusCheck) -> Result<()>;
    async fn list_status(&self) -> Result<Vec<StatusCheck>>;

    // ========================================
    // DetectionEvent
    // ========================================

    async fn insert_detection(&self, event: &DetectionEvent) -> Result<()>;
    async fn list_detections(&self, limit: u32) -> Result<Vec<DetectionEvent>>;
    async fn get_detection(&self, id: &str) -> Result<Option<DetectionEvent>>;
    /// Returns true when at least one row was removed
    async fn delete_detection(&self, id: &str) -> Result<bool>;

    // ========================================
    // SessionLog
    // ========================================

    async fn insert_session(&self, session: &SessionLog) -> Result<()>;
    async fn list_sessions(&self, limit: u32) -> Result<Vec<SessionLog>>;
    /// Apply the fields present in `update`, then re-read. `None` when the id
    /// does not exist.
    async fn update_session(
        &self,
        id: &str,
        update: &SessionLogUpdate,
    ) -> Result<Option<SessionLog>>;

    // ========================================
    // Screenshot
    // ========================================

    async fn insert_screenshot(&self, shot: &Screenshot) -> Result<()>;
    async fn list_screenshots(&self, limit: u32) -> Result<Vec<ScreenshotMeta>>;
    async fn get_screenshot(&self, id: &str) -> Result<Option<Screenshot>>;
}
