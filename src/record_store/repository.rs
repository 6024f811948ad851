//! MySQL record store
//!
//! Database access layer for the four record tables. Queries are built with
//! the configured table names; all values go through positional binds.

use super::types::*;
use super::RecordStore;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// Build the SET clauses for a session partial update, in bind order.
///
/// Fields absent from the payload contribute nothing, so the stored values
/// survive the update untouched.
fn session_set_clauses(update: &SessionLogUpdate) -> Vec<&'static str> {
    let mut clauses = Vec::new();
    if update.session_end.is_some() {
        clauses.push("session_end = ?");
    }
    if update.total_detections.is_some() {
        clauses.push("total_detections = ?");
    }
    if update.max_emf_level.is_some() {
        clauses.push("max_emf_level = ?");
    }
    if update.detection_events.is_some() {
        clauses.push("detection_events = ?");
    }
    clauses
}

fn to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

/// MySQL-backed [`RecordStore`]
#[derive(Clone)]
pub struct MySqlRecordStore {
    pool: MySqlPool,
    tables: TableNames,
}

impl MySqlRecordStore {
    /// DetectionEvent SELECT columns
    const DETECTION_COLUMNS: &'static str = r#"
        id, timestamp, detection_type, confidence, keypoints_count,
        emf_level, spirit_box_frequency, screenshot_data, notes
    "#;

    /// SessionLog SELECT columns
    const SESSION_COLUMNS: &'static str = r#"
        id, session_start, session_end, total_detections, max_emf_level,
        detection_events
    "#;

    /// Create new store on an existing pool
    pub fn new(pool: MySqlPool, tables: TableNames) -> Self {
        Self { pool, tables }
    }

    /// Create the record tables if they do not exist yet.
    ///
    /// Timestamps are DATETIME(3) holding UTC wall-clock values; bulk image
    /// payloads are LONGTEXT. Idempotent, run once at startup.
    pub async fn ensure_schema(&self) -> Result<()> {
        let statements = [
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id VARCHAR(36) PRIMARY KEY,
                    client_name VARCHAR(255) NOT NULL,
                    timestamp DATETIME(3) NOT NULL,
                    INDEX idx_timestamp (timestamp)
                )
                "#,
                self.tables.status_checks
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id VARCHAR(36) PRIMARY KEY,
                    timestamp DATETIME(3) NOT NULL,
                    detection_type VARCHAR(255) NOT NULL,
                    confidence DOUBLE NOT NULL,
                    keypoints_count INT NOT NULL DEFAULT 0,
                    emf_level DOUBLE NOT NULL DEFAULT 0,
                    spirit_box_frequency DOUBLE NULL,
                    screenshot_data LONGTEXT NULL,
                    notes TEXT NULL,
                    INDEX idx_timestamp (timestamp)
                )
                "#,
                self.tables.detection_events
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id VARCHAR(36) PRIMARY KEY,
                    session_start DATETIME(3) NOT NULL,
                    session_end DATETIME(3) NULL,
                    total_detections INT NOT NULL DEFAULT 0,
                    max_emf_level DOUBLE NOT NULL DEFAULT 0,
                    detection_events TEXT NOT NULL,
                    INDEX idx_session_start (session_start)
                )
                "#,
                self.tables.session_logs
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {} (
                    id VARCHAR(36) PRIMARY KEY,
                    timestamp DATETIME(3) NOT NULL,
                    image_data LONGTEXT NOT NULL,
                    detection_count INT NOT NULL DEFAULT 0,
                    emf_level DOUBLE NOT NULL DEFAULT 0,
                    notes TEXT NOT NULL,
                    INDEX idx_timestamp (timestamp)
                )
                "#,
                self.tables.screenshots
            ),
        ];

        for statement in &statements {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        tracing::info!(
            status_checks = %self.tables.status_checks,
            detection_events = %self.tables.detection_events,
            session_logs = %self.tables.session_logs,
            screenshots = %self.tables.screenshots,
            "Record tables ensured"
        );

        Ok(())
    }

    /// Get session by id (internal; the API has no session get endpoint)
    async fn get_session(&self, id: &str) -> Result<Option<SessionLog>> {
        let query = format!(
            "SELECT {} FROM {} WHERE id = ?",
            Self::SESSION_COLUMNS,
            self.tables.session_logs
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_session).transpose()
    }
}

#[async_trait]
impl RecordStore for MySqlRecordStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ========================================
    // StatusCheck
    // ========================================

    async fn insert_status(&self, check: &StatusCheck) -> Result<()> {
        let query = format!(
            "INSERT INTO {} (id, client_name, timestamp) VALUES (?, ?, ?)",
            self.tables.status_checks
        );
        sqlx::query(&query)
            .bind(&check.id)
            .bind(&check.client_name)
            .bind(check.timestamp)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_status(&self) -> Result<Vec<StatusCheck>> {
        let query = format!(
            "SELECT id, client_name, timestamp FROM {} ORDER BY timestamp DESC LIMIT 1000",
            self.tables.status_checks
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.into_iter().map(row_to_status).collect()
    }

    // ========================================
    // DetectionEvent
    // ========================================

    async fn insert_detection(&self, event: &DetectionEvent) -> Result<()> {
        let query = format!(
            r#"
            INSERT INTO {} (
                id, timestamp, detection_type, confidence, keypoints_count,
                emf_level, spirit_box_frequency, screenshot_data, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            self.tables.detection_events
        );
        sqlx::query(&query)
            .bind(&event.id)
            .bind(event.timestamp)
            .bind(&event.detection_type)
            .bind(event.confidence)
            .bind(event.keypoints_count)
            .bind(event.emf_level)
            .bind(event.spirit_box_frequency)
            .bind(&event.screenshot_data)
            .bind(&event.notes)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_detections(&self, limit: u32) -> Result<Vec<DetectionEvent>> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY timestamp DESC LIMIT ?",
            Self::DETECTION_COLUMNS,
            self.tables.detection_events
        );
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_detection).collect()
    }

    async fn get_detection(&self, id: &str) -> Result<Option<DetectionEvent>> {
        let query = format!(
            "SELECT {} FROM {} WHERE id = ?",
            Self::DETECTION_COLUMNS,
            self.tables.detection_events
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_detection).transpose()
    }

    async fn delete_detection(&self, id: &str) -> Result<bool> {
        let query = format!("DELETE FROM {} WHERE id = ?", self.tables.detection_events);
        let result = sqlx::query(&query).bind(id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    // ========================================
    // SessionLog
    // ========================================

    async fn insert_session(&self, session: &SessionLog) -> Result<()> {
        let detection_events = serde_json::to_string(&session.detection_events)?;
        let query = format!(
            r#"
            INSERT INTO {} (
                id, session_start, session_end, total_detections, max_emf_level,
                detection_events
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
            self.tables.session_logs
        );
        sqlx::query(&query)
            .bind(&session.id)
            .bind(session.session_start)
            .bind(session.session_end)
            .bind(session.total_detections)
            .bind(session.max_emf_level)
            .bind(&detection_events)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_sessions(&self, limit: u32) -> Result<Vec<SessionLog>> {
        let query = format!(
            "SELECT {} FROM {} ORDER BY session_start DESC LIMIT ?",
            Self::SESSION_COLUMNS,
            self.tables.session_logs
        );
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_session).collect()
    }

    async fn update_session(
        &self,
        id: &str,
        update: &SessionLogUpdate,
    ) -> Result<Option<SessionLog>> {
        let set_clauses = session_set_clauses(update);
        if set_clauses.is_empty() {
            // Nothing to apply, degenerate to a read
            return self.get_session(id).await;
        }

        let query = format!(
            "UPDATE {} SET {} WHERE id = ?",
            self.tables.session_logs,
            set_clauses.join(", ")
        );

        // Bind in the same order as session_set_clauses
        let mut q = sqlx::query(&query);
        if let Some(v) = update.session_end {
            q = q.bind(v);
        }
        if let Some(v) = update.total_detections {
            q = q.bind(v);
        }
        if let Some(v) = update.max_emf_level {
            q = q.bind(v);
        }
        if let Some(ref v) = update.detection_events {
            q = q.bind(serde_json::to_string(v)?);
        }
        q = q.bind(id);
        q.execute(&self.pool).await?;

        self.get_session(id).await
    }

    // ========================================
    // Screenshot
    // ========================================

    async fn insert_screenshot(&self, shot: &Screenshot) -> Result<()> {
        let query = format!(
            r#"
            INSERT INTO {} (
                id, timestamp, image_data, detection_count, emf_level, notes
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
            self.tables.screenshots
        );
        sqlx::query(&query)
            .bind(&shot.id)
            .bind(shot.timestamp)
            .bind(&shot.image_data)
            .bind(shot.detection_count)
            .bind(shot.emf_level)
            .bind(&shot.notes)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_screenshots(&self, limit: u32) -> Result<Vec<ScreenshotMeta>> {
        // image_data is excluded from the projection to bound payload size
        let query = format!(
            "SELECT id, timestamp, detection_count, emf_level, notes FROM {} ORDER BY timestamp DESC LIMIT ?",
            self.tables.screenshots
        );
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_screenshot_meta).collect()
    }

    async fn get_screenshot(&self, id: &str) -> Result<Option<Screenshot>> {
        let query = format!(
            "SELECT id, timestamp, image_data, detection_count, emf_level, notes FROM {} WHERE id = ?",
            self.tables.screenshots
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_screenshot).transpose()
    }
}

// ========================================
// Row conversions
// ========================================

fn row_to_status(row: MySqlRow) -> Result<StatusCheck> {
    let timestamp: NaiveDateTime = row.try_get("timestamp")?;

    Ok(StatusCheck {
        id: row.try_get("id")?,
        client_name: row.try_get("client_name")?,
        timestamp: to_utc(timestamp),
    })
}

fn row_to_detection(row: MySqlRow) -> Result<DetectionEvent> {
    let timestamp: NaiveDateTime = row.try_get("timestamp")?;

    Ok(DetectionEvent {
        id: row.try_get("id")?,
        timestamp: to_utc(timestamp),
        detection_type: row.try_get("detection_type")?,
        confidence: row.try_get("confidence")?,
        keypoints_count: row.try_get("keypoints_count")?,
        emf_level: row.try_get("emf_level")?,
        spirit_box_frequency: row.try_get("spirit_box_frequency")?,
        screenshot_data: row.try_get("screenshot_data")?,
        notes: row.try_get("notes")?,
    })
}

fn row_to_session(row: MySqlRow) -> Result<SessionLog> {
    let session_start: NaiveDateTime = row.try_get("session_start")?;
    let session_end: Option<NaiveDateTime> = row.try_get("session_end")?;
    let detection_events_str: String = row.try_get("detection_events")?;
    let detection_events: Vec<String> = serde_json::from_str(&detection_events_str)?;

    Ok(SessionLog {
        id: row.try_get("id")?,
        session_start: to_utc(session_start),
        session_end: session_end.map(to_utc),
        total_detections: row.try_get("total_detections")?,
        max_emf_level: row.try_get("max_emf_level")?,
        detection_events,
    })
}

fn row_to_screenshot(row: MySqlRow) -> Result<Screenshot> {
    let timestamp: NaiveDateTime = row.try_get("timestamp")?;

    Ok(Screenshot {
        id: row.try_get("id")?,
        timestamp: to_utc(timestamp),
        image_data: row.try_get("image_data")?,
        detection_count: row.try_get("detection_count")?,
        emf_level: row.try_get("emf_level")?,
        notes: row.try_get("notes")?,
    })
}

fn row_to_screenshot_meta(row: MySqlRow) -> Result<ScreenshotMeta> {
    let timestamp: NaiveDateTime = row.try_get("timestamp")?;

    Ok(ScreenshotMeta {
        id: row.try_get("id")?,
        timestamp: to_utc(timestamp),
        detection_count: row.try_get("detection_count")?,
        emf_level: row.try_get("emf_level")?,
        notes: row.try_get("notes")?,
    })
}
