//! Record store data types
//!
//! Wire-level entities for the four record kinds, their creation shapes,
//! and the session partial-update shape. Entities are constructed fully on
//! the server side: `id` is a generated UUIDv4 string (never the database's
//! own key) and timestamps are UTC.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table names for the four record kinds (configurable, defaults below)
#[derive(Debug, Clone)]
pub struct TableNames {
    pub status_checks: String,
    pub detection_events: String,
    pub session_logs: String,
    pub screenshots: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            status_checks: "status_checks".to_string(),
            detection_events: "detection_events".to_string(),
            session_logs: "session_logs".to_string(),
            screenshots: "screenshots".to_string(),
        }
    }
}

/// Server-side creation timestamp.
///
/// Truncated to milliseconds so the entity echoed from a create matches
/// what a later read returns from the DATETIME(3) columns.
fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ========================================
// StatusCheck
// ========================================

/// Health-check ping from a client. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

/// Creation shape for StatusCheck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

impl StatusCheck {
    pub fn new(req: StatusCheckCreate) -> Self {
        Self {
            id: new_id(),
            client_name: req.client_name,
            timestamp: now_utc(),
        }
    }
}

// ========================================
// DetectionEvent
// ========================================

/// A single sensor/ML observation logged by the client.
///
/// `detection_type` is nominally "pose", "anomaly" or "spirit_box" but is an
/// open string domain; no value validation happens server-side. Confidence
/// and EMF readings are opaque numbers produced by the client pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub detection_type: String,
    pub confidence: f64,
    pub keypoints_count: i32,
    pub emf_level: f64,
    pub spirit_box_frequency: Option<f64>,
    /// Base64 encoded image
    pub screenshot_data: Option<String>,
    pub notes: Option<String>,
}

/// Creation shape for DetectionEvent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionEventCreate {
    pub detection_type: String,
    pub confidence: f64,
    #[serde(default)]
    pub keypoints_count: i32,
    #[serde(default)]
    pub emf_level: f64,
    #[serde(default)]
    pub spirit_box_frequency: Option<f64>,
    #[serde(default)]
    pub screenshot_data: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DetectionEvent {
    pub fn new(req: DetectionEventCreate) -> Self {
        Self {
            id: new_id(),
            timestamp: now_utc(),
            detection_type: req.detection_type,
            confidence: req.confidence,
            keypoints_count: req.keypoints_count,
            emf_level: req.emf_level,
            spirit_box_frequency: req.spirit_box_frequency,
            screenshot_data: req.screenshot_data,
            notes: req.notes,
        }
    }
}

// ========================================
// SessionLog
// ========================================

/// Grouping record for one monitoring session.
///
/// Created empty, then mutated in place via partial updates as the client
/// closes out the session. `detection_events` holds DetectionEvent ids as
/// soft references; dangling ids are acceptable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub id: String,
    pub session_start: DateTime<Utc>,
    pub session_end: Option<DateTime<Utc>>,
    pub total_detections: i32,
    pub max_emf_level: f64,
    pub detection_events: Vec<String>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            id: new_id(),
            session_start: now_utc(),
            session_end: None,
            total_detections: 0,
            max_emf_level: 0.0,
            detection_events: Vec::new(),
        }
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Partial-update shape for SessionLog.
///
/// Only fields present and non-null are applied; everything else is left
/// untouched in the stored record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionLogUpdate {
    #[serde(default)]
    pub session_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_detections: Option<i32>,
    #[serde(default)]
    pub max_emf_level: Option<f64>,
    #[serde(default)]
    pub detection_events: Option<Vec<String>>,
}

impl SessionLogUpdate {
    /// True when no field carries a new value
    pub fn is_empty(&self) -> bool {
        self.session_end.is_none()
            && self.total_detections.is_none()
            && self.max_emf_level.is_none()
            && self.detection_events.is_none()
    }
}

// ========================================
// Screenshot
// ========================================

/// Captured image with detection context.
///
/// The bulk `image_data` payload is only returned by get-by-id; listings use
/// [`ScreenshotMeta`] to keep response sizes bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Screenshot {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Base64 encoded image
    pub image_data: String,
    pub detection_count: i32,
    pub emf_level: f64,
    pub notes: String,
}

/// Creation shape for Screenshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotCreate {
    pub image_data: String,
    #[serde(default)]
    pub detection_count: i32,
    #[serde(default)]
    pub emf_level: f64,
    #[serde(default)]
    pub notes: String,
}

impl Screenshot {
    pub fn new(req: ScreenshotCreate) -> Self {
        Self {
            id: new_id(),
            timestamp: now_utc(),
            image_data: req.image_data,
            detection_count: req.detection_count,
            emf_level: req.emf_level,
            notes: req.notes,
        }
    }
}

/// Screenshot list projection (no `image_data`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotMeta {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub detection_count: i32,
    pub emf_level: f64,
    pub notes: String,
}

impl From<&Screenshot> for ScreenshotMeta {
    fn from(shot: &Screenshot) -> Self {
        Self {
            id: shot.id.clone(),
            timestamp: shot.timestamp,
            detection_count: shot.detection_count,
            emf_level: shot.emf_level,
            notes: shot.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_check_new_fills_server_fields() {
        let check = StatusCheck::new(StatusCheckCreate {
            client_name: "sls-app".to_string(),
        });
        assert!(!check.id.is_empty());
        assert_eq!(check.client_name, "sls-app");
        assert_eq!(check.timestamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = SessionLog::new();
        let b = SessionLog::new();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_session_log_new_defaults() {
        let session = SessionLog::new();
        assert!(session.session_end.is_none());
        assert_eq!(session.total_detections, 0);
        assert_eq!(session.max_emf_level, 0.0);
        assert!(session.detection_events.is_empty());
    }

    #[test]
    fn test_detection_create_defaults_from_minimal_body() {
        let req: DetectionEventCreate =
            serde_json::from_str(r#"{"detection_type": "pose", "confidence": 0.5}"#)
                .expect("deserialize");
        assert_eq!(req.keypoints_count, 0);
        assert_eq!(req.emf_level, 0.0);
        assert!(req.spirit_box_frequency.is_none());
        assert!(req.screenshot_data.is_none());
        assert!(req.notes.is_none());
    }

    #[test]
    fn test_detection_create_ignores_unknown_fields() {
        let req: DetectionEventCreate = serde_json::from_str(
            r#"{"detection_type": "anomaly", "confidence": 0.9, "extra_field": 1}"#,
        )
        .expect("deserialize");
        assert_eq!(req.detection_type, "anomaly");
    }

    #[test]
    fn test_session_update_empty_body() {
        let update: SessionLogUpdate = serde_json::from_str("{}").expect("deserialize");
        assert!(update.is_empty());
    }

    #[test]
    fn test_session_update_null_equals_absent() {
        let update: SessionLogUpdate =
            serde_json::from_str(r#"{"session_end": null, "total_detections": 3}"#)
                .expect("deserialize");
        assert!(update.session_end.is_none());
        assert_eq!(update.total_detections, Some(3));
        assert!(!update.is_empty());
    }

    #[test]
    fn test_session_serializes_null_session_end() {
        let session = SessionLog::new();
        let value = serde_json::to_value(&session).expect("serialize");
        assert!(value.get("session_end").expect("key present").is_null());
    }

    #[test]
    fn test_screenshot_meta_has_no_image_data() {
        let shot = Screenshot::new(ScreenshotCreate {
            image_data: "aGVsbG8=".to_string(),
            detection_count: 2,
            emf_level: 1.5,
            notes: String::new(),
        });
        let meta = ScreenshotMeta::from(&shot);
        let value = serde_json::to_value(&meta).expect("serialize");
        assert!(value.get("image_data").is_none());
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(shot.id.as_str()));
    }

    #[test]
    fn test_table_names_defaults() {
        let tables = TableNames::default();
        assert_eq!(tables.status_checks, "status_checks");
        assert_eq!(tables.detection_events, "detection_events");
        assert_eq!(tables.session_logs, "session_logs");
        assert_eq!(tables.screenshots, "screenshots");
    }
}
