//! GhostTube Log Server
//!
//! Backend record store for the GhostTube SLS camera app.
//!
//! ## Architecture
//!
//! 1. RecordStore - persistence for the four record kinds
//! 2. WebAPI - REST API endpoints under /api
//!
//! Detections, confidence scores and EMF levels are produced by the client
//! sensor/ML pipeline; this service only stores and retrieves them. Every
//! operation is a single-table create/list/get/update/delete, so there is no
//! decomposition beyond routing and persistence.

pub mod error;
pub mod models;
pub mod record_store;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
