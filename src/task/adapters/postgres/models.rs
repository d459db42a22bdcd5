//! Diesel row models for snapshot persistence.

use super::schema::queue_snapshots;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Insert model for snapshot records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = queue_snapshots)]
pub struct NewSnapshotRow {
    /// Queue namespace key.
    pub namespace: String,
    /// Encoded snapshot document.
    pub payload: Vec<u8>,
    /// Write timestamp.
    pub updated_at: DateTime<Utc>,
}
