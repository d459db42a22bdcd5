//! Persisted queue snapshot format.
//!
//! A snapshot is a single JSON document holding minimal task projections.
//! Context payloads, observations, verification signals, and free-form
//! metadata never leave memory.

use super::{PersistedTask, Priority, RoutingTag, Task, TaskId, TaskMetadata, TaskStatus, TicketId};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Metadata fields that survive a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    /// Originating ticket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_ticket_id: Option<TicketId>,
    /// Routing tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingTag>,
    /// Escalation flag.
    #[serde(default)]
    pub escalated: bool,
    /// Task this one follows up on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_of: Option<TaskId>,
}

/// Minimal persisted projection of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotTask {
    /// Task identifier.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Lifecycle status at save time.
    pub status: TaskStatus,
    /// Priority.
    pub priority: Priority,
    /// Dependency ids.
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    /// Hold ids.
    #[serde(default)]
    pub blocked_by: Vec<TaskId>,
    /// Metadata subset.
    #[serde(default)]
    pub metadata: SnapshotMetadata,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl SnapshotTask {
    /// Projects a task, dropping everything that is not persisted.
    #[must_use]
    pub fn project(task: &Task) -> Self {
        let metadata = task.metadata();
        Self {
            id: task.id().clone(),
            title: task.title().to_owned(),
            description: task.description().to_owned(),
            status: task.status(),
            priority: task.priority(),
            dependencies: task.dependencies().to_vec(),
            blocked_by: task.blocked_by().to_vec(),
            metadata: SnapshotMetadata {
                origin_ticket_id: metadata.origin_ticket_id().cloned(),
                routing: metadata.routing(),
                escalated: metadata.escalated(),
                follow_up_of: metadata.follow_up_of().cloned(),
            },
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }

    /// Rebuilds a task from the projection.
    #[must_use]
    pub fn into_task(self) -> Task {
        let mut metadata = TaskMetadata::new();
        if let Some(ticket) = self.metadata.origin_ticket_id {
            metadata = metadata.with_origin_ticket(ticket);
        }
        if let Some(routing) = self.metadata.routing {
            metadata = metadata.with_routing(routing);
        }
        if self.metadata.escalated {
            metadata = metadata.escalate();
        }
        if let Some(original) = self.metadata.follow_up_of {
            metadata = metadata.with_follow_up_of(original);
        }

        Task::from_persisted(PersistedTask {
            id: self.id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            status: self.status,
            dependencies: self.dependencies,
            blocked_by: self.blocked_by,
            metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Bounds applied when selecting tasks for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotPolicy {
    /// Maximum number of tasks in a snapshot.
    pub limit: usize,
    /// How long terminal tasks stay eligible after their last update.
    pub retention: TimeDelta,
}

/// Versioned, checksummed snapshot document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    checksum: String,
    tasks: Vec<SnapshotTask>,
}

/// Errors raised while encoding or decoding snapshots.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SnapshotCodecError {
    /// The payload is not a valid snapshot document.
    #[error("malformed snapshot: {0}")]
    Malformed(String),

    /// The snapshot was written by an unknown format version.
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    /// The task list does not match the recorded checksum.
    #[error("snapshot checksum mismatch")]
    ChecksumMismatch,
}

impl QueueSnapshot {
    /// Builds a snapshot from tasks given in creation order.
    ///
    /// Terminal tasks last updated before the retention window are left out,
    /// except failed tasks an open task still depends on. When more than
    /// `policy.limit` tasks remain, terminal tasks are trimmed first, oldest
    /// first and depended-on failures last, then the oldest active tasks.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotCodecError::Malformed`] if the task list cannot be
    /// serialised for checksumming.
    pub fn capture<'a>(
        tasks: impl IntoIterator<Item = &'a Task>,
        policy: SnapshotPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, SnapshotCodecError> {
        let cutoff = now.checked_sub_signed(policy.retention).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let all: Vec<&Task> = tasks.into_iter().collect();
        let gating: HashSet<&TaskId> = all
            .iter()
            .copied()
            .filter(|task| !task.status().is_terminal())
            .flat_map(Task::dependencies)
            .collect();
        let is_gating = |task: &Task| task.status() == TaskStatus::Failed && gating.contains(task.id());
        let candidates: Vec<&Task> = all
            .into_iter()
            .filter(|task| {
                !task.status().is_terminal() || task.updated_at() >= cutoff || is_gating(task)
            })
            .collect();

        let selected = trim_to_limit(candidates, policy.limit, is_gating);
        let projections = selected.into_iter().map(SnapshotTask::project).collect();
        Self::seal(projections, now)
    }

    /// Wraps projections with version and checksum.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotCodecError::Malformed`] if the projections cannot be
    /// serialised.
    pub fn seal(tasks: Vec<SnapshotTask>, saved_at: DateTime<Utc>) -> Result<Self, SnapshotCodecError> {
        let checksum = checksum_of(&tasks)?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            saved_at,
            checksum,
            tasks,
        })
    }

    /// Serialises the snapshot to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotCodecError::Malformed`] if serialisation fails.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotCodecError> {
        serde_json::to_vec(self).map_err(|err| SnapshotCodecError::Malformed(err.to_string()))
    }

    /// Parses and verifies a stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotCodecError`] for undecodable bytes, an unknown
    /// version, or a checksum that does not match the task list.
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotCodecError> {
        let snapshot: Self = serde_json::from_slice(bytes)
            .map_err(|err| SnapshotCodecError::Malformed(err.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotCodecError::UnsupportedVersion(snapshot.version));
        }
        if checksum_of(&snapshot.tasks)? != snapshot.checksum {
            return Err(SnapshotCodecError::ChecksumMismatch);
        }
        Ok(snapshot)
    }

    /// Returns the format version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns when the snapshot was taken.
    #[must_use]
    pub const fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }

    /// Returns the hex-encoded SHA-256 checksum of the task list.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Returns the projections in creation order.
    #[must_use]
    pub fn tasks(&self) -> &[SnapshotTask] {
        &self.tasks
    }

    /// Consumes the snapshot, returning its projections.
    #[must_use]
    pub fn into_tasks(self) -> Vec<SnapshotTask> {
        self.tasks
    }
}

fn trim_to_limit(
    candidates: Vec<&Task>,
    limit: usize,
    is_gating: impl Fn(&Task) -> bool,
) -> Vec<&Task> {
    let mut excess = candidates.len().saturating_sub(limit);
    if excess == 0 {
        return candidates;
    }

    let mut keep = vec![true; candidates.len()];
    let rank = |task: &Task| match (task.status().is_terminal(), is_gating(task)) {
        (true, false) => 0,
        (true, true) => 1,
        (false, _) => 2,
    };
    let terminal_first = (0..=2)
        .flat_map(|tier| {
            candidates
                .iter()
                .enumerate()
                .filter(move |(_, task)| rank(task) == tier)
        })
        .map(|(position, _)| position);

    for position in terminal_first {
        if excess == 0 {
            break;
        }
        if let Some(flag) = keep.get_mut(position) {
            *flag = false;
            excess -= 1;
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(task, kept)| kept.then_some(task))
        .collect()
}

fn checksum_of(tasks: &[SnapshotTask]) -> Result<String, SnapshotCodecError> {
    let canonical =
        serde_json::to_vec(tasks).map_err(|err| SnapshotCodecError::Malformed(err.to_string()))?;
    Ok(format!("{:x}", Sha256::digest(&canonical)))
}
