//! crates/learning_overlay_core/src/ports.rs
//!
//! Defines the service contracts (traits) at the boundary of the core.
//! The reconcilers never perform I/O themselves; callers fetch through these ports,
//! reconcile, then write back through them.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Article, Chapter, Course, Quiz};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Malformed data: {0}")]
    Malformed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// Whether retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Unexpected(_))
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Held for the duration of one read-reconcile-write cycle on a device's overlays.
pub type OverlayUpdateGuard = tokio::sync::OwnedMutexGuard<()>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read access to the authoritative course content.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// All courses in their natural order, optionally capped at `limit`.
    async fn courses(&self, limit: Option<usize>) -> PortResult<Vec<Course>>;

    async fn course(&self, course_id: &str) -> PortResult<Course>;

    /// The full chapter collection across every course.
    async fn chapters(&self) -> PortResult<Vec<Chapter>>;

    async fn chapter(&self, chapter_id: &str) -> PortResult<Chapter>;

    /// Chapters whose `coursId` equals `course_id`, in no particular order.
    async fn chapters_for_course(&self, course_id: &str) -> PortResult<Vec<Chapter>>;

    /// Articles, newest first, optionally capped at `limit`.
    async fn articles(&self, limit: Option<usize>) -> PortResult<Vec<Article>>;

    async fn article(&self, article_id: &str) -> PortResult<Article>;

    async fn quiz_for_course(&self, course_id: &str) -> PortResult<Quiz>;
}

/// A string-keyed persistent store local to one device.
///
/// A key that was never written reads back as `None`; that is an empty overlay,
/// not an error.
#[async_trait]
pub trait OverlayStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;

    /// Drops every key of this store. Used on logout.
    async fn clear(&self) -> PortResult<()>;

    /// Waits for exclusive update access to this device's overlays.
    ///
    /// Every handle opened for the same device shares one lock, so concurrent requests
    /// of a device cannot interleave their read and write of the same overlay.
    async fn lock_for_update(&self) -> OverlayUpdateGuard;
}

/// Hands out the overlay store belonging to a device.
pub trait OverlayDirectory: Send + Sync {
    fn open(&self, device_id: Uuid) -> Arc<dyn OverlayStore>;
}
