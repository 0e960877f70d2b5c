//! Typed access to the overlays kept in an `OverlayStore`.
//!
//! Each overlay is one JSON document under a fixed key. Reads never fail on content:
//! a missing key or a document that no longer parses yields the empty overlay. Only
//! store I/O errors propagate.

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::domain::{Course, Notification};
use crate::ports::{OverlayStore, PortError, PortResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKey {
    CompletedChapters,
    SavedCourses,
    Notifications,
    SearchHistory,
}

impl OverlayKey {
    pub const ALL: [OverlayKey; 4] = [
        OverlayKey::CompletedChapters,
        OverlayKey::SavedCourses,
        OverlayKey::Notifications,
        OverlayKey::SearchHistory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OverlayKey::CompletedChapters => "completedChapters",
            OverlayKey::SavedCourses => "savedCoursesData",
            OverlayKey::Notifications => "notifications",
            OverlayKey::SearchHistory => "searchHistory",
        }
    }
}

/// Reads and decodes one overlay, falling back to the empty value.
pub async fn read_overlay<T>(store: &dyn OverlayStore, key: OverlayKey) -> PortResult<T>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key.as_str()).await? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key = key.as_str(), error = %e, "malformed overlay treated as empty");
            Ok(T::default())
        }
    }
}

pub async fn write_overlay<T>(store: &dyn OverlayStore, key: OverlayKey, value: &T) -> PortResult<()>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|e| PortError::Malformed(e.to_string()))?;
    store.set(key.as_str(), &raw).await
}

//=========================================================================================
// Per-overlay shorthands
//=========================================================================================

pub async fn completed_chapters(store: &dyn OverlayStore) -> PortResult<Vec<String>> {
    read_overlay(store, OverlayKey::CompletedChapters).await
}

pub async fn saved_courses(store: &dyn OverlayStore) -> PortResult<Vec<Course>> {
    read_overlay(store, OverlayKey::SavedCourses).await
}

pub async fn notifications(store: &dyn OverlayStore) -> PortResult<Vec<Notification>> {
    read_overlay(store, OverlayKey::Notifications).await
}

pub async fn search_history(store: &dyn OverlayStore) -> PortResult<Vec<String>> {
    read_overlay(store, OverlayKey::SearchHistory).await
}

/// Removes every overlay of the device.
pub async fn clear_all(store: &dyn OverlayStore) -> PortResult<()> {
    store.clear().await
}
