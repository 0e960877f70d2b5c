//! crates/learning_overlay_core/src/domain.rs
//!
//! Defines the core data structures for the application: the records that arrive from
//! the remote content source and the view models produced by the reconcilers.
//!
//! Field names are serialized in the camelCase shape the content database and the
//! persisted overlays use (`coursId`, `ordre`, `reviewCount`, ...), so a course snapshot
//! written to the saved-courses overlay reads back unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Remote Entities
//=========================================================================================

/// A course as published in the content database.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub category: String,
    pub description: String,
    pub introduction: String,
    pub level: String,
    pub duration: String,
    pub review_count: i64,
    pub video_url: String,
    /// Chapter-count metadata kept on the course document. The progress join never
    /// reads it; chapters are matched through `Chapter::cours_id`.
    pub chapters: Vec<String>,
}

/// A single lesson of a course.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Chapter {
    pub id: String,
    #[serde(rename = "coursId")]
    pub cours_id: String,
    pub titre: String,
    pub description: String,
    pub contenu: String,
    /// Ordering key within the course. Not necessarily contiguous.
    pub ordre: Option<i64>,
    pub video_url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Article {
    pub id: String,
    pub titre: String,
    pub auteur: String,
    pub contenu: String,
    pub image_url: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A quiz attached to a course, with its questions already normalized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Quiz {
    pub id: String,
    #[serde(rename = "coursId")]
    pub cours_id: String,
    pub titre: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer. `None` when the stored answer
    /// cannot name an option.
    #[serde(rename = "responseCorrecte")]
    pub correct_index: Option<usize>,
}

//=========================================================================================
// View Models
//=========================================================================================

/// A course augmented with the device-local state layered on top of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    #[serde(flatten)]
    pub course: Course,
    pub saved: bool,
    /// Completion percentage in `0.0..=100.0`.
    pub progress: f64,
    pub completed_lessons: usize,
    pub total_lessons: usize,
}

impl CourseView {
    /// Wraps a course with no saved flag and zero progress.
    pub fn new(course: Course) -> Self {
        Self {
            course,
            saved: false,
            progress: 0.0,
            completed_lessons: 0,
            total_lessons: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.course.id
    }
}

/// A chapter of a course detail screen, flagged with its completion state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterView {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub completed: bool,
}

/// Everything the course detail screen renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    #[serde(flatten)]
    pub view: CourseView,
    pub chapter_list: Vec<ChapterView>,
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Course,
    Article,
}

/// A notification as rendered and as persisted in the notifications overlay.
///
/// Only `id` and `read` matter when merging with the overlay; the remaining fields are
/// regenerated on every load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub time: String,
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<String>,
}
