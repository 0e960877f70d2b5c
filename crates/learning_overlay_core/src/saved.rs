//! Saved-course reconciliation.
//!
//! The saved overlay stores full course snapshots taken at save time. Membership is
//! decided by id alone, so a snapshot that has drifted from the remote course still
//! counts as saved.

use crate::domain::{Course, CourseView};

/// Result of toggling a course in the saved overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    /// The overlay to persist.
    pub overlay: Vec<Course>,
    /// Whether the course is saved after the toggle.
    pub saved: bool,
}

impl ToggleOutcome {
    /// Confirmation wording for the caller to surface.
    pub fn message(&self) -> &'static str {
        if self.saved {
            "Course saved"
        } else {
            "Course removed from saved"
        }
    }
}

pub fn is_saved(course_id: &str, overlay: &[Course]) -> bool {
    overlay.iter().any(|snapshot| snapshot.id == course_id)
}

/// Sets the `saved` flag on every view from the overlay.
pub fn annotate_saved(views: Vec<CourseView>, overlay: &[Course]) -> Vec<CourseView> {
    views
        .into_iter()
        .map(|mut view| {
            view.saved = is_saved(view.id(), overlay);
            view
        })
        .collect()
}

/// Removes a course if it is saved, otherwise appends the given snapshot.
pub fn toggle_saved(course: &Course, overlay: Vec<Course>) -> ToggleOutcome {
    if is_saved(&course.id, &overlay) {
        ToggleOutcome {
            overlay: remove_saved(&course.id, overlay),
            saved: false,
        }
    } else {
        let mut overlay = overlay;
        overlay.push(course.clone());
        ToggleOutcome { overlay, saved: true }
    }
}

/// Drops every snapshot carrying `course_id`, duplicates included.
pub fn remove_saved(course_id: &str, overlay: Vec<Course>) -> Vec<Course> {
    overlay.into_iter().filter(|snapshot| snapshot.id != course_id).collect()
}
