//! Progress reconciliation: joins courses with the chapter collection and the
//! completed-chapters overlay.

use std::collections::HashSet;

use crate::domain::{Chapter, ChapterView, Course, CourseView};

/// How the in-progress view orders its courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressOrder {
    /// Keep the order of the input.
    #[default]
    Insertion,
    /// Most advanced first. Ties keep their input order.
    MostAdvancedFirst,
}

/// Lesson counts and percentage for one course.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CourseProgress {
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub progress: f64,
}

impl CourseProgress {
    pub fn from_counts(completed_lessons: usize, total_lessons: usize) -> Self {
        let progress = if total_lessons > 0 {
            completed_lessons as f64 / total_lessons as f64 * 100.0
        } else {
            0.0
        };
        Self {
            completed_lessons,
            total_lessons,
            progress,
        }
    }
}

/// Progress of a single course against the full chapter collection.
pub fn course_progress(course_id: &str, chapters: &[Chapter], completed: &HashSet<&str>) -> CourseProgress {
    let (total, done) = chapters
        .iter()
        .filter(|chapter| chapter.cours_id == course_id)
        .fold((0, 0), |(total, done), chapter| {
            let done = if completed.contains(chapter.id.as_str()) { done + 1 } else { done };
            (total + 1, done)
        });
    CourseProgress::from_counts(done, total)
}

/// Augments every course with its completion state.
///
/// `chapters` must be the full chapter collection; chapters of other courses are
/// simply not matched. Completed ids that match no chapter are ignored.
pub fn compute_progress<S: AsRef<str>>(
    courses: Vec<CourseView>,
    chapters: &[Chapter],
    completed_ids: &[S],
) -> Vec<CourseView> {
    let completed: HashSet<&str> = completed_ids.iter().map(AsRef::as_ref).collect();
    courses
        .into_iter()
        .map(|mut view| {
            let progress = course_progress(view.id(), chapters, &completed);
            view.completed_lessons = progress.completed_lessons;
            view.total_lessons = progress.total_lessons;
            view.progress = progress.progress;
            view
        })
        .collect()
}

/// Wraps plain courses and computes their progress in one step.
pub fn courses_with_progress<S: AsRef<str>>(
    courses: Vec<Course>,
    chapters: &[Chapter],
    completed_ids: &[S],
) -> Vec<CourseView> {
    compute_progress(courses.into_iter().map(CourseView::new).collect(), chapters, completed_ids)
}

/// Keeps the courses the user has started.
pub fn in_progress(views: Vec<CourseView>, order: ProgressOrder) -> Vec<CourseView> {
    let mut started: Vec<CourseView> = views.into_iter().filter(|view| view.progress > 0.0).collect();
    if order == ProgressOrder::MostAdvancedFirst {
        // `sort_by` is stable, so equal progress keeps insertion order.
        started.sort_by(|a, b| b.progress.total_cmp(&a.progress));
    }
    started
}

/// The chapters of one course in reading order, flagged with completion.
///
/// Chapters without an `ordre` sort as 0; equal keys keep their input order.
pub fn chapter_progress<S: AsRef<str>>(chapters: Vec<Chapter>, completed_ids: &[S]) -> Vec<ChapterView> {
    let completed: HashSet<&str> = completed_ids.iter().map(AsRef::as_ref).collect();
    let mut ordered = chapters;
    ordered.sort_by_key(|chapter| chapter.ordre.unwrap_or(0));
    ordered
        .into_iter()
        .map(|chapter| {
            let completed = completed.contains(chapter.id.as_str());
            ChapterView { chapter, completed }
        })
        .collect()
}

/// Records a chapter as completed. Returns the updated overlay and whether the
/// chapter was newly added.
pub fn mark_chapter_completed(mut completed_ids: Vec<String>, chapter_id: &str) -> (Vec<String>, bool) {
    if completed_ids.iter().any(|id| id == chapter_id) {
        return (completed_ids, false);
    }
    completed_ids.push(chapter_id.to_string());
    (completed_ids, true)
}
