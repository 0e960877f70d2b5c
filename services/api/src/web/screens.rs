//! services/api/src/web/screens.rs
//!
//! Loads and mutates the view models behind each screen of the learning app.
//!
//! Every loader follows the same sequence: fetch the remote entities, read the
//! overlays it needs, reconcile. Every mutation re-reads its overlay right before
//! computing the new value and writes the result back; nothing is cached between calls.
//! Mutations hold the device's update lock from that read until the write, so two
//! requests of one device never overwrite each other's changes.

use learning_overlay_core::domain::{Article, ChapterView, Course, CourseDetail, CourseView, Notification, Quiz};
use learning_overlay_core::notifications::{self, generate_notifications, merge_notifications, unread_count};
use learning_overlay_core::overlay::{self, write_overlay, OverlayKey};
use learning_overlay_core::ports::{EntitySource, OverlayStore, PortResult};
use learning_overlay_core::progress::{
    self, chapter_progress, course_progress, courses_with_progress, in_progress, ProgressOrder,
};
use learning_overlay_core::quiz::{score_answers, QuizOutcome};
use learning_overlay_core::saved::{annotate_saved, is_saved, remove_saved, toggle_saved, ToggleOutcome};
use learning_overlay_core::search::{highlight, record_search, search, HighlightSegment, SearchHit};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};
use utoipa::ToSchema;

//=========================================================================================
// Screen Payloads
//=========================================================================================

/// Limits applied to the home screen's lists.
#[derive(Debug, Clone, Copy)]
pub struct HomeLimits {
    pub courses: usize,
    pub articles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HomeScreen {
    #[schema(value_type = Vec<Object>)]
    pub courses: Vec<CourseView>,
    #[schema(value_type = Vec<Object>)]
    pub in_progress: Vec<CourseView>,
    #[schema(value_type = Vec<Object>)]
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    #[schema(value_type = Vec<Object>)]
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

impl NotificationFeed {
    fn from_list(notifications: Vec<Notification>) -> Self {
        let unread_count = unread_count(&notifications);
        Self {
            notifications,
            unread_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSavedResponse {
    pub course_id: String,
    pub saved: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterCompletion {
    pub chapter_id: String,
    pub newly_completed: bool,
}

/// A search hit with the highlighted text the result row renders.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultView {
    #[schema(value_type = Object)]
    pub hit: SearchHit,
    #[schema(value_type = Vec<Object>)]
    pub title: Vec<HighlightSegment>,
    #[schema(value_type = Vec<Object>)]
    pub excerpt: Vec<HighlightSegment>,
}

/// The screens a live client can ask to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Home,
    ContinueLearning,
    Saved,
    Notifications,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScreenPayload {
    Home(HomeScreen),
    Courses(Vec<CourseView>),
    Saved(Vec<Course>),
    Notifications(NotificationFeed),
}

//=========================================================================================
// Courses and Progress
//=========================================================================================

/// Courses joined with progress and saved state.
async fn course_views(
    entities: &dyn EntitySource,
    store: &dyn OverlayStore,
    limit: Option<usize>,
) -> PortResult<Vec<CourseView>> {
    let courses = entities.courses(limit).await?;
    let chapters = entities.chapters().await?;
    let completed = overlay::completed_chapters(store).await?;
    let saved = overlay::saved_courses(store).await?;
    Ok(annotate_saved(courses_with_progress(courses, &chapters, &completed), &saved))
}

pub async fn load_home(entities: &dyn EntitySource, store: &dyn OverlayStore, limits: HomeLimits) -> PortResult<HomeScreen> {
    let courses = course_views(entities, store, Some(limits.courses)).await?;
    let started = in_progress(courses.clone(), ProgressOrder::Insertion);
    let articles = entities.articles(Some(limits.articles)).await?;
    debug!(courses = courses.len(), in_progress = started.len(), articles = articles.len(), "home loaded");
    Ok(HomeScreen {
        courses,
        in_progress: started,
        articles,
    })
}

pub async fn load_catalog(entities: &dyn EntitySource, store: &dyn OverlayStore) -> PortResult<Vec<CourseView>> {
    course_views(entities, store, None).await
}

/// Started courses, most advanced first.
pub async fn load_continue_learning(entities: &dyn EntitySource, store: &dyn OverlayStore) -> PortResult<Vec<CourseView>> {
    let courses = course_views(entities, store, None).await?;
    Ok(in_progress(courses, ProgressOrder::MostAdvancedFirst))
}

pub async fn load_course_detail(
    entities: &dyn EntitySource,
    store: &dyn OverlayStore,
    course_id: &str,
) -> PortResult<CourseDetail> {
    let course = entities.course(course_id).await?;
    let chapters = entities.chapters_for_course(course_id).await?;
    let completed = overlay::completed_chapters(store).await?;
    let saved = overlay::saved_courses(store).await?;

    let done: HashSet<&str> = completed.iter().map(String::as_str).collect();
    let counts = course_progress(course_id, &chapters, &done);
    let mut view = CourseView::new(course);
    view.progress = counts.progress;
    view.completed_lessons = counts.completed_lessons;
    view.total_lessons = counts.total_lessons;
    view.saved = is_saved(course_id, &saved);

    Ok(CourseDetail {
        view,
        chapter_list: chapter_progress(chapters, &completed),
    })
}

/// A single chapter with its completion state.
pub async fn load_chapter(
    entities: &dyn EntitySource,
    store: &dyn OverlayStore,
    chapter_id: &str,
) -> PortResult<ChapterView> {
    let chapter = entities.chapter(chapter_id).await?;
    let completed = overlay::completed_chapters(store).await?;
    let completed = completed.iter().any(|id| id == chapter_id);
    Ok(ChapterView { chapter, completed })
}

pub async fn complete_chapter(store: &dyn OverlayStore, chapter_id: &str) -> PortResult<ChapterCompletion> {
    let _guard = store.lock_for_update().await;
    let current = overlay::completed_chapters(store).await?;
    let (updated, newly_completed) = progress::mark_chapter_completed(current, chapter_id);
    if newly_completed {
        write_overlay(store, OverlayKey::CompletedChapters, &updated).await?;
        info!(chapter_id, "chapter completed");
    }
    Ok(ChapterCompletion {
        chapter_id: chapter_id.to_string(),
        newly_completed,
    })
}

//=========================================================================================
// Articles
//=========================================================================================

/// Every published article, newest first.
pub async fn load_articles(entities: &dyn EntitySource) -> PortResult<Vec<Article>> {
    entities.articles(None).await
}

pub async fn load_article(entities: &dyn EntitySource, article_id: &str) -> PortResult<Article> {
    entities.article(article_id).await
}

//=========================================================================================
// Saved Courses
//=========================================================================================

pub async fn load_saved(store: &dyn OverlayStore) -> PortResult<Vec<Course>> {
    overlay::saved_courses(store).await
}

/// Saves or unsaves a course.
///
/// Saving snapshots the course as the content database serves it now. Unsaving works
/// from the stored snapshot, so a course that was since unpublished can still be removed.
pub async fn toggle_saved_course(
    entities: &dyn EntitySource,
    store: &dyn OverlayStore,
    course_id: &str,
) -> PortResult<ToggleSavedResponse> {
    let _guard = store.lock_for_update().await;
    let current = overlay::saved_courses(store).await?;
    let existing = current.iter().find(|snapshot| snapshot.id == course_id).cloned();
    let course = match existing {
        Some(snapshot) => snapshot,
        None => entities.course(course_id).await?,
    };

    let outcome: ToggleOutcome = toggle_saved(&course, current);
    write_overlay(store, OverlayKey::SavedCourses, &outcome.overlay).await?;
    info!(course_id, saved = outcome.saved, "saved state toggled");

    Ok(ToggleSavedResponse {
        course_id: course_id.to_string(),
        saved: outcome.saved,
        message: outcome.message().to_string(),
    })
}

pub async fn unsave_course(store: &dyn OverlayStore, course_id: &str) -> PortResult<Vec<Course>> {
    let _guard = store.lock_for_update().await;
    let current = overlay::saved_courses(store).await?;
    let updated = remove_saved(course_id, current);
    write_overlay(store, OverlayKey::SavedCourses, &updated).await?;
    Ok(updated)
}

//=========================================================================================
// Notifications
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAction {
    MarkAllRead,
    MarkRead(String),
    Delete(String),
    DeleteAll,
}

/// Regenerates the notifications and merges the stored read state into them.
async fn merged_notifications(entities: &dyn EntitySource, store: &dyn OverlayStore) -> PortResult<Vec<Notification>> {
    let courses = entities.courses(None).await?;
    let articles = entities.articles(None).await?;
    let stored = overlay::notifications(store).await?;
    Ok(merge_notifications(generate_notifications(&courses, &articles), &stored))
}

pub async fn load_notifications(entities: &dyn EntitySource, store: &dyn OverlayStore) -> PortResult<NotificationFeed> {
    Ok(NotificationFeed::from_list(merged_notifications(entities, store).await?))
}

/// Applies an action to the current merged list and persists the result.
pub async fn apply_notification_action(
    entities: &dyn EntitySource,
    store: &dyn OverlayStore,
    action: NotificationAction,
) -> PortResult<NotificationFeed> {
    let _guard = store.lock_for_update().await;
    let current = merged_notifications(entities, store).await?;
    let updated = match &action {
        NotificationAction::MarkAllRead => notifications::mark_all_read(&current),
        NotificationAction::MarkRead(id) => notifications::mark_read(&current, id),
        NotificationAction::Delete(id) => notifications::delete(&current, id),
        NotificationAction::DeleteAll => notifications::delete_all(&current),
    };
    write_overlay(store, OverlayKey::Notifications, &updated).await?;
    debug!(?action, remaining = updated.len(), "notification overlay updated");
    Ok(NotificationFeed::from_list(updated))
}

//=========================================================================================
// Search
//=========================================================================================

/// Runs a search and records the query in the device's history.
///
/// A blank query returns no results without touching the content database.
pub async fn run_search(
    entities: &dyn EntitySource,
    store: &dyn OverlayStore,
    query: &str,
) -> PortResult<Vec<SearchResultView>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let courses = entities.courses(None).await?;
    let chapters = entities.chapters().await?;
    let articles = entities.articles(None).await?;
    let hits = search(query, &courses, &chapters, &articles);

    {
        let _guard = store.lock_for_update().await;
        let history = record_search(overlay::search_history(store).await?, query);
        write_overlay(store, OverlayKey::SearchHistory, &history).await?;
    }

    debug!(query, hits = hits.len(), "search executed");
    Ok(hits
        .into_iter()
        .map(|hit| {
            let title = highlight(hit.title(), query);
            let excerpt = highlight(&hit.excerpt(), query);
            SearchResultView { hit, title, excerpt }
        })
        .collect())
}

pub async fn load_search_history(store: &dyn OverlayStore) -> PortResult<Vec<String>> {
    overlay::search_history(store).await
}

pub async fn clear_search_history(store: &dyn OverlayStore) -> PortResult<()> {
    store.remove(OverlayKey::SearchHistory.as_str()).await
}

//=========================================================================================
// Quiz and Session
//=========================================================================================

pub async fn load_quiz(entities: &dyn EntitySource, course_id: &str) -> PortResult<Quiz> {
    entities.quiz_for_course(course_id).await
}

pub async fn score_quiz(entities: &dyn EntitySource, course_id: &str, answers: &[usize]) -> PortResult<QuizOutcome> {
    let quiz = entities.quiz_for_course(course_id).await?;
    Ok(QuizOutcome::evaluate(score_answers(&quiz, answers), quiz.questions.len()))
}

/// Forgets everything this device stored locally.
pub async fn logout(store: &dyn OverlayStore) -> PortResult<()> {
    let _guard = store.lock_for_update().await;
    overlay::clear_all(store).await?;
    info!("device overlays cleared");
    Ok(())
}

//=========================================================================================
// Live Refresh
//=========================================================================================

pub async fn load_screen(
    entities: &dyn EntitySource,
    store: &dyn OverlayStore,
    screen: Screen,
    limits: HomeLimits,
) -> PortResult<ScreenPayload> {
    Ok(match screen {
        Screen::Home => ScreenPayload::Home(load_home(entities, store, limits).await?),
        Screen::ContinueLearning => ScreenPayload::Courses(load_continue_learning(entities, store).await?),
        Screen::Saved => ScreenPayload::Saved(load_saved(store).await?),
        Screen::Notifications => ScreenPayload::Notifications(load_notifications(entities, store).await?),
    })
}
