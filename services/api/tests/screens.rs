use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_lib::config::Config;
use api_lib::web::live::{debounced_search, refresh_step};
use api_lib::web::protocol::ServerMessage;
use api_lib::web::screens::{self, HomeLimits, NotificationAction, Screen, ScreenPayload};
use api_lib::web::state::AppState;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use learning_overlay_core::domain::{Article, Chapter, Course, Quiz, QuizQuestion};
use learning_overlay_core::memory::{MemoryOverlayDirectory, MemoryOverlayStore};
use learning_overlay_core::ports::{
    EntitySource, OverlayDirectory, OverlayStore, OverlayUpdateGuard, PortError, PortResult,
};
use learning_overlay_core::sequence::RequestSequencer;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// Fixtures
//=========================================================================================

#[derive(Default)]
struct FakeSource {
    courses: Mutex<Vec<Course>>,
    chapters: Vec<Chapter>,
    articles: Vec<Article>,
    quizzes: Vec<Quiz>,
    fetches: AtomicUsize,
    /// While set, course listings fail as if the database were unreachable.
    down: AtomicBool,
}

impl FakeSource {
    fn fetched(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn unpublish(&self, course_id: &str) {
        self.courses.lock().unwrap().retain(|c| c.id != course_id);
    }

    fn all_courses(&self) -> Vec<Course> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.courses.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntitySource for FakeSource {
    async fn courses(&self, limit: Option<usize>) -> PortResult<Vec<Course>> {
        if self.down.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("connection refused".to_string()));
        }
        let courses = self.all_courses();
        Ok(courses.into_iter().take(limit.unwrap_or(usize::MAX)).collect())
    }

    async fn course(&self, course_id: &str) -> PortResult<Course> {
        self.all_courses()
            .into_iter()
            .find(|c| c.id == course_id)
            .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))
    }

    async fn chapters(&self) -> PortResult<Vec<Chapter>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.chapters.clone())
    }

    async fn chapter(&self, chapter_id: &str) -> PortResult<Chapter> {
        self.chapters
            .iter()
            .find(|c| c.id == chapter_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Chapter {} not found", chapter_id)))
    }

    async fn chapters_for_course(&self, course_id: &str) -> PortResult<Vec<Chapter>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.chapters.iter().filter(|c| c.cours_id == course_id).cloned().collect())
    }

    async fn articles(&self, limit: Option<usize>) -> PortResult<Vec<Article>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.articles.iter().take(limit.unwrap_or(usize::MAX)).cloned().collect())
    }

    async fn article(&self, article_id: &str) -> PortResult<Article> {
        self.articles
            .iter()
            .find(|a| a.id == article_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Article {} not found", article_id)))
    }

    async fn quiz_for_course(&self, course_id: &str) -> PortResult<Quiz> {
        self.quizzes
            .iter()
            .find(|q| q.cours_id == course_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Quiz for course {} not found", course_id)))
    }
}

fn course(id: &str, title: &str) -> Course {
    Course {
        id: id.to_string(),
        title: title.to_string(),
        category: "Programming".to_string(),
        description: format!("Learn {}", title),
        ..Course::default()
    }
}

fn chapter(id: &str, course_id: &str, titre: &str, ordre: Option<i64>) -> Chapter {
    Chapter {
        id: id.to_string(),
        cours_id: course_id.to_string(),
        titre: titre.to_string(),
        ordre,
        ..Chapter::default()
    }
}

fn article(id: &str, titre: &str) -> Article {
    Article {
        id: id.to_string(),
        titre: titre.to_string(),
        auteur: "Ada".to_string(),
        contenu: "Ownership explained in depth.".to_string(),
        ..Article::default()
    }
}

/// Two courses: `rust` with three chapters and `go` with two.
fn catalogue() -> FakeSource {
    FakeSource {
        courses: Mutex::new(vec![course("rust", "Rust Basics"), course("go", "Go Basics")]),
        chapters: vec![
            chapter("r1", "rust", "Ownership", Some(1)),
            chapter("r3", "rust", "Traits", Some(3)),
            chapter("r2", "rust", "Borrowing", Some(2)),
            chapter("g1", "go", "Goroutines", None),
            chapter("g2", "go", "Channels", Some(1)),
        ],
        articles: vec![article("a1", "Why Rust"), article("a2", "Async in practice")],
        quizzes: vec![Quiz {
            id: "q1".to_string(),
            cours_id: "rust".to_string(),
            titre: "Rust quiz".to_string(),
            questions: vec![
                QuizQuestion {
                    question: "Who owns a value?".to_string(),
                    options: vec!["One owner".to_string(), "Everyone".to_string()],
                    correct_index: Some(0),
                },
                QuizQuestion {
                    question: "Is &mut exclusive?".to_string(),
                    options: vec!["No".to_string(), "Yes".to_string()],
                    correct_index: Some(1),
                },
            ],
        }],
        fetches: AtomicUsize::new(0),
        down: AtomicBool::new(false),
    }
}

/// Yields to the scheduler before every read, so concurrent updates get a chance to
/// interleave between their read and their write.
#[derive(Default)]
struct YieldingStore {
    inner: MemoryOverlayStore,
}

#[async_trait]
impl OverlayStore for YieldingStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        tokio::task::yield_now().await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.inner.remove(key).await
    }

    async fn clear(&self) -> PortResult<()> {
        self.inner.clear().await
    }

    async fn lock_for_update(&self) -> OverlayUpdateGuard {
        self.inner.lock_for_update().await
    }
}

const LIMITS: HomeLimits = HomeLimits {
    courses: 10,
    articles: 1,
};

//=========================================================================================
// Progress
//=========================================================================================

#[tokio::test]
async fn home_joins_progress_and_keeps_insertion_order() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();
    screens::complete_chapter(&store, "g1").await.unwrap();
    screens::complete_chapter(&store, "r1").await.unwrap();

    let home = screens::load_home(&source, &store, LIMITS).await.unwrap();

    assert_eq!(home.courses.len(), 2);
    let ids: Vec<&str> = home.in_progress.iter().map(|v| v.id()).collect();
    assert_eq!(ids, vec!["rust", "go"]);
    assert_eq!(home.in_progress[0].completed_lessons, 1);
    assert_eq!(home.in_progress[0].total_lessons, 3);
    assert_eq!(home.in_progress[1].progress, 50.0);
    assert_eq!(home.articles.len(), 1);
}

#[tokio::test]
async fn continue_learning_puts_the_most_advanced_course_first() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();
    for id in ["r1", "g1"] {
        screens::complete_chapter(&store, id).await.unwrap();
    }

    let courses = screens::load_continue_learning(&source, &store).await.unwrap();

    let ids: Vec<&str> = courses.iter().map(|v| v.id()).collect();
    assert_eq!(ids, vec!["go", "rust"]);
}

#[tokio::test]
async fn completing_a_chapter_twice_writes_once() {
    let store = MemoryOverlayStore::new();

    let first = screens::complete_chapter(&store, "r1").await.unwrap();
    let second = screens::complete_chapter(&store, "r1").await.unwrap();

    assert!(first.newly_completed);
    assert!(!second.newly_completed);
    assert_eq!(store.get("completedChapters").await.unwrap().as_deref(), Some(r#"["r1"]"#));
}

#[tokio::test]
async fn concurrent_completions_of_one_device_are_both_kept() {
    let store = YieldingStore::default();

    let (first, second) = tokio::join!(
        screens::complete_chapter(&store, "ch1"),
        screens::complete_chapter(&store, "ch2"),
    );

    assert!(first.unwrap().newly_completed);
    assert!(second.unwrap().newly_completed);
    let stored = store.get("completedChapters").await.unwrap().unwrap();
    let mut completed: Vec<String> = serde_json::from_str(&stored).unwrap();
    completed.sort();
    assert_eq!(completed, vec!["ch1", "ch2"]);
}

#[tokio::test]
async fn concurrent_saves_and_notification_reads_are_both_kept() {
    let source = catalogue();
    let store = YieldingStore::default();

    let (rust, go) = tokio::join!(
        screens::toggle_saved_course(&source, &store, "rust"),
        screens::toggle_saved_course(&source, &store, "go"),
    );
    assert!(rust.unwrap().saved && go.unwrap().saved);
    assert_eq!(screens::load_saved(&store).await.unwrap().len(), 2);

    let (a1, a2) = tokio::join!(
        screens::apply_notification_action(&source, &store, NotificationAction::MarkRead("a1".to_string())),
        screens::apply_notification_action(&source, &store, NotificationAction::MarkRead("a2".to_string())),
    );
    a1.unwrap();
    a2.unwrap();
    let feed = screens::load_notifications(&source, &store).await.unwrap();
    assert_eq!(feed.unread_count, 2);
}

#[tokio::test]
async fn chapter_detail_reports_completion_on_this_device() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();
    screens::complete_chapter(&store, "r2").await.unwrap();

    let done = screens::load_chapter(&source, &store, "r2").await.unwrap();
    assert_eq!(done.chapter.titre, "Borrowing");
    assert!(done.completed);

    let open = screens::load_chapter(&source, &store, "r3").await.unwrap();
    assert!(!open.completed);

    assert!(matches!(
        screens::load_chapter(&source, &store, "missing").await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn course_detail_orders_chapters_and_flags_completion() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();
    screens::complete_chapter(&store, "r2").await.unwrap();
    screens::toggle_saved_course(&source, &store, "rust").await.unwrap();

    let detail = screens::load_course_detail(&source, &store, "rust").await.unwrap();

    let titles: Vec<&str> = detail.chapter_list.iter().map(|c| c.chapter.titre.as_str()).collect();
    assert_eq!(titles, vec!["Ownership", "Borrowing", "Traits"]);
    let completed: Vec<bool> = detail.chapter_list.iter().map(|c| c.completed).collect();
    assert_eq!(completed, vec![false, true, false]);
    assert!(detail.view.saved);
    assert_eq!(detail.view.completed_lessons, 1);
    assert_eq!(detail.view.total_lessons, 3);
}

#[tokio::test]
async fn unknown_course_detail_is_not_found() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();

    let result = screens::load_course_detail(&source, &store, "missing").await;

    assert!(matches!(result, Err(PortError::NotFound(_))));
}

#[tokio::test]
async fn malformed_overlays_read_as_empty() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();
    store.set("completedChapters", "{not json").await.unwrap();
    store.set("savedCoursesData", "42").await.unwrap();

    let courses = screens::load_catalog(&source, &store).await.unwrap();

    assert!(courses.iter().all(|v| v.progress == 0.0 && !v.saved));
}

//=========================================================================================
// Articles
//=========================================================================================

#[tokio::test]
async fn articles_are_listed_and_looked_up_by_id() {
    let source = catalogue();

    let articles = screens::load_articles(&source).await.unwrap();
    let ids: Vec<&str> = articles.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2"]);

    let article = screens::load_article(&source, "a2").await.unwrap();
    assert_eq!(article.titre, "Async in practice");

    assert!(matches!(
        screens::load_article(&source, "missing").await,
        Err(PortError::NotFound(_))
    ));
}

//=========================================================================================
// Saved Courses
//=========================================================================================

#[tokio::test]
async fn toggling_saves_then_removes() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();

    let saved = screens::toggle_saved_course(&source, &store, "go").await.unwrap();
    assert!(saved.saved);
    assert_eq!(saved.message, "Course saved");
    assert_eq!(screens::load_saved(&store).await.unwrap().len(), 1);

    let removed = screens::toggle_saved_course(&source, &store, "go").await.unwrap();
    assert!(!removed.saved);
    assert_eq!(removed.message, "Course removed from saved");
    assert!(screens::load_saved(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn saved_snapshot_survives_unpublishing_and_can_still_be_removed() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();
    screens::toggle_saved_course(&source, &store, "go").await.unwrap();

    source.unpublish("go");

    let saved = screens::load_saved(&store).await.unwrap();
    assert_eq!(saved[0].title, "Go Basics");
    let catalog = screens::load_catalog(&source, &store).await.unwrap();
    assert!(catalog.iter().all(|v| v.id() != "go"));

    let removed = screens::toggle_saved_course(&source, &store, "go").await.unwrap();
    assert!(!removed.saved);
}

#[tokio::test]
async fn saving_an_unknown_course_fails_without_writing() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();

    let result = screens::toggle_saved_course(&source, &store, "missing").await;

    assert!(matches!(result, Err(PortError::NotFound(_))));
    assert_eq!(store.get("savedCoursesData").await.unwrap(), None);
}

#[tokio::test]
async fn unsaving_keeps_other_snapshots() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();
    screens::toggle_saved_course(&source, &store, "go").await.unwrap();
    screens::toggle_saved_course(&source, &store, "rust").await.unwrap();

    let remaining = screens::unsave_course(&store, "go").await.unwrap();

    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "rust");
}

//=========================================================================================
// Notifications
//=========================================================================================

#[tokio::test]
async fn read_state_persists_across_loads() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();

    let fresh = screens::load_notifications(&source, &store).await.unwrap();
    assert_eq!(fresh.notifications.len(), 4);
    assert_eq!(fresh.unread_count, 4);

    screens::apply_notification_action(&source, &store, NotificationAction::MarkRead("a1".to_string()))
        .await
        .unwrap();

    let reloaded = screens::load_notifications(&source, &store).await.unwrap();
    assert_eq!(reloaded.unread_count, 3);
    assert!(reloaded.notifications.iter().any(|n| n.id == "a1" && n.read));
}

#[tokio::test]
async fn mark_all_read_clears_the_badge() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();

    let feed = screens::apply_notification_action(&source, &store, NotificationAction::MarkAllRead)
        .await
        .unwrap();

    assert_eq!(feed.unread_count, 0);
    assert_eq!(feed.notifications.len(), 4);
}

#[tokio::test]
async fn deleted_notifications_come_back_unread_while_their_source_exists() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();
    screens::apply_notification_action(&source, &store, NotificationAction::MarkAllRead)
        .await
        .unwrap();

    let after_delete = screens::apply_notification_action(&source, &store, NotificationAction::Delete("rust".to_string()))
        .await
        .unwrap();
    assert_eq!(after_delete.notifications.len(), 3);

    let reloaded = screens::load_notifications(&source, &store).await.unwrap();
    assert_eq!(reloaded.notifications.len(), 4);
    assert_eq!(reloaded.unread_count, 1);
}

#[tokio::test]
async fn article_notifications_follow_publication_order() {
    let mut source = catalogue();
    let published = |day: u32| Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).single();
    source.articles[0].created_at = published(12);
    source.articles[1].created_at = published(3);
    let store = MemoryOverlayStore::new();

    let feed = screens::load_notifications(&source, &store).await.unwrap();

    let ids: Vec<&str> = feed.notifications.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["rust", "go", "a2", "a1"]);
}

#[tokio::test]
async fn delete_all_empties_the_current_list() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();

    let feed = screens::apply_notification_action(&source, &store, NotificationAction::DeleteAll)
        .await
        .unwrap();

    assert!(feed.notifications.is_empty());
    assert_eq!(feed.unread_count, 0);
}

//=========================================================================================
// Search
//=========================================================================================

#[tokio::test]
async fn blank_queries_never_reach_the_content_database() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();

    let hits = screens::run_search(&source, &store, "   ").await.unwrap();

    assert!(hits.is_empty());
    assert_eq!(source.fetched(), 0);
    assert!(screens::load_search_history(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_highlights_and_records_history() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();

    let hits = screens::run_search(&source, &store, "rust").await.unwrap();

    // Course "Rust Basics" then article "Why Rust".
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].hit.id(), "rust");
    let matched: Vec<&str> = hits[0]
        .title
        .iter()
        .filter(|s| s.matched)
        .map(|s| s.text.as_str())
        .collect();
    assert_eq!(matched, vec!["Rust"]);
    assert_eq!(screens::load_search_history(&store).await.unwrap(), vec!["rust"]);

    screens::clear_search_history(&store).await.unwrap();
    assert!(screens::load_search_history(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_keeps_the_five_most_recent_queries() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();
    for query in ["a", "b", "c", "d", "e", "f"] {
        screens::run_search(&source, &store, query).await.unwrap();
    }

    let history = screens::load_search_history(&store).await.unwrap();

    assert_eq!(history, vec!["f", "e", "d", "c", "b"]);
}

//=========================================================================================
// Quiz and Session
//=========================================================================================

#[tokio::test]
async fn quiz_scoring_passes_at_half() {
    let source = catalogue();

    let outcome = screens::score_quiz(&source, "rust", &[0, 0]).await.unwrap();
    assert_eq!((outcome.score, outcome.total, outcome.passed), (1, 2, true));

    let outcome = screens::score_quiz(&source, "rust", &[1]).await.unwrap();
    assert_eq!((outcome.score, outcome.passed), (0, false));

    assert!(matches!(
        screens::load_quiz(&source, "go").await,
        Err(PortError::NotFound(_))
    ));
}

#[tokio::test]
async fn logout_forgets_only_the_calling_device() {
    let source = catalogue();
    let directory = MemoryOverlayDirectory::new();
    let mine = directory.open(Uuid::new_v4());
    let theirs = directory.open(Uuid::new_v4());
    for store in [&mine, &theirs] {
        screens::complete_chapter(store.as_ref(), "r1").await.unwrap();
        screens::toggle_saved_course(&source, store.as_ref(), "rust").await.unwrap();
    }

    screens::logout(mine.as_ref()).await.unwrap();

    assert!(screens::load_saved(mine.as_ref()).await.unwrap().is_empty());
    assert_eq!(screens::load_saved(theirs.as_ref()).await.unwrap().len(), 1);
    let courses = screens::load_continue_learning(&source, theirs.as_ref()).await.unwrap();
    assert_eq!(courses.len(), 1);
}

#[tokio::test]
async fn saved_screen_refresh_returns_the_snapshots() {
    let source = catalogue();
    let store = MemoryOverlayStore::new();
    screens::toggle_saved_course(&source, &store, "rust").await.unwrap();

    let payload = screens::load_screen(&source, &store, Screen::Saved, LIMITS).await.unwrap();

    match payload {
        ScreenPayload::Saved(saved) => assert_eq!(saved[0].id, "rust"),
        other => panic!("unexpected payload {:?}", other),
    }
}

//=========================================================================================
// Live Search
//=========================================================================================

fn app_state(source: FakeSource) -> AppState {
    let config = Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        _ => None,
    })
    .unwrap();
    AppState {
        entities: Arc::new(source),
        overlays: Arc::new(MemoryOverlayDirectory::new()),
        config: Arc::new(config),
    }
}

#[tokio::test(start_paused = true)]
async fn a_newer_query_supersedes_the_pending_one() {
    let state = Arc::new(app_state(catalogue()));
    let device_id = Uuid::new_v4();
    let sequencer = Arc::new(RequestSequencer::new());
    let delay = Duration::from_millis(300);

    let first_token = CancellationToken::new();
    let first = tokio::spawn({
        let (state, sequencer, token) = (state.clone(), sequencer.clone(), first_token.clone());
        let ticket = sequencer.issue();
        async move { debounced_search(&state, device_id, "ru", token, &sequencer, ticket, delay).await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    first_token.cancel();

    let ticket = sequencer.issue();
    let second = debounced_search(&state, device_id, "rust", CancellationToken::new(), &sequencer, ticket, delay).await;

    assert!(first.await.unwrap().is_none());
    let hits = second.expect("latest query runs").unwrap();
    assert_eq!(hits.len(), 2);

    let store = state.store_for(device_id);
    assert_eq!(screens::load_search_history(store.as_ref()).await.unwrap(), vec!["rust"]);
}

#[tokio::test(start_paused = true)]
async fn a_result_is_dropped_when_a_newer_request_was_issued_meanwhile() {
    let state = Arc::new(app_state(catalogue()));
    let sequencer = Arc::new(RequestSequencer::new());

    let pending = tokio::spawn({
        let (state, sequencer) = (state.clone(), sequencer.clone());
        let ticket = sequencer.issue();
        async move {
            debounced_search(
                &state,
                Uuid::new_v4(),
                "go",
                CancellationToken::new(),
                &sequencer,
                ticket,
                Duration::from_millis(300),
            )
            .await
        }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    sequencer.issue();

    assert!(pending.await.unwrap().is_none());
}

//=========================================================================================
// Live Refresh
//=========================================================================================

#[tokio::test]
async fn a_superseded_refresh_yields_nothing() {
    let state = app_state(catalogue());
    let device_id = Uuid::new_v4();
    let sequencer = RequestSequencer::new();
    let older = sequencer.issue();
    let newer = sequencer.issue();

    assert!(refresh_step(&state, device_id, Screen::Home, &sequencer, older).await.is_none());

    match refresh_step(&state, device_id, Screen::Home, &sequencer, newer).await {
        Some(ServerMessage::Screen { seq, screen, .. }) => {
            assert_eq!(seq, newer.value());
            assert_eq!(screen, Screen::Home);
        }
        other => panic!("unexpected message {:?}", other),
    }
}

#[tokio::test]
async fn a_superseded_refresh_failure_is_dropped_too() {
    let source = catalogue();
    source.down.store(true, Ordering::SeqCst);
    let state = app_state(source);
    let device_id = Uuid::new_v4();
    let sequencer = RequestSequencer::new();
    let older = sequencer.issue();
    let newer = sequencer.issue();

    assert!(refresh_step(&state, device_id, Screen::Notifications, &sequencer, older)
        .await
        .is_none());

    match refresh_step(&state, device_id, Screen::Notifications, &sequencer, newer).await {
        Some(ServerMessage::Error { message }) => assert!(message.contains("connection refused")),
        other => panic!("unexpected message {:?}", other),
    }
}
