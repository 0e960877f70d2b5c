//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::screens::{
    self, ChapterCompletion, HomeScreen, NotificationAction, NotificationFeed, SearchResultView,
    ToggleSavedResponse,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use learning_overlay_core::domain::{Article, ChapterView, Course, CourseDetail, CourseView, Quiz};
use learning_overlay_core::ports::PortError;
use learning_overlay_core::quiz::QuizOutcome;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        home_handler,
        catalog_handler,
        course_detail_handler,
        continue_learning_handler,
        chapter_handler,
        complete_chapter_handler,
        articles_handler,
        article_handler,
        saved_handler,
        toggle_saved_handler,
        unsave_handler,
        notifications_handler,
        mark_all_read_handler,
        mark_read_handler,
        delete_notification_handler,
        delete_all_notifications_handler,
        search_handler,
        search_history_handler,
        clear_search_history_handler,
        quiz_handler,
        score_quiz_handler,
        logout_handler,
    ),
    components(
        schemas(
            HomeScreen,
            NotificationFeed,
            ToggleSavedResponse,
            ChapterCompletion,
            SearchResultView,
            QuizAnswers,
        )
    ),
    tags(
        (name = "Learning API", description = "Course catalogue joined with the device's local progress, saved courses and notifications.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// The option index picked for each question, in question order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuizAnswers {
    pub answers: Vec<usize>,
}

type HandlerError = (StatusCode, String);

/// Maps a port failure to a status code and logs it.
fn port_failure(context: &str, e: PortError) -> HandlerError {
    let status = match &e {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PortError::Unexpected(_) => StatusCode::BAD_GATEWAY,
    };
    if status == StatusCode::NOT_FOUND {
        warn!("{}: {}", context, e);
    } else {
        error!("{}: {:?}", context, e);
    }
    (status, e.to_string())
}

//=========================================================================================
// Courses and Progress
//=========================================================================================

/// The home screen: a few courses, the started ones and the latest articles.
#[utoipa::path(
    get,
    path = "/home",
    responses(
        (status = 200, description = "Home screen", body = HomeScreen),
        (status = 502, description = "Content database unavailable")
    ),
    params(("x-device-id" = Uuid, Header, description = "The unique ID of the device."))
)]
pub async fn home_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Result<Json<HomeScreen>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::load_home(app_state.entities.as_ref(), store.as_ref(), app_state.home_limits())
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load home screen", e))
}

/// All courses with progress and saved state.
#[utoipa::path(
    get,
    path = "/courses",
    responses((status = 200, description = "Annotated course list")),
    params(("x-device-id" = Uuid, Header, description = "The unique ID of the device."))
)]
pub async fn catalog_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Result<Json<Vec<CourseView>>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::load_catalog(app_state.entities.as_ref(), store.as_ref())
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load courses", e))
}

#[utoipa::path(
    get,
    path = "/courses/{id}",
    responses(
        (status = 200, description = "Course with its chapters"),
        (status = 404, description = "Unknown course")
    ),
    params(
        ("id" = String, Path, description = "Course id"),
        ("x-device-id" = Uuid, Header, description = "The unique ID of the device.")
    )
)]
pub async fn course_detail_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseDetail>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::load_course_detail(app_state.entities.as_ref(), store.as_ref(), &course_id)
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load course detail", e))
}

/// Started courses, most advanced first.
#[utoipa::path(
    get,
    path = "/courses/continue",
    responses((status = 200, description = "In-progress courses")),
    params(("x-device-id" = Uuid, Header, description = "The unique ID of the device."))
)]
pub async fn continue_learning_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Result<Json<Vec<CourseView>>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::load_continue_learning(app_state.entities.as_ref(), store.as_ref())
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load in-progress courses", e))
}

/// One chapter with its completion state on this device.
#[utoipa::path(
    get,
    path = "/chapters/{id}",
    responses(
        (status = 200, description = "Chapter with its completion flag"),
        (status = 404, description = "Unknown chapter")
    ),
    params(
        ("id" = String, Path, description = "Chapter id"),
        ("x-device-id" = Uuid, Header, description = "The unique ID of the device.")
    )
)]
pub async fn chapter_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
    Path(chapter_id): Path<String>,
) -> Result<Json<ChapterView>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::load_chapter(app_state.entities.as_ref(), store.as_ref(), &chapter_id)
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load chapter", e))
}

#[utoipa::path(
    post,
    path = "/chapters/{id}/complete",
    responses((status = 200, description = "Chapter recorded as completed", body = ChapterCompletion)),
    params(
        ("id" = String, Path, description = "Chapter id"),
        ("x-device-id" = Uuid, Header, description = "The unique ID of the device.")
    )
)]
pub async fn complete_chapter_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
    Path(chapter_id): Path<String>,
) -> Result<Json<ChapterCompletion>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::complete_chapter(store.as_ref(), &chapter_id)
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to complete chapter", e))
}

//=========================================================================================
// Articles
//=========================================================================================

/// Every article, newest first.
#[utoipa::path(
    get,
    path = "/articles",
    responses(
        (status = 200, description = "Published articles"),
        (status = 502, description = "Content database unavailable")
    )
)]
pub async fn articles_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<Vec<Article>>, HandlerError> {
    screens::load_articles(app_state.entities.as_ref())
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load articles", e))
}

#[utoipa::path(
    get,
    path = "/articles/{id}",
    responses(
        (status = 200, description = "The article"),
        (status = 404, description = "Unknown article")
    ),
    params(("id" = String, Path, description = "Article id"))
)]
pub async fn article_handler(
    State(app_state): State<Arc<AppState>>,
    Path(article_id): Path<String>,
) -> Result<Json<Article>, HandlerError> {
    screens::load_article(app_state.entities.as_ref(), &article_id)
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load article", e))
}

//=========================================================================================
// Saved Courses
//=========================================================================================

/// The saved snapshots, as stored on the device.
#[utoipa::path(
    get,
    path = "/saved",
    responses((status = 200, description = "Saved course snapshots")),
    params(("x-device-id" = Uuid, Header, description = "The unique ID of the device."))
)]
pub async fn saved_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Result<Json<Vec<Course>>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::load_saved(store.as_ref())
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load saved courses", e))
}

#[utoipa::path(
    post,
    path = "/saved/{course_id}/toggle",
    responses(
        (status = 200, description = "New saved state", body = ToggleSavedResponse),
        (status = 404, description = "Unknown course")
    ),
    params(
        ("course_id" = String, Path, description = "Course id"),
        ("x-device-id" = Uuid, Header, description = "The unique ID of the device.")
    )
)]
pub async fn toggle_saved_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
    Path(course_id): Path<String>,
) -> Result<Json<ToggleSavedResponse>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::toggle_saved_course(app_state.entities.as_ref(), store.as_ref(), &course_id)
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to toggle saved course", e))
}

#[utoipa::path(
    delete,
    path = "/saved/{course_id}",
    responses((status = 200, description = "Remaining saved snapshots")),
    params(
        ("course_id" = String, Path, description = "Course id"),
        ("x-device-id" = Uuid, Header, description = "The unique ID of the device.")
    )
)]
pub async fn unsave_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<Course>>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::unsave_course(store.as_ref(), &course_id)
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to remove saved course", e))
}

//=========================================================================================
// Notifications
//=========================================================================================

async fn notification_action(
    app_state: &AppState,
    device_id: Uuid,
    action: NotificationAction,
) -> Result<Json<NotificationFeed>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::apply_notification_action(app_state.entities.as_ref(), store.as_ref(), action)
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to update notifications", e))
}

#[utoipa::path(
    get,
    path = "/notifications",
    responses((status = 200, description = "Notifications and unread count", body = NotificationFeed)),
    params(("x-device-id" = Uuid, Header, description = "The unique ID of the device."))
)]
pub async fn notifications_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Result<Json<NotificationFeed>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::load_notifications(app_state.entities.as_ref(), store.as_ref())
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load notifications", e))
}

#[utoipa::path(
    post,
    path = "/notifications/read",
    responses((status = 200, description = "All notifications read", body = NotificationFeed)),
    params(("x-device-id" = Uuid, Header, description = "The unique ID of the device."))
)]
pub async fn mark_all_read_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Result<Json<NotificationFeed>, HandlerError> {
    notification_action(&app_state, device_id, NotificationAction::MarkAllRead).await
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    responses((status = 200, description = "Notification read", body = NotificationFeed)),
    params(
        ("id" = String, Path, description = "Notification id"),
        ("x-device-id" = Uuid, Header, description = "The unique ID of the device.")
    )
)]
pub async fn mark_read_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
    Path(id): Path<String>,
) -> Result<Json<NotificationFeed>, HandlerError> {
    notification_action(&app_state, device_id, NotificationAction::MarkRead(id)).await
}

#[utoipa::path(
    delete,
    path = "/notifications/{id}",
    responses((status = 200, description = "Notification deleted", body = NotificationFeed)),
    params(
        ("id" = String, Path, description = "Notification id"),
        ("x-device-id" = Uuid, Header, description = "The unique ID of the device.")
    )
)]
pub async fn delete_notification_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
    Path(id): Path<String>,
) -> Result<Json<NotificationFeed>, HandlerError> {
    notification_action(&app_state, device_id, NotificationAction::Delete(id)).await
}

#[utoipa::path(
    delete,
    path = "/notifications",
    responses((status = 200, description = "All notifications deleted", body = NotificationFeed)),
    params(("x-device-id" = Uuid, Header, description = "The unique ID of the device."))
)]
pub async fn delete_all_notifications_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Result<Json<NotificationFeed>, HandlerError> {
    notification_action(&app_state, device_id, NotificationAction::DeleteAll).await
}

//=========================================================================================
// Search
//=========================================================================================

/// One-shot search. Live clients get the debounced variant over `/live`.
#[utoipa::path(
    get,
    path = "/search",
    responses((status = 200, description = "Highlighted hits", body = [SearchResultView])),
    params(
        ("q" = String, Query, description = "Search terms"),
        ("x-device-id" = Uuid, Header, description = "The unique ID of the device.")
    )
)]
pub async fn search_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResultView>>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::run_search(app_state.entities.as_ref(), store.as_ref(), &params.q)
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to search", e))
}

#[utoipa::path(
    get,
    path = "/search/history",
    responses((status = 200, description = "Recent queries, newest first", body = [String])),
    params(("x-device-id" = Uuid, Header, description = "The unique ID of the device."))
)]
pub async fn search_history_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Result<Json<Vec<String>>, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::load_search_history(store.as_ref())
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load search history", e))
}

#[utoipa::path(
    delete,
    path = "/search/history",
    responses((status = 204, description = "History cleared")),
    params(("x-device-id" = Uuid, Header, description = "The unique ID of the device."))
)]
pub async fn clear_search_history_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::clear_search_history(store.as_ref())
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| port_failure("Failed to clear search history", e))
}

//=========================================================================================
// Quiz and Session
//=========================================================================================

#[utoipa::path(
    get,
    path = "/courses/{id}/quiz",
    responses(
        (status = 200, description = "Normalised quiz"),
        (status = 404, description = "The course has no quiz")
    ),
    params(
        ("id" = String, Path, description = "Course id"),
        ("x-device-id" = Uuid, Header, description = "The unique ID of the device.")
    )
)]
pub async fn quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<Quiz>, HandlerError> {
    screens::load_quiz(app_state.entities.as_ref(), &course_id)
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to load quiz", e))
}

#[utoipa::path(
    post,
    path = "/courses/{id}/quiz/score",
    request_body = QuizAnswers,
    responses(
        (status = 200, description = "Score, total and pass flag"),
        (status = 404, description = "The course has no quiz")
    ),
    params(
        ("id" = String, Path, description = "Course id"),
        ("x-device-id" = Uuid, Header, description = "The unique ID of the device.")
    )
)]
pub async fn score_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
    Json(body): Json<QuizAnswers>,
) -> Result<Json<QuizOutcome>, HandlerError> {
    screens::score_quiz(app_state.entities.as_ref(), &course_id, &body.answers)
        .await
        .map(Json)
        .map_err(|e| port_failure("Failed to score quiz", e))
}

/// Clears every overlay of the calling device.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 204, description = "Device overlays cleared")),
    params(("x-device-id" = Uuid, Header, description = "The unique ID of the device."))
)]
pub async fn logout_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(device_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let store = app_state.store_for(device_id);
    screens::logout(store.as_ref())
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|e| port_failure("Failed to clear device overlays", e))
}
