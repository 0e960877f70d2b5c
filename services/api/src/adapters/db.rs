//! services/api/src/adapters/db.rs
//!
//! This module contains the content database adapter, which is the concrete
//! implementation of the `EntitySource` port from the `core` crate. It reads the
//! course catalogue from PostgreSQL using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use learning_overlay_core::domain::{Article, Chapter, Course, Quiz};
use learning_overlay_core::ports::{EntitySource, PortError, PortResult};
use learning_overlay_core::quiz::normalize_quiz;
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `EntitySource` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CourseRecord {
    id: String,
    title: String,
    category: String,
    description: String,
    introduction: String,
    level: String,
    duration: String,
    review_count: i64,
    video_url: String,
    chapter_ids: Vec<String>,
}
impl CourseRecord {
    fn to_domain(self) -> Course {
        Course {
            id: self.id,
            title: self.title,
            category: self.category,
            description: self.description,
            introduction: self.introduction,
            level: self.level,
            duration: self.duration,
            review_count: self.review_count,
            video_url: self.video_url,
            chapters: self.chapter_ids,
        }
    }
}

#[derive(FromRow)]
struct ChapterRecord {
    id: String,
    cours_id: String,
    titre: String,
    description: String,
    contenu: String,
    ordre: Option<i64>,
    video_url: String,
}
impl ChapterRecord {
    fn to_domain(self) -> Chapter {
        Chapter {
            id: self.id,
            cours_id: self.cours_id,
            titre: self.titre,
            description: self.description,
            contenu: self.contenu,
            ordre: self.ordre,
            video_url: self.video_url,
        }
    }
}

#[derive(FromRow)]
struct ArticleRecord {
    id: String,
    titre: String,
    auteur: String,
    contenu: String,
    image_url: String,
    created_at: Option<DateTime<Utc>>,
}
impl ArticleRecord {
    fn to_domain(self) -> Article {
        Article {
            id: self.id,
            titre: self.titre,
            auteur: self.auteur,
            contenu: self.contenu,
            image_url: self.image_url,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct QuizRecord {
    id: String,
    cours_id: String,
    titre: String,
    questions: Json<Value>,
}
impl QuizRecord {
    fn to_domain(self) -> PortResult<Quiz> {
        match &self.questions.0 {
            Value::Array(questions) => Ok(normalize_quiz(&self.id, &self.cours_id, &self.titre, questions)),
            other => Err(PortError::Malformed(format!(
                "Quiz {} has non-array questions: {}",
                self.id, other
            ))),
        }
    }
}

const COURSE_COLUMNS: &str =
    "id, title, category, description, introduction, level, duration, review_count, video_url, chapter_ids";
const CHAPTER_COLUMNS: &str = "id, cours_id, titre, description, contenu, ordre, video_url";
const ARTICLE_COLUMNS: &str = "id, titre, auteur, contenu, image_url, created_at";

/// Rows that cannot be decoded stay broken on retry, so they are not transient.
fn unexpected(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            PortError::Malformed(e.to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn not_found_or_unexpected(what: &str, id: &str) -> impl FnOnce(sqlx::Error) -> PortError {
    let (what, id) = (what.to_string(), id.to_string());
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} {} not found", what, id)),
        _ => unexpected(e),
    }
}

fn as_limit(limit: Option<usize>) -> Option<i64> {
    limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX))
}

//=========================================================================================
// `EntitySource` Trait Implementation
//=========================================================================================

#[async_trait]
impl EntitySource for DbAdapter {
    async fn courses(&self, limit: Option<usize>) -> PortResult<Vec<Course>> {
        // A NULL limit means no limit in PostgreSQL.
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY title, id LIMIT $1");
        let records = sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(as_limit(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn course(&self, course_id: &str) -> PortResult<Course> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        let record = sqlx::query_as::<_, CourseRecord>(&sql)
            .bind(course_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("Course", course_id))?;
        Ok(record.to_domain())
    }

    async fn chapters(&self) -> PortResult<Vec<Chapter>> {
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters ORDER BY id");
        let records = sqlx::query_as::<_, ChapterRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(ChapterRecord::to_domain).collect())
    }

    async fn chapter(&self, chapter_id: &str) -> PortResult<Chapter> {
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = $1");
        let record = sqlx::query_as::<_, ChapterRecord>(&sql)
            .bind(chapter_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("Chapter", chapter_id))?;
        Ok(record.to_domain())
    }

    async fn chapters_for_course(&self, course_id: &str) -> PortResult<Vec<Chapter>> {
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE cours_id = $1 ORDER BY id");
        let records = sqlx::query_as::<_, ChapterRecord>(&sql)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(ChapterRecord::to_domain).collect())
    }

    async fn articles(&self, limit: Option<usize>) -> PortResult<Vec<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY created_at DESC NULLS LAST, id LIMIT $1"
        );
        let records = sqlx::query_as::<_, ArticleRecord>(&sql)
            .bind(as_limit(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(ArticleRecord::to_domain).collect())
    }

    async fn article(&self, article_id: &str) -> PortResult<Article> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let record = sqlx::query_as::<_, ArticleRecord>(&sql)
            .bind(article_id)
            .fetch_one(&self.pool)
            .await
            .map_err(not_found_or_unexpected("Article", article_id))?;
        Ok(record.to_domain())
    }

    async fn quiz_for_course(&self, course_id: &str) -> PortResult<Quiz> {
        // Several quizzes may reference one course; the oldest one is served.
        let record = sqlx::query_as::<_, QuizRecord>(
            "SELECT id, cours_id, titre, questions FROM quizzes WHERE cours_id = $1 ORDER BY created_at, id LIMIT 1",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected("Quiz for course", course_id))?;
        record.to_domain()
    }
}
