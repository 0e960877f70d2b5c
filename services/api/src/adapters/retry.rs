//! services/api/src/adapters/retry.rs
//!
//! A decorator that retries transient read failures of any `EntitySource` with
//! exponential backoff.

use async_trait::async_trait;
use learning_overlay_core::domain::{Article, Chapter, Course, Quiz};
use learning_overlay_core::ports::{EntitySource, PortResult};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2_u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Runs `op` until it succeeds, fails permanently, or the retries are exhausted.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, operation: &str, mut op: F) -> PortResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                warn!(
                    operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying fetch after failure"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Wraps an `EntitySource` so every read goes through `with_retry`.
pub struct RetryingEntitySource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingEntitySource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: EntitySource> EntitySource for RetryingEntitySource<S> {
    async fn courses(&self, limit: Option<usize>) -> PortResult<Vec<Course>> {
        with_retry(self.policy, "courses", || self.inner.courses(limit)).await
    }

    async fn course(&self, course_id: &str) -> PortResult<Course> {
        with_retry(self.policy, "course", || self.inner.course(course_id)).await
    }

    async fn chapters(&self) -> PortResult<Vec<Chapter>> {
        with_retry(self.policy, "chapters", || self.inner.chapters()).await
    }

    async fn chapter(&self, chapter_id: &str) -> PortResult<Chapter> {
        with_retry(self.policy, "chapter", || self.inner.chapter(chapter_id)).await
    }

    async fn chapters_for_course(&self, course_id: &str) -> PortResult<Vec<Chapter>> {
        with_retry(self.policy, "chapters_for_course", || {
            self.inner.chapters_for_course(course_id)
        })
        .await
    }

    async fn articles(&self, limit: Option<usize>) -> PortResult<Vec<Article>> {
        with_retry(self.policy, "articles", || self.inner.articles(limit)).await
    }

    async fn article(&self, article_id: &str) -> PortResult<Article> {
        with_retry(self.policy, "article", || self.inner.article(article_id)).await
    }

    async fn quiz_for_course(&self, course_id: &str) -> PortResult<Quiz> {
        with_retry(self.policy, "quiz_for_course", || self.inner.quiz_for_course(course_id)).await
    }
}
