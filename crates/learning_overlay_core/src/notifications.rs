//! Notification generation and the read/delete overlay merge.
//!
//! Notifications are regenerated from the latest courses and articles on every load.
//! The overlay only contributes the `read` flag of entries that still exist. A deleted
//! notification is represented by its absence from the overlay, which is also what a
//! never-seen notification looks like: if its source is still published it comes back
//! unread on the next merge.

use std::collections::HashMap;

use crate::domain::{Article, Course, Notification, NotificationKind};

const NEW_COURSE_TITLE: &str = "New course available";
const NEW_ARTICLE_TITLE: &str = "New article published";
const GENERATED_TIME: &str = "Now";

/// One unread notification per course, then one per article.
///
/// Course items keep the input order. Article items are ordered oldest first, with
/// undated articles last.
pub fn generate_notifications(courses: &[Course], articles: &[Article]) -> Vec<Notification> {
    let mut articles: Vec<&Article> = articles.iter().collect();
    articles.sort_by_key(|article| (article.created_at.is_none(), article.created_at));

    let from_courses = courses.iter().map(|course| Notification {
        id: course.id.clone(),
        kind: NotificationKind::Course,
        title: NEW_COURSE_TITLE.to_string(),
        message: format!("The course \"{}\" is now available.", course.title),
        time: GENERATED_TIME.to_string(),
        read: false,
        course_id: Some(course.id.clone()),
        article_id: None,
    });
    let from_articles = articles.into_iter().map(|article| Notification {
        id: article.id.clone(),
        kind: NotificationKind::Article,
        title: NEW_ARTICLE_TITLE.to_string(),
        message: format!("Article: \"{}\" by {}.", article.titre, article.auteur),
        time: GENERATED_TIME.to_string(),
        read: false,
        course_id: None,
        article_id: Some(article.id.clone()),
    });
    from_courses.chain(from_articles).collect()
}

/// Copies the `read` flag from the overlay onto the generated notifications.
///
/// Membership follows `generated`; overlay entries without a generated counterpart
/// are dropped. Ids are compared without regard to the notification kind.
pub fn merge_notifications(generated: Vec<Notification>, overlay: &[Notification]) -> Vec<Notification> {
    // First overlay entry wins when an id repeats.
    let mut read_by_id: HashMap<&str, bool> = HashMap::with_capacity(overlay.len());
    for entry in overlay {
        read_by_id.entry(entry.id.as_str()).or_insert(entry.read);
    }

    generated
        .into_iter()
        .map(|mut notification| {
            if let Some(read) = read_by_id.get(notification.id.as_str()) {
                notification.read = *read;
            }
            notification
        })
        .collect()
}

pub fn mark_all_read(current: &[Notification]) -> Vec<Notification> {
    current
        .iter()
        .cloned()
        .map(|mut notification| {
            notification.read = true;
            notification
        })
        .collect()
}

pub fn mark_read(current: &[Notification], id: &str) -> Vec<Notification> {
    current
        .iter()
        .cloned()
        .map(|mut notification| {
            if notification.id == id {
                notification.read = true;
            }
            notification
        })
        .collect()
}

pub fn delete(current: &[Notification], id: &str) -> Vec<Notification> {
    current.iter().filter(|n| n.id != id).cloned().collect()
}

pub fn delete_all(_current: &[Notification]) -> Vec<Notification> {
    Vec::new()
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}
