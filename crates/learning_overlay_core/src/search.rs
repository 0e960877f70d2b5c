//! Free-text search across courses, chapters and articles, with match highlighting
//! and the recent-searches list.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::domain::{Article, Chapter, Course};

/// How many recent queries the search history keeps.
pub const SEARCH_HISTORY_LIMIT: usize = 5;

/// Characters of article content shown under an article hit.
const ARTICLE_EXCERPT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SearchHit {
    Course(Course),
    Chapter(Chapter),
    Article(Article),
}

impl SearchHit {
    pub fn id(&self) -> &str {
        match self {
            SearchHit::Course(course) => &course.id,
            SearchHit::Chapter(chapter) => &chapter.id,
            SearchHit::Article(article) => &article.id,
        }
    }

    /// The headline shown for the hit.
    pub fn title(&self) -> &str {
        match self {
            SearchHit::Course(course) => &course.title,
            SearchHit::Chapter(chapter) => &chapter.titre,
            SearchHit::Article(article) => &article.titre,
        }
    }

    /// The secondary text shown under the headline.
    pub fn excerpt(&self) -> String {
        match self {
            SearchHit::Course(course) => course.description.clone(),
            SearchHit::Chapter(chapter) => chapter.description.clone(),
            SearchHit::Article(article) => {
                let head: String = article.contenu.chars().take(ARTICLE_EXCERPT_CHARS).collect();
                format!("{head}...")
            }
        }
    }
}

fn contains_folded(field: &str, needle: &str) -> bool {
    field.to_lowercase().contains(needle)
}

/// Matches `query` against every collection.
///
/// Courses come first, then chapters, then articles, each in source order. A blank
/// query returns nothing without looking at the collections.
pub fn search(query: &str, courses: &[Course], chapters: &[Chapter], articles: &[Article]) -> Vec<SearchHit> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    let course_hits = courses
        .iter()
        .filter(|c| {
            contains_folded(&c.title, &needle)
                || contains_folded(&c.description, &needle)
                || contains_folded(&c.category, &needle)
        })
        .cloned()
        .map(SearchHit::Course);
    let chapter_hits = chapters
        .iter()
        .filter(|c| contains_folded(&c.titre, &needle) || contains_folded(&c.description, &needle))
        .cloned()
        .map(SearchHit::Chapter);
    let article_hits = articles
        .iter()
        .filter(|a| {
            contains_folded(&a.titre, &needle)
                || contains_folded(&a.auteur, &needle)
                || contains_folded(&a.contenu, &needle)
        })
        .cloned()
        .map(SearchHit::Article);

    course_hits.chain(chapter_hits).chain(article_hits).collect()
}

//=========================================================================================
// Highlighting
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSegment {
    pub text: String,
    pub matched: bool,
}

/// Builds the `\b(term|term|...)\b` matcher for a query, or `None` for a blank query.
fn term_matcher(query: &str) -> Option<Regex> {
    let terms: Vec<String> = query.split_whitespace().map(regex::escape).collect();
    if terms.is_empty() {
        return None;
    }
    RegexBuilder::new(&format!(r"\b({})\b", terms.join("|")))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Splits `text` into matched and unmatched segments.
///
/// Every whitespace-separated term of the query is highlighted on its own where it
/// appears as a whole word; the query is not treated as a phrase.
pub fn highlight(text: &str, query: &str) -> Vec<HighlightSegment> {
    let Some(matcher) = term_matcher(query) else {
        return plain(text);
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for found in matcher.find_iter(text) {
        if found.start() > cursor {
            segments.push(HighlightSegment {
                text: text[cursor..found.start()].to_string(),
                matched: false,
            });
        }
        if !found.as_str().is_empty() {
            segments.push(HighlightSegment {
                text: found.as_str().to_string(),
                matched: true,
            });
        }
        cursor = found.end();
    }
    if cursor < text.len() {
        segments.push(HighlightSegment {
            text: text[cursor..].to_string(),
            matched: false,
        });
    }
    segments
}

fn plain(text: &str) -> Vec<HighlightSegment> {
    if text.is_empty() {
        return Vec::new();
    }
    vec![HighlightSegment {
        text: text.to_string(),
        matched: false,
    }]
}

//=========================================================================================
// History
//=========================================================================================

/// Prepends a query to the history unless it is blank or already present.
pub fn record_search(history: Vec<String>, query: &str) -> Vec<String> {
    if query.is_empty() || history.iter().any(|past| past == query) {
        return history;
    }
    std::iter::once(query.to_string())
        .chain(history.into_iter().take(SEARCH_HISTORY_LIMIT - 1))
        .collect()
}
