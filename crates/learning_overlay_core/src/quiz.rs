//! Quiz normalization and scoring.
//!
//! Quizzes are authored by hand in the content database, so question documents come
//! in a few shapes. `normalize_question` folds them into one `QuizQuestion`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Quiz, QuizQuestion};

const FALLBACK_OPTIONS: [&str; 4] = ["Option 1", "Option 2", "Option 3", "Option 4"];

/// Normalizes one raw question document.
///
/// `options` may be a list or a map of strings; non-string entries are dropped and any
/// other shape falls back to four placeholder options. `responseCorrecte` may be a
/// number or a numeric string; anything else selects the first option. Negative or
/// fractional indices are kept as `None`, which no answer matches.
pub fn normalize_question(raw: &Value) -> QuizQuestion {
    let question = raw
        .get("question")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let options = match raw.get("options") {
        Some(Value::Array(items)) => strings_of(items.iter()),
        Some(Value::Object(map)) => strings_of(map.values()),
        _ => FALLBACK_OPTIONS.iter().map(|s| s.to_string()).collect(),
    };

    let correct_index = match raw.get("responseCorrecte") {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .and_then(|n| usize::try_from(n).ok()),
        Some(Value::String(s)) => leading_integer(s),
        _ => Some(0),
    };

    QuizQuestion {
        question,
        options,
        correct_index,
    }
}

fn strings_of<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<String> {
    values.filter_map(Value::as_str).map(str::to_string).collect()
}

/// Parses the leading signed integer of `s`, ignoring leading whitespace.
///
/// No digits (or zero) reads as `0`; a negative value reads as `None`.
fn leading_integer(s: &str) -> Option<usize> {
    let trimmed = s.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() || digits.bytes().all(|b| b == b'0') {
        return Some(0);
    }
    if negative {
        return None;
    }
    digits.parse().ok()
}

/// Builds a quiz from its raw question documents.
pub fn normalize_quiz(id: &str, cours_id: &str, titre: &str, questions: &[Value]) -> Quiz {
    Quiz {
        id: id.to_string(),
        cours_id: cours_id.to_string(),
        titre: titre.to_string(),
        questions: questions.iter().map(normalize_question).collect(),
    }
}

/// Counts answers that pick the correct option. Missing answers count as wrong.
pub fn score_answers(quiz: &Quiz, answers: &[usize]) -> usize {
    quiz.questions
        .iter()
        .zip(answers)
        .filter(|(question, answer)| question.correct_index == Some(**answer))
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub score: usize,
    pub total: usize,
    pub passed: bool,
}

impl QuizOutcome {
    /// A quiz is passed with at least half of the answers right.
    pub fn evaluate(score: usize, total: usize) -> Self {
        let passed = score as f64 >= total as f64 / 2.0;
        Self { score, total, passed }
    }
}
