//! Normalization of heterogeneous quiz shapes
//!
//! Accepted containers: a bare array, or an object holding the array under
//! `questions`, `quiz`, `items` or `data`, or a single question object.
//! Per question, several field spellings are accepted and the answer may
//! be the option text, a letter, or a zero-based index.

use super::QuizQuestion;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

const CONTAINER_KEYS: [&str; 4] = ["questions", "quiz", "items", "data"];
const QUESTION_KEYS: [&str; 4] = ["question", "text", "prompt", "q"];
const OPTION_KEYS: [&str; 3] = ["options", "choices", "answers"];
const ANSWER_KEYS: [&str; 5] = ["answer", "correctAnswer", "correct_answer", "correct", "correctOption"];
const EXPLANATION_KEYS: [&str; 3] = ["explanation", "rationale", "reason"];
const TOPIC_KEYS: [&str; 3] = ["topic", "subtopic", "category"];

fn label_pattern() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| Regex::new(r"^\(?([A-Ha-h])[\).:]\s+").expect("label pattern is valid"))
}

fn first_str<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Drop a leading "A) " / "b. " / "(C) " label
fn strip_label(option: &str) -> &str {
    match label_pattern().find(option) {
        Some(m) => option[m.end()..].trim(),
        None => option.trim(),
    }
}

fn letter_index(letter: &str) -> Option<usize> {
    let mut chars = letter.chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !('A'..='H').contains(&c) {
        return None;
    }
    Some(c as usize - 'A' as usize)
}

fn option_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Object(object) => first_str(object, &["text", "label", "value", "option"])?,
        Value::Number(n) => return Some(n.to_string()),
        _ => return None,
    };
    let text = strip_label(text);
    (!text.is_empty()).then(|| text.to_string())
}

fn collect_options(object: &Map<String, Value>) -> Vec<String> {
    let Some(raw) = OPTION_KEYS.iter().find_map(|key| object.get(*key)) else {
        return Vec::new();
    };

    match raw {
        Value::Array(items) => items.iter().filter_map(option_text).collect(),
        // {"A": "...", "B": "..."}; serde_json maps iterate in key order
        Value::Object(map) => map.values().filter_map(option_text).collect(),
        _ => Vec::new(),
    }
}

fn resolve_answer(value: &Value, options: &[String]) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|i| i as usize).filter(|i| *i < options.len()),
        Value::String(s) => {
            let answer = s.trim();
            let matches = |candidate: &str| {
                options
                    .iter()
                    .position(|option| option.eq_ignore_ascii_case(candidate))
            };

            matches(answer)
                .or_else(|| matches(strip_label(answer)))
                .or_else(|| letter_index(answer).filter(|i| *i < options.len()))
                .or_else(|| {
                    label_pattern()
                        .captures(answer)
                        .and_then(|cap| letter_index(&cap[1]))
                        .filter(|i| *i < options.len())
                })
        }
        Value::Object(object) => ["text", "option", "index"]
            .iter()
            .filter_map(|key| object.get(*key))
            .find_map(|inner| resolve_answer(inner, options)),
        _ => None,
    }
}

fn normalize_one(value: &Value, id: usize) -> Option<QuizQuestion> {
    let object = value.as_object()?;
    let question = first_str(object, &QUESTION_KEYS)?.to_string();
    let options = collect_options(object);
    if options.len() < 2 {
        return None;
    }
    let answer_index = ANSWER_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .find_map(|answer| resolve_answer(answer, &options))?;

    Some(QuizQuestion {
        id,
        question,
        options,
        answer_index,
        explanation: first_str(object, &EXPLANATION_KEYS).map(str::to_string),
        topic: first_str(object, &TOPIC_KEYS).map(str::to_string),
    })
}

fn question_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(object) => {
            if let Some(items) = CONTAINER_KEYS
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_array))
            {
                return items.iter().collect();
            }
            if let Some(nested) = CONTAINER_KEYS
                .iter()
                .find_map(|key| object.get(*key).filter(|v| v.is_object()))
            {
                return question_items(nested);
            }
            if first_str(object, &QUESTION_KEYS).is_some() {
                return vec![value];
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

/// Normalize any accepted quiz shape; unusable questions are dropped
pub fn normalize_questions(value: &Value) -> Vec<QuizQuestion> {
    question_items(value)
        .into_iter()
        .filter_map(|item| normalize_one(item, 0))
        .enumerate()
        .map(|(index, mut question)| {
            question.id = index + 1;
            question
        })
        .collect()
}
