//! Local scoring of quiz submissions

use super::{QuizError, QuizQuestion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accuracy below which a topic is reported as weak
pub const WEAK_TOPIC_THRESHOLD: f64 = 0.6;

/// Topic used for questions the model did not tag
pub const UNTAGGED_TOPIC: &str = "General";

/// One submitted answer: an option index, the option text, or nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Index(usize),
    Text(String),
}

impl SubmittedAnswer {
    /// Resolve against the options of a question
    fn resolve(&self, question: &QuizQuestion) -> Option<usize> {
        match self {
            SubmittedAnswer::Index(index) => (*index < question.options.len()).then_some(*index),
            SubmittedAnswer::Text(text) => question
                .options
                .iter()
                .position(|option| option.eq_ignore_ascii_case(text.trim())),
        }
    }
}

/// Questions as served plus the user's answers, position for position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub questions: Vec<QuizQuestion>,

    /// `null` marks a skipped question
    pub answers: Vec<Option<SubmittedAnswer>>,
}

/// Accuracy for one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicScore {
    pub topic: String,
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

/// A question the user got wrong or skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissedQuestion {
    pub question: String,

    #[serde(default)]
    pub your_answer: Option<String>,

    pub correct_answer: String,

    #[serde(default)]
    pub topic: Option<String>,
}

/// Result of scoring a submission; accepted back as `previousResults`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnalysis {
    pub score: usize,

    pub total: usize,

    /// Percentage rounded to one decimal place
    pub percentage: f64,

    #[serde(default)]
    pub topics: Vec<TopicScore>,

    #[serde(default)]
    pub weak_topics: Vec<String>,

    #[serde(default)]
    pub missed: Vec<MissedQuestion>,
}

impl QuizAnalysis {
    /// Short description fed into the next generation prompt
    pub fn summary(&self, max_missed: usize) -> String {
        let mut summary = format!(
            "The student previously scored {}/{} ({:.1}%).",
            self.score, self.total, self.percentage
        );

        if !self.weak_topics.is_empty() {
            summary.push_str(&format!(" Weak topics: {}.", self.weak_topics.join(", ")));
        }

        if !self.missed.is_empty() {
            summary.push_str(" Questions they missed:");
            for missed in self.missed.iter().take(max_missed) {
                summary.push_str(&format!(
                    "\n- {} (correct answer: {})",
                    missed.question, missed.correct_answer
                ));
            }
        }

        summary
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score a submission
pub fn analyze(submission: &QuizSubmission) -> Result<QuizAnalysis, QuizError> {
    if submission.questions.is_empty() {
        return Err(QuizError::Validation("questions must not be empty".to_string()));
    }
    if submission.answers.len() != submission.questions.len() {
        return Err(QuizError::Validation(format!(
            "expected {} answers, got {}",
            submission.questions.len(),
            submission.answers.len()
        )));
    }

    let mut score = 0;
    let mut by_topic: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    let mut missed = Vec::new();

    for (question, answer) in submission.questions.iter().zip(&submission.answers) {
        let chosen = answer.as_ref().and_then(|a| a.resolve(question));
        let correct = chosen == Some(question.answer_index);

        let topic = question
            .topic
            .clone()
            .unwrap_or_else(|| UNTAGGED_TOPIC.to_string());
        let entry = by_topic.entry(topic).or_default();
        entry.1 += 1;

        if correct {
            score += 1;
            entry.0 += 1;
        } else {
            missed.push(MissedQuestion {
                question: question.question.clone(),
                your_answer: chosen.and_then(|i| question.options.get(i).cloned()),
                correct_answer: question.correct_option().to_string(),
                topic: question.topic.clone(),
            });
        }
    }

    let topics: Vec<TopicScore> = by_topic
        .into_iter()
        .map(|(topic, (correct, total))| TopicScore {
            topic,
            correct,
            total,
            accuracy: round_one_decimal(correct as f64 / total as f64 * 100.0) / 100.0,
        })
        .collect();

    let weak_topics = topics
        .iter()
        .filter(|t| (t.correct as f64 / t.total as f64) < WEAK_TOPIC_THRESHOLD)
        .map(|t| t.topic.clone())
        .collect();

    let total = submission.questions.len();
    Ok(QuizAnalysis {
        score,
        total,
        percentage: round_one_decimal(score as f64 / total as f64 * 100.0),
        topics,
        weak_topics,
        missed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: usize, topic: Option<&str>, answer_index: usize) -> QuizQuestion {
        QuizQuestion {
            id,
            question: format!("Question {}", id),
            options: vec!["a".into(), "b".into(), "c".into()],
            answer_index,
            explanation: None,
            topic: topic.map(str::to_string),
        }
    }

    #[test]
    fn test_scoring_and_weak_topics() {
        let submission = QuizSubmission {
            questions: vec![
                question(1, Some("Algebra"), 0),
                question(2, Some("Algebra"), 1),
                question(3, Some("Geometry"), 2),
                question(4, None, 0),
            ],
            answers: vec![
                Some(SubmittedAnswer::Index(0)),
                Some(SubmittedAnswer::Text("c".into())),
                Some(SubmittedAnswer::Text("C".into())),
                None,
            ],
        };

        let analysis = analyze(&submission).unwrap();
        assert_eq!(analysis.score, 2);
        assert_eq!(analysis.total, 4);
        assert_eq!(analysis.percentage, 50.0);
        assert_eq!(analysis.weak_topics, vec!["Algebra", "General"]);
        assert_eq!(analysis.missed.len(), 2);
        assert_eq!(analysis.missed[0].your_answer.as_deref(), Some("c"));
        assert_eq!(analysis.missed[0].correct_answer, "b");
        assert_eq!(analysis.missed[1].your_answer, None);

        let geometry = analysis.topics.iter().find(|t| t.topic == "Geometry").unwrap();
        assert_eq!(geometry.accuracy, 1.0);
    }

    #[test]
    fn test_answer_count_mismatch() {
        let submission = QuizSubmission {
            questions: vec![question(1, None, 0)],
            answers: vec![],
        };
        assert!(matches!(analyze(&submission), Err(QuizError::Validation(_))));
    }

    #[test]
    fn test_out_of_range_index_is_wrong() {
        let submission = QuizSubmission {
            questions: vec![question(1, None, 0)],
            answers: vec![Some(SubmittedAnswer::Index(9))],
        };
        let analysis = analyze(&submission).unwrap();
        assert_eq!(analysis.score, 0);
        assert_eq!(analysis.missed[0].your_answer, None);
    }

    #[test]
    fn test_analysis_round_trips_as_previous_results() {
        let submission = QuizSubmission {
            questions: vec![question(1, Some("Cells"), 1)],
            answers: vec![Some(SubmittedAnswer::Index(0))],
        };
        let analysis = analyze(&submission).unwrap();
        let json = serde_json::to_value(&analysis).unwrap();
        assert!(json.get("weakTopics").is_some());
        let back: QuizAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(back, analysis);

        let summary = back.summary(5);
        assert!(summary.contains("0/1"));
        assert!(summary.contains("Weak topics: Cells."));
        assert!(summary.contains("correct answer: b"));
    }
}
