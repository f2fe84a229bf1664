// src/grading/matcher.rs

use std::collections::{HashMap, HashSet};

use crate::models::{
    exam::Question,
    exam_result::{AnsweredQuestion, SubmittedAnswer},
};

/// Why a submitted answer set could not be matched against an exam.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("Expected {expected} answers but received {submitted}")]
    IncompleteAnswers { expected: usize, submitted: usize },

    /// The answer names a question the exam does not have, or repeats one.
    #[error("Answer for question {question_id} does not match a unique exam question")]
    InvalidAnswer { question_id: i64 },
}

/// Per-question correctness plus the number of correct answers.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// In exam order, not submission order.
    pub answered: Vec<AnsweredQuestion>,
    pub correct_count: usize,
}

impl MatchOutcome {
    pub fn total(&self) -> usize {
        self.answered.len()
    }
}

/// Compares a student's answers to the exam's answer key.
///
/// Every question must be answered exactly once. Answers are matched by
/// question id and compared with exact string equality.
pub fn match_answers(
    questions: &[Question],
    answers: &[SubmittedAnswer],
) -> Result<MatchOutcome, MatchError> {
    if questions.len() != answers.len() {
        return Err(MatchError::IncompleteAnswers {
            expected: questions.len(),
            submitted: answers.len(),
        });
    }

    let known: HashSet<i64> = questions.iter().map(|q| q.id).collect();
    let mut by_question: HashMap<i64, &str> = HashMap::with_capacity(answers.len());

    for answer in answers {
        if !known.contains(&answer.question_id)
            || by_question
                .insert(answer.question_id, answer.chosen_answer.as_str())
                .is_some()
        {
            return Err(MatchError::InvalidAnswer {
                question_id: answer.question_id,
            });
        }
    }

    let mut answered = Vec::with_capacity(questions.len());
    let mut correct_count = 0;

    for question in questions {
        // Equal lengths with unique, known ids cover every question.
        let Some(&submitted) = by_question.get(&question.id) else {
            return Err(MatchError::IncompleteAnswers {
                expected: questions.len(),
                submitted: by_question.len(),
            });
        };

        let is_correct = submitted == question.correct_answer;
        if is_correct {
            correct_count += 1;
        }

        answered.push(AnsweredQuestion {
            question_id: question.id,
            submitted_answer: submitted.to_string(),
            correct_answer: question.correct_answer.clone(),
            is_correct,
        });
    }

    Ok(MatchOutcome {
        answered,
        correct_count,
    })
}
