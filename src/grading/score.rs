// src/grading/score.rs

use std::fmt;

use serde::Serialize;

use crate::models::exam_result::ResultStatus;

/// Letter grade, banded on the percentage of correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage {
            p if p >= 80.0 => Grade::A,
            p if p >= 70.0 => Grade::B,
            p if p >= 60.0 => Grade::C,
            p if p >= 50.0 => Grade::D,
            p if p >= 40.0 => Grade::E,
            _ => Grade::F,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }

    fn remark(self) -> &'static str {
        match self {
            Grade::A => "Excellent",
            Grade::B => "Very good",
            Grade::C => "Good",
            Grade::D => "Fair",
            Grade::E | Grade::F => "Pass",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything derived from the correct-answer count.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    /// On the exam's `total_mark` scale.
    pub score: f64,
    pub grade: Grade,
    pub status: ResultStatus,
    pub remarks: &'static str,
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Derives score, grade, status and remarks.
///
/// The pass boundary is inclusive: `score == pass_mark` passes.
/// An exam with no questions scores zero.
pub fn calculate(correct: usize, total: usize, pass_mark: f64, total_mark: f64) -> ScoreCard {
    let fraction = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    };

    let score = round2(fraction * total_mark);
    let grade = Grade::from_percentage(fraction * 100.0);
    let status = if score >= pass_mark {
        ResultStatus::Pass
    } else {
        ResultStatus::Fail
    };
    let remarks = match status {
        ResultStatus::Pass => grade.remark(),
        ResultStatus::Fail => "Below pass mark",
    };

    ScoreCard {
        score,
        grade,
        status,
        remarks,
    }
}
