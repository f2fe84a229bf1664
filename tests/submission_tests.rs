// tests/submission_tests.rs

use std::sync::Arc;

use async_trait::async_trait;
use school_exams::{
    grading::{SubmissionError, submit_exam},
    models::{
        exam::{CreateQuestionRequest, Exam, NewExam},
        exam_result::{ExamResult, NewExamResult, ResultStatus, SubmittedAnswer},
        student::{NewStudent, Student, UpdateStudentStatusRequest},
    },
    store::{ExamStore, MemoryStore, SchoolStore, StoreError, SubmissionTx},
};

/// Seeds a student and a 4-question exam keyed [A, B, C, D] with pass mark 50.
async fn seed(store: &MemoryStore) -> (Student, Exam) {
    let student = store
        .create_student(NewStudent {
            name: "Ada Student".to_string(),
            email: format!("ada_{}@school.test", &uuid::Uuid::new_v4().to_string()[..8]),
            password_hash: "unused".to_string(),
        })
        .await
        .unwrap();

    let exam = store
        .create_exam(NewExam {
            name: "Term 1 Science".to_string(),
            description: None,
            pass_mark: 50.0,
            total_mark: 100.0,
            class_level_id: 11,
            academic_term_id: 22,
            academic_year_id: 33,
            created_by: 7,
            questions: ["A", "B", "C", "D"]
                .iter()
                .enumerate()
                .map(|(i, key)| CreateQuestionRequest {
                    content: format!("Question {}", i + 1),
                    options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                    correct_answer: key.to_string(),
                })
                .collect(),
        })
        .await
        .unwrap();

    (student, exam)
}

/// Pairs each exam question, in order, with the given choice.
fn answers(exam: &Exam, chosen: &[&str]) -> Vec<SubmittedAnswer> {
    exam.questions
        .iter()
        .zip(chosen)
        .map(|(q, c)| SubmittedAnswer {
            question_id: q.id,
            chosen_answer: c.to_string(),
        })
        .collect()
}

async fn exam_results_of(store: &MemoryStore, student_id: i64) -> Vec<i64> {
    store
        .find_student(student_id)
        .await
        .unwrap()
        .unwrap()
        .exam_results
}

#[tokio::test]
async fn three_of_four_correct_passes() {
    let store = MemoryStore::new();
    let (student, exam) = seed(&store).await;

    let receipt = submit_exam(&store, student.id, exam.id, &answers(&exam, &["A", "B", "X", "D"]))
        .await
        .unwrap();

    let result = store.find_result(student.id, exam.id).await.unwrap().unwrap();
    assert_eq!(result.id, receipt.result_id);
    assert_eq!(result.score, 75.0);
    assert_eq!(result.status, ResultStatus::Pass);
    assert_eq!(result.grade, "B");
    assert_eq!(result.pass_mark, 50.0);
    assert_eq!(result.answered_questions.len(), 4);
    assert!(!result.answered_questions[2].is_correct);

    // Contextual fields are copied from the exam
    assert_eq!(result.teacher_id, 7);
    assert_eq!(result.class_level_id, 11);
    assert_eq!(result.academic_term_id, 22);
    assert_eq!(result.academic_year_id, 33);

    assert_eq!(exam_results_of(&store, student.id).await, vec![result.id]);
}

#[tokio::test]
async fn all_wrong_fails() {
    let store = MemoryStore::new();
    let (student, exam) = seed(&store).await;

    submit_exam(&store, student.id, exam.id, &answers(&exam, &["X", "X", "X", "X"]))
        .await
        .unwrap();

    let result = store.find_result(student.id, exam.id).await.unwrap().unwrap();
    assert_eq!(result.score, 0.0);
    assert_eq!(result.status, ResultStatus::Fail);
    assert_eq!(result.remarks, "Below pass mark");
}

#[tokio::test]
async fn suspended_student_is_ineligible() {
    let store = MemoryStore::new();
    let (student, exam) = seed(&store).await;
    store
        .update_student_status(
            student.id,
            &UpdateStudentStatusRequest {
                is_suspended: Some(true),
                is_withdrawn: None,
            },
        )
        .await
        .unwrap();

    let err = submit_exam(&store, student.id, exam.id, &answers(&exam, &["A", "B", "C", "D"]))
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::Ineligible));
    assert!(store.find_result(student.id, exam.id).await.unwrap().is_none());
    assert!(exam_results_of(&store, student.id).await.is_empty());
}

#[tokio::test]
async fn withdrawn_student_is_ineligible() {
    let store = MemoryStore::new();
    let (student, exam) = seed(&store).await;
    store
        .update_student_status(
            student.id,
            &UpdateStudentStatusRequest {
                is_suspended: None,
                is_withdrawn: Some(true),
            },
        )
        .await
        .unwrap();

    let err = submit_exam(&store, student.id, exam.id, &answers(&exam, &["A", "B", "C", "D"]))
        .await
        .unwrap_err();

    assert!(matches!(err, SubmissionError::Ineligible));
}

#[tokio::test]
async fn second_submission_is_rejected_and_first_result_kept() {
    let store = MemoryStore::new();
    let (student, exam) = seed(&store).await;

    submit_exam(&store, student.id, exam.id, &answers(&exam, &["A", "X", "X", "X"]))
        .await
        .unwrap();
    let first = store.find_result(student.id, exam.id).await.unwrap().unwrap();

    let err = submit_exam(&store, student.id, exam.id, &answers(&exam, &["A", "B", "C", "D"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::AlreadySubmitted));

    let after = store.find_result(student.id, exam.id).await.unwrap().unwrap();
    assert_eq!(after.id, first.id);
    assert_eq!(after.score, 25.0);
    assert_eq!(exam_results_of(&store, student.id).await, vec![first.id]);
}

#[tokio::test]
async fn existing_result_is_reported_before_suspension() {
    let store = MemoryStore::new();
    let (student, exam) = seed(&store).await;

    submit_exam(&store, student.id, exam.id, &answers(&exam, &["A", "B", "C", "D"]))
        .await
        .unwrap();
    store
        .update_student_status(
            student.id,
            &UpdateStudentStatusRequest {
                is_suspended: Some(true),
                is_withdrawn: None,
            },
        )
        .await
        .unwrap();

    let err = submit_exam(&store, student.id, exam.id, &answers(&exam, &["A", "B", "C", "D"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::AlreadySubmitted));
}

#[tokio::test]
async fn wrong_answer_count_creates_nothing() {
    let store = MemoryStore::new();
    let (student, exam) = seed(&store).await;

    let err = submit_exam(&store, student.id, exam.id, &answers(&exam, &["A", "B", "C"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SubmissionError::IncompleteAnswers {
            expected: 4,
            submitted: 3
        }
    ));

    let mut too_many = answers(&exam, &["A", "B", "C", "D"]);
    too_many.push(too_many[0].clone());
    let err = submit_exam(&store, student.id, exam.id, &too_many)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::IncompleteAnswers { .. }));

    assert!(store.find_result(student.id, exam.id).await.unwrap().is_none());
    assert!(exam_results_of(&store, student.id).await.is_empty());
}

#[tokio::test]
async fn unknown_question_id_is_invalid() {
    let store = MemoryStore::new();
    let (student, exam) = seed(&store).await;

    let mut submitted = answers(&exam, &["A", "B", "C", "D"]);
    submitted[3].question_id = 999_999;

    let err = submit_exam(&store, student.id, exam.id, &submitted)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SubmissionError::InvalidAnswer {
            question_id: 999_999
        }
    ));
    assert!(store.find_result(student.id, exam.id).await.unwrap().is_none());
}

#[tokio::test]
async fn missing_student_or_exam_is_not_found() {
    let store = MemoryStore::new();
    let (student, exam) = seed(&store).await;
    let submitted = answers(&exam, &["A", "B", "C", "D"]);

    let err = submit_exam(&store, 424_242, exam.id, &submitted)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::NotFound("Student")));

    let err = submit_exam(&store, student.id, 424_242, &submitted)
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::NotFound("Exam")));
}

#[tokio::test]
async fn grading_is_deterministic_across_students() {
    let store = MemoryStore::new();
    let (first, exam) = seed(&store).await;
    let second = store
        .create_student(NewStudent {
            name: "Grace Student".to_string(),
            email: "grace@school.test".to_string(),
            password_hash: "unused".to_string(),
        })
        .await
        .unwrap();

    let submitted = answers(&exam, &["A", "C", "C", "D"]);
    submit_exam(&store, first.id, exam.id, &submitted).await.unwrap();
    submit_exam(&store, second.id, exam.id, &submitted).await.unwrap();

    let a = store.find_result(first.id, exam.id).await.unwrap().unwrap();
    let b = store.find_result(second.id, exam.id).await.unwrap().unwrap();
    assert_eq!(a.score, b.score);
    assert_eq!(a.grade, b.grade);
    assert_eq!(a.status, b.status);
    assert_eq!(a.answered_questions.0, b.answered_questions.0);
}

#[tokio::test]
async fn concurrent_submissions_record_one_result() {
    let store = Arc::new(MemoryStore::new());
    let (student, exam) = seed(&store).await;
    let submitted = answers(&exam, &["A", "B", "C", "D"]);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let submitted = submitted.clone();
            let (student_id, exam_id) = (student.id, exam.id);
            tokio::spawn(async move { submit_exam(&*store, student_id, exam_id, &submitted).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(SubmissionError::AlreadySubmitted) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(store.list_results_for_student(student.id).await.unwrap().len(), 1);
    assert_eq!(exam_results_of(&store, student.id).await.len(), 1);
}

/// Store whose submission writer fails on the student update.
struct FailingAppendStore {
    inner: MemoryStore,
}

struct FailingAppendTx<'a> {
    inner: Box<dyn SubmissionTx + 'a>,
}

#[async_trait]
impl<'a> SubmissionTx for FailingAppendTx<'a> {
    async fn lock_student(&mut self, student_id: i64) -> Result<Option<Student>, StoreError> {
        self.inner.lock_student(student_id).await
    }

    async fn create_result(&mut self, record: NewExamResult) -> Result<ExamResult, StoreError> {
        self.inner.create_result(record).await
    }

    async fn append_exam_result(
        &mut self,
        student_id: i64,
        _result_id: i64,
    ) -> Result<(), StoreError> {
        Err(StoreError::Missing {
            entity: "student",
            id: student_id,
        })
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.commit().await
    }
}

#[async_trait]
impl ExamStore for FailingAppendStore {
    async fn find_student(&self, id: i64) -> Result<Option<Student>, StoreError> {
        self.inner.find_student(id).await
    }

    async fn find_exam(&self, id: i64) -> Result<Option<Exam>, StoreError> {
        self.inner.find_exam(id).await
    }

    async fn find_result(
        &self,
        student_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError> {
        self.inner.find_result(student_id, exam_id).await
    }

    async fn begin_submission<'a>(&'a self) -> Result<Box<dyn SubmissionTx + 'a>, StoreError> {
        let inner = self.inner.begin_submission().await?;
        Ok(Box::new(FailingAppendTx { inner }))
    }
}

#[tokio::test]
async fn failed_student_update_rolls_back_result() {
    let store = FailingAppendStore {
        inner: MemoryStore::new(),
    };
    let (student, exam) = seed(&store.inner).await;

    let err = submit_exam(&store, student.id, exam.id, &answers(&exam, &["A", "B", "C", "D"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Store(StoreError::Missing { .. })));

    // Nothing from the aborted attempt is visible, so a clean retry succeeds.
    assert!(store.inner.find_result(student.id, exam.id).await.unwrap().is_none());
    assert!(exam_results_of(&store.inner, student.id).await.is_empty());

    submit_exam(&store.inner, student.id, exam.id, &answers(&exam, &["A", "B", "C", "D"]))
        .await
        .unwrap();
    assert_eq!(exam_results_of(&store.inner, student.id).await.len(), 1);
}

/// Store that suspends the student right after the eligibility check passed,
/// just before the submission writer is opened.
struct SuspendOnBeginStore {
    inner: MemoryStore,
}

#[async_trait]
impl ExamStore for SuspendOnBeginStore {
    async fn find_student(&self, id: i64) -> Result<Option<Student>, StoreError> {
        self.inner.find_student(id).await
    }

    async fn find_exam(&self, id: i64) -> Result<Option<Exam>, StoreError> {
        self.inner.find_exam(id).await
    }

    async fn find_result(
        &self,
        student_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError> {
        self.inner.find_result(student_id, exam_id).await
    }

    async fn begin_submission<'a>(&'a self) -> Result<Box<dyn SubmissionTx + 'a>, StoreError> {
        let students: Vec<i64> = self
            .inner
            .list_students()
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        for id in students {
            self.inner
                .update_student_status(
                    id,
                    &UpdateStudentStatusRequest {
                        is_suspended: Some(true),
                        is_withdrawn: None,
                    },
                )
                .await?;
        }
        self.inner.begin_submission().await
    }
}

#[tokio::test]
async fn suspension_after_guard_is_caught_before_writing() {
    let store = SuspendOnBeginStore {
        inner: MemoryStore::new(),
    };
    let (student, exam) = seed(&store.inner).await;

    let err = submit_exam(&store, student.id, exam.id, &answers(&exam, &["A", "B", "C", "D"]))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Ineligible));

    assert!(store.inner.find_result(student.id, exam.id).await.unwrap().is_none());
    assert!(exam_results_of(&store.inner, student.id).await.is_empty());
}
