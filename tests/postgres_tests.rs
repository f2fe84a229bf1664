// tests/postgres_tests.rs
//
// Needs a running Postgres: DATABASE_URL=... cargo test -- --ignored

use std::sync::Arc;

use school_exams::{
    grading::{SubmissionError, submit_exam},
    models::{
        exam::{CreateQuestionRequest, NewExam},
        exam_result::{ResultStatus, SubmittedAnswer},
        student::NewStudent,
    },
    store::{ExamStore, PgExamStore, SchoolStore},
};
use sqlx::postgres::PgPoolOptions;

async fn connect() -> PgExamStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    PgExamStore::new(pool)
}

async fn seed(store: &PgExamStore) -> (i64, i64, Vec<SubmittedAnswer>) {
    let student = store
        .create_student(NewStudent {
            name: "Pg Student".to_string(),
            email: format!("pg_{}@school.test", uuid::Uuid::new_v4()),
            password_hash: "unused".to_string(),
        })
        .await
        .unwrap();

    let exam = store
        .create_exam(NewExam {
            name: "Pg Exam".to_string(),
            description: Some("Storage checks".to_string()),
            pass_mark: 50.0,
            total_mark: 100.0,
            class_level_id: 1,
            academic_term_id: 1,
            academic_year_id: 1,
            created_by: 1,
            questions: ["A", "B", "C", "D"]
                .iter()
                .map(|key| CreateQuestionRequest {
                    content: format!("Pick {}", key),
                    options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                    correct_answer: key.to_string(),
                })
                .collect(),
        })
        .await
        .unwrap();

    let answers = exam
        .questions
        .iter()
        .zip(["A", "B", "X", "D"])
        .map(|(q, c)| SubmittedAnswer {
            question_id: q.id,
            chosen_answer: c.to_string(),
        })
        .collect();

    (student.id, exam.id, answers)
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_submission_round_trip() {
    let store = connect().await;
    let (student_id, exam_id, answers) = seed(&store).await;

    let exam = store.find_exam(exam_id).await.unwrap().unwrap();
    assert_eq!(exam.questions.len(), 4);
    assert_eq!(exam.questions[0].correct_answer, "A");

    let receipt = submit_exam(&store, student_id, exam_id, &answers).await.unwrap();

    let result = store.find_result(student_id, exam_id).await.unwrap().unwrap();
    assert_eq!(result.id, receipt.result_id);
    assert_eq!(result.score, 75.0);
    assert_eq!(result.status, ResultStatus::Pass);

    let student = store.find_student(student_id).await.unwrap().unwrap();
    assert_eq!(student.exam_results, vec![result.id]);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn pg_concurrent_submissions_hit_unique_constraint() {
    let store = Arc::new(connect().await);
    let (student_id, exam_id, answers) = seed(&store).await;

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let store = store.clone();
            let answers = answers.clone();
            tokio::spawn(async move { submit_exam(&*store, student_id, exam_id, &answers).await })
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

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM exam_results WHERE student_id = $1 AND exam_id = $2",
    )
    .bind(student_id)
    .bind(exam_id)
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(count, 1);

    let student = store.find_student(student_id).await.unwrap().unwrap();
    assert_eq!(student.exam_results.len(), 1);
}
