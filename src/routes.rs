// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, exam, student},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, admin, students).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store and config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/admin/login", post(auth::admin_login))
        .route("/student/login", post(auth::student_login));

    let admin_routes = Router::new()
        .route(
            "/students",
            get(admin::list_students).post(admin::create_student),
        )
        .route(
            "/students/{id}",
            get(admin::get_student).put(admin::update_student),
        )
        .route("/students/{id}/status", put(admin::update_student_status))
        .route("/students/{id}/results", get(admin::list_student_results))
        .route("/exams", post(admin::create_exam))
        .route("/exams/{id}", get(admin::get_exam))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let student_routes = Router::new()
        .route(
            "/profile",
            get(student::get_profile).put(student::update_profile),
        )
        .route("/results", get(student::list_my_results))
        .route("/exams/{id}", get(exam::get_exam_paper))
        .route("/exams/{id}/submit", post(exam::submit_exam))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/students", student_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
