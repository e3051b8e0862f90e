//! # API Endpoint Handlers
//!
//! Public catalog browsing, registration and the student endpoints.

use super::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    types::{
        CourseContentsResponse, CourseListQuery, CourseResponse, EnrollResponse, HealthResponse,
        PageQuery, RegisterRequest, StudentCourseQuery, StudentCourseResponse, SubjectResponse,
        UserResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use educa_core::{
    CourseId, EducaError, ModuleId, Page, PageRequest, Role, SubjectId, catalog,
};
use std::sync::Arc;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Register a student account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let store = Arc::clone(&state.store);
    let user = tokio::task::spawn_blocking(move || {
        store.create_user(&request.username, &request.password, Role::Student)
    })
    .await??;
    tracing::info!(event = "user_registered", user_id = %user.id, username = %user.username);
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

// =============================================================================
// SUBJECTS
// =============================================================================

pub async fn list_subjects_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<SubjectResponse>>, ApiError> {
    let summaries = state
        .cache
        .subjects(|| catalog::subject_summaries(&state.store))
        .await?;
    let items: Vec<SubjectResponse> = summaries
        .iter()
        .cloned()
        .map(SubjectResponse::from)
        .collect();
    let page = Page::paginate(items, PageRequest::from(&query), "/api/subjects")?;
    Ok(Json(page))
}

pub async fn get_subject_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SubjectResponse>, ApiError> {
    let id = SubjectId(id);
    let subject = state
        .store
        .subject(id)?
        .ok_or_else(|| EducaError::not_found("subject", id))?;
    let summary = catalog::subject_summary(&state.store, subject)?;
    Ok(Json(SubjectResponse::from(summary)))
}

// =============================================================================
// COURSES
// =============================================================================

/// Courses, newest first, optionally of one subject (by slug).
pub async fn list_courses_handler(
    State(state): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> Result<Json<Page<CourseResponse>>, ApiError> {
    let (subject, base) = match query.subject.as_deref() {
        Some(slug) => {
            let subject = state
                .store
                .subject_by_slug(slug)?
                .ok_or_else(|| EducaError::not_found("subject", slug))?;
            (Some(subject.id), format!("/api/courses?subject={slug}"))
        }
        None => (None, "/api/courses".to_string()),
    };

    let summaries = state
        .cache
        .courses(subject, || {
            let courses = match subject {
                Some(id) => state.store.courses_by_subject(id)?,
                None => state.store.courses()?,
            };
            catalog::course_summaries(&state.store, courses)
        })
        .await?;

    let items: Vec<CourseResponse> = summaries
        .iter()
        .cloned()
        .map(CourseResponse::from)
        .collect();
    let request = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    Ok(Json(Page::paginate(items, request, &base)?))
}

pub async fn get_course_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<CourseResponse>, ApiError> {
    let id = CourseId(id);
    let course = state
        .store
        .course(id)?
        .ok_or_else(|| EducaError::not_found("course", id))?;
    let summary = catalog::course_summary(&state.store, course)?;
    Ok(Json(CourseResponse::from(summary)))
}

// =============================================================================
// STUDENTS
// =============================================================================

pub async fn enroll_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    AuthUser(user): AuthUser,
) -> Result<Json<EnrollResponse>, ApiError> {
    let course = CourseId(id);
    if state.store.enroll(course, user.id)? {
        tracing::info!(event = "enrolled", course_id = %course, user_id = %user.id);
        // Popular-course counts changed.
        state.cache.invalidate();
    }
    Ok(Json(EnrollResponse { enrolled: true }))
}

/// Every module and content of a course, for its students.
pub async fn course_contents_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    AuthUser(user): AuthUser,
) -> Result<Json<CourseContentsResponse>, ApiError> {
    let course = CourseId(id);
    if state.store.course(course)?.is_none() {
        return Err(EducaError::not_found("course", course).into());
    }
    if !state.store.is_enrolled(course, user.id)? {
        return Err(EducaError::Forbidden.into());
    }
    let contents = catalog::course_contents(&state.store, course)?;
    Ok(Json(CourseContentsResponse::from(contents)))
}

/// Courses the caller has joined.
pub async fn student_courses_handler(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let joined = state.store.courses_joined(user.id)?;
    let summaries = catalog::course_summaries(&state.store, joined)?;
    Ok(Json(
        summaries.into_iter().map(CourseResponse::from).collect(),
    ))
}

/// One joined course with a module opened (`?module=ID`, else the first).
pub async fn student_course_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<StudentCourseQuery>,
    AuthUser(user): AuthUser,
) -> Result<Json<StudentCourseResponse>, ApiError> {
    let view = catalog::student_course(
        &state.store,
        user.id,
        CourseId(id),
        query.module.map(ModuleId),
    )?;
    Ok(Json(StudentCourseResponse::from(view)))
}
