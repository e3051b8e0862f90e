//! # Instructor Endpoints
//!
//! Course, module and content management under `/api/manage`. Every handler
//! takes an [`Instructor`]; objects owned by someone else answer 404.

use super::{
    AppState,
    auth::Instructor,
    error::ApiError,
    types::{
        ContentResponse, CourseRequest, CourseResponse, CourseUpdateRequest, ItemRequest,
        ModuleRequest, ModuleResponse, ModuleUpdateRequest, ModuleWithContentsResponse,
        SavedResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use educa_core::{
    ContentId, CourseId, CourseUpdate, EducaError, ItemKind, ModuleContents, ModuleId,
    ModuleUpdate, NewCourse, NewModule, Reorder, SubjectId, catalog,
};
use std::collections::BTreeMap;

// =============================================================================
// COURSES
// =============================================================================

/// The caller's own courses.
pub async fn list_own_courses_handler(
    State(state): State<AppState>,
    Instructor(user): Instructor,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = state.store.courses_by_owner(user.id)?;
    let summaries = catalog::course_summaries(&state.store, courses)?;
    Ok(Json(
        summaries.into_iter().map(CourseResponse::from).collect(),
    ))
}

pub async fn create_course_handler(
    State(state): State<AppState>,
    Instructor(user): Instructor,
    Json(request): Json<CourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    let course = state.store.create_course(
        user.id,
        NewCourse {
            subject: SubjectId(request.subject),
            title: request.title,
            slug: request.slug,
            overview: request.overview,
        },
    )?;
    tracing::info!(event = "course_created", course_id = %course.id, owner = %user.id);
    state.cache.invalidate();
    let summary = catalog::course_summary(&state.store, course)?;
    Ok((StatusCode::CREATED, Json(CourseResponse::from(summary))))
}

pub async fn update_course_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Instructor(user): Instructor,
    Json(request): Json<CourseUpdateRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = state.store.update_course(
        user.id,
        CourseId(id),
        CourseUpdate {
            subject: request.subject.map(SubjectId),
            title: request.title,
            slug: request.slug,
            overview: request.overview,
        },
    )?;
    state.cache.invalidate();
    let summary = catalog::course_summary(&state.store, course)?;
    Ok(Json(CourseResponse::from(summary)))
}

pub async fn delete_course_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Instructor(user): Instructor,
) -> Result<StatusCode, ApiError> {
    state.store.delete_course(user.id, CourseId(id))?;
    tracing::info!(event = "course_deleted", course_id = id, owner = %user.id);
    state.cache.invalidate();
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// MODULES
// =============================================================================

pub async fn list_modules_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Instructor(user): Instructor,
) -> Result<Json<Vec<ModuleResponse>>, ApiError> {
    let course = state.store.owned_course(user.id, CourseId(id))?;
    let modules = state.store.modules(course.id)?;
    Ok(Json(modules.into_iter().map(ModuleResponse::from).collect()))
}

pub async fn create_module_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Instructor(user): Instructor,
    Json(request): Json<ModuleRequest>,
) -> Result<(StatusCode, Json<ModuleResponse>), ApiError> {
    let module = state.store.add_module(
        user.id,
        CourseId(id),
        NewModule {
            title: request.title,
            description: request.description,
            order: request.order,
        },
    )?;
    state.cache.invalidate();
    Ok((StatusCode::CREATED, Json(ModuleResponse::from(module))))
}

pub async fn update_module_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Instructor(user): Instructor,
    Json(request): Json<ModuleUpdateRequest>,
) -> Result<Json<ModuleResponse>, ApiError> {
    let module = state.store.update_module(
        user.id,
        ModuleId(id),
        ModuleUpdate {
            title: request.title,
            description: request.description,
            order: request.order,
        },
    )?;
    state.cache.invalidate();
    Ok(Json(ModuleResponse::from(module)))
}

pub async fn delete_module_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Instructor(user): Instructor,
) -> Result<StatusCode, ApiError> {
    state.store.delete_module(user.id, ModuleId(id))?;
    state.cache.invalidate();
    Ok(StatusCode::NO_CONTENT)
}

/// Body: `{"<module id>": order, ...}`.
pub async fn reorder_modules_handler(
    State(state): State<AppState>,
    Instructor(user): Instructor,
    Json(request): Json<BTreeMap<u64, u32>>,
) -> Result<Json<SavedResponse>, ApiError> {
    let batch = Reorder::new(
        request
            .into_iter()
            .map(|(id, order)| (ModuleId(id), order))
            .collect(),
    )?;
    let updated = state.store.reorder_modules(user.id, &batch)?;
    tracing::debug!(event = "modules_reordered", requested = batch.len(), updated);
    state.cache.invalidate();
    Ok(Json(SavedResponse::ok()))
}

// =============================================================================
// CONTENTS
// =============================================================================

/// A module of the caller's with its contents.
pub async fn module_contents_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Instructor(user): Instructor,
) -> Result<Json<ModuleWithContentsResponse>, ApiError> {
    let module = state.store.owned_module(user.id, ModuleId(id))?;
    let contents = state.store.contents(module.id)?;
    Ok(Json(ModuleWithContentsResponse::from(ModuleContents {
        module,
        contents,
    })))
}

/// Create an item of `kind` (text, image, file or video) in a module.
pub async fn create_content_handler(
    State(state): State<AppState>,
    Path((id, kind)): Path<(u64, String)>,
    Instructor(user): Instructor,
    Json(request): Json<ItemRequest>,
) -> Result<(StatusCode, Json<ContentResponse>), ApiError> {
    let kind = ItemKind::from_name(&kind)?;
    let item = request.into_new_item(kind)?;
    let content = state.store.add_content(user.id, ModuleId(id), item)?;
    tracing::info!(
        event = "content_created",
        content_id = %content.id,
        module_id = id,
        kind = %kind
    );
    Ok((StatusCode::CREATED, Json(ContentResponse::from(content))))
}

pub async fn update_content_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Instructor(user): Instructor,
    Json(request): Json<ItemRequest>,
) -> Result<Json<ContentResponse>, ApiError> {
    let id = ContentId(id);
    // The stored kind decides which body field applies; ownership is
    // checked by the store.
    let kind = state
        .store
        .content(id)?
        .map(|content| content.item.kind())
        .ok_or_else(|| EducaError::not_found("content", id))?;
    let update = request.into_update(kind)?;
    let content = state.store.update_content(user.id, id, update)?;
    Ok(Json(ContentResponse::from(content)))
}

pub async fn delete_content_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Instructor(user): Instructor,
) -> Result<StatusCode, ApiError> {
    state.store.delete_content(user.id, ContentId(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body: `{"<content id>": order, ...}`.
pub async fn reorder_contents_handler(
    State(state): State<AppState>,
    Instructor(user): Instructor,
    Json(request): Json<BTreeMap<u64, u32>>,
) -> Result<Json<SavedResponse>, ApiError> {
    let batch = Reorder::new(
        request
            .into_iter()
            .map(|(id, order)| (ContentId(id), order))
            .collect(),
    )?;
    let updated = state.store.reorder_contents(user.id, &batch)?;
    tracing::debug!(event = "contents_reordered", requested = batch.len(), updated);
    Ok(Json(SavedResponse::ok()))
}
