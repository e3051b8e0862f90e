//! # Admin Endpoints
//!
//! Mounted under `/api/admin` only when an API key is configured; guarded by
//! [`super::auth::api_key_auth_middleware`].

use super::{
    AppState,
    error::ApiError,
    types::{
        CreateUserRequest, MessageListQuery, MessageResponse, SubjectRequest, SubjectResponse,
        UserResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use educa_core::{
    CourseId, MessageFilter, Page, PageRequest, Role, Stats, SubjectId, UserId, catalog,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub async fn create_subject_handler(
    State(state): State<AppState>,
    Json(request): Json<SubjectRequest>,
) -> Result<(StatusCode, Json<SubjectResponse>), ApiError> {
    let subject = state
        .store
        .create_subject(&request.title, request.slug.as_deref())?;
    tracing::info!(event = "subject_created", subject_id = %subject.id, slug = %subject.slug);
    state.cache.invalidate();
    let summary = catalog::subject_summary(&state.store, subject)?;
    Ok((StatusCode::CREATED, Json(SubjectResponse::from(summary))))
}

/// Delete a subject with all of its courses. 409 if any has chat history.
pub async fn delete_subject_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_subject(SubjectId(id))?;
    tracing::info!(event = "subject_deleted", subject_id = id);
    state.cache.invalidate();
    Ok(StatusCode::NO_CONTENT)
}

/// Create an account with any role.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let role = Role::parse(&request.role)?;
    let store = Arc::clone(&state.store);
    let user = tokio::task::spawn_blocking(move || {
        store.create_user(&request.username, &request.password, role)
    })
    .await??;
    tracing::info!(event = "user_created", user_id = %user.id, role = role.as_str());
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Chat history across rooms, newest first.
pub async fn list_messages_handler(
    State(state): State<AppState>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<Page<MessageResponse>>, ApiError> {
    let filter = MessageFilter {
        course: query.course.map(CourseId),
        search: query.search.clone(),
        since: query.since,
        until: query.until,
    };
    let messages = state.store.messages(&filter)?;

    let mut base_params = Vec::new();
    if let Some(course) = query.course {
        base_params.push(format!("course={course}"));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        base_params.push(format!("search={}", encode_query_value(search)));
    }
    if let Some(since) = query.since {
        base_params.push(format!("since={}", encode_query_value(&since.to_rfc3339())));
    }
    if let Some(until) = query.until {
        base_params.push(format!("until={}", encode_query_value(&until.to_rfc3339())));
    }
    let base = if base_params.is_empty() {
        "/api/admin/messages".to_string()
    } else {
        format!("/api/admin/messages?{}", base_params.join("&"))
    };

    let request = PageRequest {
        page: query.page,
        page_size: query.page_size,
    };
    let page = Page::paginate(messages, request, &base)?;

    let mut usernames: BTreeMap<UserId, String> = BTreeMap::new();
    for message in &page.results {
        if !usernames.contains_key(&message.user) {
            let name = state
                .store
                .user(message.user)?
                .map(|u| u.username)
                .unwrap_or_default();
            usernames.insert(message.user, name);
        }
    }
    Ok(Json(page.map(|message| {
        let username = usernames.get(&message.user).cloned().unwrap_or_default();
        MessageResponse::new(message, username)
    })))
}

pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<Stats>, ApiError> {
    Ok(Json(state.store.stats()?))
}

/// Percent-encode a query value for page links.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================
