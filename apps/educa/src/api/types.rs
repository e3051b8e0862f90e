//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API and the chat
//! socket. Stored records never go on the wire directly.

use chrono::{DateTime, Utc};
use educa_core::{
    Content, Course, CourseContents, CourseSummary, EducaError, ItemBody, ItemKind, ItemUpdate,
    Message, Module, ModuleContents, NewItem, PageRequest, Role, StudentCourseView,
    SubjectSummary, User,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH / ERRORS
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// =============================================================================
// ACCOUNTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Account creation by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    Role::Student.as_str().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
    pub role: String,
    pub date_joined: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.0,
            username: user.username,
            role: user.role.as_str().to_string(),
            date_joined: user.date_joined,
        }
    }
}

// =============================================================================
// SUBJECTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRequest {
    pub title: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectResponse {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub total_courses: usize,
    pub popular_courses: Vec<String>,
}

impl From<SubjectSummary> for SubjectResponse {
    fn from(summary: SubjectSummary) -> Self {
        Self {
            id: summary.subject.id.0,
            title: summary.subject.title,
            slug: summary.subject.slug,
            total_courses: summary.total_courses,
            popular_courses: summary.popular_courses,
        }
    }
}

// =============================================================================
// COURSES AND MODULES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleResponse {
    pub id: u64,
    pub order: u32,
    pub title: String,
    pub description: String,
}

impl From<Module> for ModuleResponse {
    fn from(module: Module) -> Self {
        Self {
            id: module.id.0,
            order: module.order,
            title: module.title,
            description: module.description,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseResponse {
    pub id: u64,
    pub subject: u64,
    pub title: String,
    pub slug: String,
    pub overview: String,
    pub created: DateTime<Utc>,
    pub owner: u64,
    pub total_modules: usize,
    pub modules: Vec<ModuleResponse>,
}

impl From<CourseSummary> for CourseResponse {
    fn from(summary: CourseSummary) -> Self {
        let CourseSummary {
            course,
            total_modules,
            modules,
        } = summary;
        Self {
            id: course.id.0,
            subject: course.subject.0,
            title: course.title,
            slug: course.slug,
            overview: course.overview,
            created: course.created,
            owner: course.owner.0,
            total_modules,
            modules: modules.into_iter().map(ModuleResponse::from).collect(),
        }
    }
}

/// Just enough of a course to label something that belongs to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRef {
    pub id: u64,
    pub title: String,
    pub slug: String,
}

impl From<Course> for CourseRef {
    fn from(course: Course) -> Self {
        Self {
            id: course.id.0,
            title: course.title,
            slug: course.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseRequest {
    pub subject: u64,
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub overview: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseUpdateRequest {
    pub subject: Option<u64>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub overview: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollResponse {
    pub enrolled: bool,
}

/// Reply to a reorder batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedResponse {
    pub saved: String,
}

impl SavedResponse {
    pub fn ok() -> Self {
        Self {
            saved: "OK".to_string(),
        }
    }
}

// =============================================================================
// CONTENTS
// =============================================================================

/// Item fields for any kind; which ones are required depends on the kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub file: Option<String>,
    pub url: Option<String>,
}

impl ItemRequest {
    /// Build a new item of `kind`.
    pub fn into_new_item(self, kind: ItemKind) -> Result<NewItem, EducaError> {
        let title = self
            .title
            .clone()
            .ok_or_else(|| missing("title"))?;
        let body = self.body(kind)?.ok_or_else(|| missing(body_field(kind)))?;
        Ok(NewItem { title, body })
    }

    /// Build an update for an existing item of `kind`.
    pub fn into_update(self, kind: ItemKind) -> Result<ItemUpdate, EducaError> {
        let body = self.body(kind)?;
        Ok(ItemUpdate {
            title: self.title,
            body,
        })
    }

    /// The body for `kind`, if its field was sent. Fields of other kinds are
    /// rejected so a typo does not silently do nothing.
    fn body(&self, kind: ItemKind) -> Result<Option<ItemBody>, EducaError> {
        let expected = body_field(kind);
        for (name, present) in [
            ("content", self.content.is_some()),
            ("file", self.file.is_some()),
            ("url", self.url.is_some()),
        ] {
            if present && name != expected {
                return Err(EducaError::Validation(format!(
                    "field '{name}' does not apply to {kind} items"
                )));
            }
        }
        Ok(match kind {
            ItemKind::Text => self.content.clone().map(|content| ItemBody::Text { content }),
            ItemKind::Image => self.file.clone().map(|file| ItemBody::Image { file }),
            ItemKind::File => self.file.clone().map(|file| ItemBody::File { file }),
            ItemKind::Video => self.url.clone().map(|url| ItemBody::Video { url }),
        })
    }
}

const fn body_field(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Text => "content",
        ItemKind::Image | ItemKind::File => "file",
        ItemKind::Video => "url",
    }
}

fn missing(field: &str) -> EducaError {
    EducaError::Validation(format!("{field} is required"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub id: u64,
    pub order: u32,
    pub kind: String,
    pub title: String,
    /// Rendered HTML fragment.
    pub item: String,
}

impl From<Content> for ContentResponse {
    fn from(content: Content) -> Self {
        Self {
            id: content.id.0,
            order: content.order,
            kind: content.item.kind().as_str().to_string(),
            item: content.item.render(),
            title: content.item.title,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleWithContentsResponse {
    pub id: u64,
    pub order: u32,
    pub title: String,
    pub description: String,
    pub contents: Vec<ContentResponse>,
}

impl From<ModuleContents> for ModuleWithContentsResponse {
    fn from(nested: ModuleContents) -> Self {
        let ModuleContents { module, contents } = nested;
        Self {
            id: module.id.0,
            order: module.order,
            title: module.title,
            description: module.description,
            contents: contents.into_iter().map(ContentResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseContentsResponse {
    pub id: u64,
    pub subject: u64,
    pub title: String,
    pub slug: String,
    pub overview: String,
    pub created: DateTime<Utc>,
    pub owner: u64,
    pub modules: Vec<ModuleWithContentsResponse>,
}

impl From<CourseContents> for CourseContentsResponse {
    fn from(nested: CourseContents) -> Self {
        let CourseContents { course, modules } = nested;
        Self {
            id: course.id.0,
            subject: course.subject.0,
            title: course.title,
            slug: course.slug,
            overview: course.overview,
            created: course.created,
            owner: course.owner.0,
            modules: modules
                .into_iter()
                .map(ModuleWithContentsResponse::from)
                .collect(),
        }
    }
}

/// A joined course as a student sees it, with one module opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentCourseResponse {
    pub course: CourseRef,
    pub modules: Vec<ModuleResponse>,
    pub module: Option<ModuleWithContentsResponse>,
}

impl From<StudentCourseView> for StudentCourseResponse {
    fn from(view: StudentCourseView) -> Self {
        Self {
            course: CourseRef::from(view.course),
            modules: view.modules.into_iter().map(ModuleResponse::from).collect(),
            module: view.module.map(ModuleWithContentsResponse::from),
        }
    }
}

// =============================================================================
// CHAT
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: u64,
    pub course: u64,
    /// Username of the author.
    pub user: String,
    pub content: String,
    pub sent_on: DateTime<Utc>,
}

impl MessageResponse {
    pub fn new(message: Message, username: String) -> Self {
        Self {
            id: message.id.0,
            course: message.course.0,
            user: username,
            content: message.content,
            sent_on: message.sent_on,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoomResponse {
    pub course: CourseRef,
    /// Oldest first.
    pub latest_messages: Vec<MessageResponse>,
}

/// A frame sent by a chat client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    pub message: String,
}

/// A frame sent to chat clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatFrame {
    /// Broadcast to the whole room.
    ChatMessage {
        message: String,
        user: String,
        /// RFC 3339
        datetime: String,
    },
    /// Sent only to the client whose frame was rejected.
    Error { error: String },
}

// =============================================================================
// QUERIES
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl From<&PageQuery> for PageRequest {
    fn from(query: &PageQuery) -> Self {
        Self {
            page: query.page,
            page_size: query.page_size,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseListQuery {
    /// Subject slug.
    pub subject: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentCourseQuery {
    pub module: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageListQuery {
    pub course: Option<u64>,
    pub search: Option<String>,
    /// RFC 3339 lower bound on `sent_on`, inclusive.
    pub since: Option<DateTime<Utc>>,
    /// RFC 3339 upper bound on `sent_on`, exclusive.
    pub until: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// =============================================================================
// TESTS
// =============================================================================
