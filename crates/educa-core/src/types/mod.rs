//! # Core Type Definitions
//!
//! This module contains all records stored by the Educa catalog:
//! - Identifiers (`UserId`, `SubjectId`, `CourseId`, `ModuleId`, `ContentId`, `MessageId`)
//! - Accounts (`User`, `Role`)
//! - Catalog records (`Subject`, `Course`, `Module`, `Content`, `Item`, `ItemBody`)
//! - Chat history (`Message`)
//! - Error types (`EducaError`)
//!
//! Records are plain serde structs so they can be postcard-encoded into redb.
//! JSON shapes for the HTTP API live in the app crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a registered account.
    UserId
);
define_id!(
    /// Identifier of a subject category.
    SubjectId
);
define_id!(
    /// Identifier of a course.
    CourseId
);
define_id!(
    /// Identifier of a module inside a course.
    ModuleId
);
define_id!(
    /// Identifier of a content slot inside a module.
    ContentId
);
define_id!(
    /// Identifier of a persisted chat message.
    MessageId
);

// =============================================================================
// ACCOUNTS
// =============================================================================

/// What an account is allowed to do.
///
/// Students browse, enroll and chat. Instructors can additionally create and
/// manage their own courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Instructor,
}

impl Role {
    /// Lower-case name used on the wire and in the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Instructor => "instructor",
        }
    }

    /// Parse a role name (case-insensitive).
    pub fn parse(name: &str) -> Result<Self, EducaError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "instructor" => Ok(Self::Instructor),
            other => Err(EducaError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Encoded password hash, see [`crate::password`].
    pub password_hash: String,
    pub role: Role,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Whether this account may create and manage courses.
    #[must_use]
    pub fn is_instructor(&self) -> bool {
        self.role == Role::Instructor
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// A subject category grouping courses. Listed alphabetically by title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub title: String,
    pub slug: String,
}

/// A course created by an instructor under a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub owner: UserId,
    pub subject: SubjectId,
    pub title: String,
    pub slug: String,
    pub overview: String,
    pub created: DateTime<Utc>,
}

/// A unit of a course. `order` is assigned per course by [`crate::ordering`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub course: CourseId,
    pub title: String,
    pub description: String,
    pub order: u32,
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.order, self.title)
    }
}

/// Kind of a content item, as named in URLs (`text`, `image`, `file`, `video`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Text,
    Image,
    File,
    Video,
}

impl ItemKind {
    /// All kinds, in the order they are offered to instructors.
    pub const ALL: [Self; 4] = [Self::Text, Self::Image, Self::File, Self::Video];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
            Self::Video => "video",
        }
    }

    /// Resolve a model name from a URL segment. Anything else is rejected.
    pub fn from_name(name: &str) -> Result<Self, EducaError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| EducaError::Validation(format!("unknown content kind '{name}'")))
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemBody {
    Text { content: String },
    Image { file: String },
    File { file: String },
    Video { url: String },
}

impl ItemBody {
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        match self {
            Self::Text { .. } => ItemKind::Text,
            Self::Image { .. } => ItemKind::Image,
            Self::File { .. } => ItemKind::File,
            Self::Video { .. } => ItemKind::Video,
        }
    }
}

/// A piece of course material owned by the instructor who wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub owner: UserId,
    pub title: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub body: ItemBody,
}

impl Item {
    #[must_use]
    pub const fn kind(&self) -> ItemKind {
        self.body.kind()
    }
}

/// A position inside a module holding exactly one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    pub module: ModuleId,
    pub order: u32,
    pub item: Item,
}

// =============================================================================
// CHAT
// =============================================================================

/// A chat message posted in a course room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub user: UserId,
    pub course: CourseId,
    pub content: String,
    pub sent_on: DateTime<Utc>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Educa catalog.
///
/// - No silent failures
/// - Use `Result<T, EducaError>` for fallible operations
/// - The catalog never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum EducaError {
    /// Input failed validation (lengths, slugs, urls, passwords).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The requested record does not exist (or is not visible to the caller).
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A unique constraint would be violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller is not allowed to perform this operation.
    #[error("Forbidden")]
    Forbidden,

    /// Deletion refused because other records still reference the target.
    #[error("Protected: {0}")]
    Protected(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A storage error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl EducaError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
