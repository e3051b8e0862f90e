//! # educa-core
//!
//! The course catalog engine for Educa - THE LOGIC.
//!
//! Instructors file courses under subjects, split them into ordered modules
//! and attach ordered content items (text, image, file, video). Students
//! enroll in courses and chat in per-course rooms whose history is kept here.
//!
//! ## Architectural Constraints
//!
//! - Pure synchronous Rust: NO async, NO network dependencies
//! - One redb write transaction per mutating operation
//! - Listings are deterministic: explicit `(order, id)` or `(created, id)` keys
//! - The HTTP layer talks only to [`Store`] and the [`catalog`] views

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod ordering;
pub mod pagination;
pub mod password;
pub mod primitives;
pub mod render;
pub mod storage;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Content, ContentId, Course, CourseId, EducaError, Item, ItemBody, ItemKind, Message,
    MessageId, Module, ModuleId, Role, Subject, SubjectId, User, UserId,
};

// =============================================================================
// RE-EXPORTS: Storage and Views
// =============================================================================

pub use catalog::{
    CourseContents, CourseSummary, ModuleContents, StudentCourseView, SubjectSummary,
};
pub use ordering::{OrderField, Reorder};
pub use pagination::{Page, PageRequest};
pub use storage::{
    CourseUpdate, ItemUpdate, MessageFilter, ModuleUpdate, NewCourse, NewItem, NewModule, Stats,
    Store,
};
