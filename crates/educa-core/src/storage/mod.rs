//! # redb-backed Catalog Storage
//!
//! `Store` keeps every Educa record in one redb database:
//! - ACID transactions (one write transaction per mutating operation)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Records are postcard-encoded and keyed by their numeric id. Parent/child
//! relations are kept in `(parent, child)` index tables so that children of
//! one parent are a single range scan.

mod accounts;
mod chat;
mod contents;
mod courses;
mod enrollment;
mod subjects;

pub use chat::MessageFilter;
pub use contents::{ItemUpdate, NewItem};
pub use courses::{CourseUpdate, ModuleUpdate, NewCourse, NewModule};

use crate::types::EducaError;
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, Table, TableDefinition,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

// =============================================================================
// TABLES
// =============================================================================

/// UserId -> serialized User
pub(crate) const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");
/// username -> UserId
pub(crate) const USERNAMES: TableDefinition<&str, u64> = TableDefinition::new("usernames");

/// SubjectId -> serialized Subject
pub(crate) const SUBJECTS: TableDefinition<u64, &[u8]> = TableDefinition::new("subjects");
/// subject slug -> SubjectId
pub(crate) const SUBJECT_SLUGS: TableDefinition<&str, u64> = TableDefinition::new("subject_slugs");

/// CourseId -> serialized Course
pub(crate) const COURSES: TableDefinition<u64, &[u8]> = TableDefinition::new("courses");
/// course slug -> CourseId
pub(crate) const COURSE_SLUGS: TableDefinition<&str, u64> = TableDefinition::new("course_slugs");
/// (SubjectId, CourseId)
pub(crate) const SUBJECT_COURSES: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("subject_courses");
/// (owner UserId, CourseId)
pub(crate) const OWNER_COURSES: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("owner_courses");

/// ModuleId -> serialized Module
pub(crate) const MODULES: TableDefinition<u64, &[u8]> = TableDefinition::new("modules");
/// (CourseId, ModuleId)
pub(crate) const COURSE_MODULES: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("course_modules");

/// ContentId -> serialized Content (with its item)
pub(crate) const CONTENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("contents");
/// (ModuleId, ContentId)
pub(crate) const MODULE_CONTENTS: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("module_contents");

/// (CourseId, student UserId) -> enrollment time (unix millis)
pub(crate) const ENROLLMENTS: TableDefinition<(u64, u64), i64> =
    TableDefinition::new("enrollments");
/// (student UserId, CourseId)
pub(crate) const STUDENT_COURSES: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("student_courses");

/// MessageId -> serialized Message
pub(crate) const MESSAGES: TableDefinition<u64, &[u8]> = TableDefinition::new("messages");
/// (CourseId, MessageId)
pub(crate) const COURSE_MESSAGES: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("course_messages");

/// Id counters: key string -> next id
pub(crate) const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

// =============================================================================
// STORE
// =============================================================================

/// The Educa catalog database.
///
/// All operations take `&self`; redb serializes writers internally, so a
/// `Store` can be shared behind an `Arc` by the HTTP layer.
pub struct Store {
    db: Database,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

/// Record counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub users: u64,
    pub subjects: u64,
    pub courses: u64,
    pub modules: u64,
    pub contents: u64,
    pub enrollments: u64,
    pub messages: u64,
}

impl Store {
    /// Open or create a catalog database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EducaError> {
        let db = Database::create(path.as_ref()).map_err(io)?;
        Self::init(db)
    }

    /// Create a volatile catalog kept entirely in memory.
    pub fn in_memory() -> Result<Self, EducaError> {
        let db = redb::Builder::new()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(io)?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, EducaError> {
        let write_txn = db.begin_write().map_err(io)?;
        {
            write_txn.open_table(USERS).map_err(io)?;
            write_txn.open_table(USERNAMES).map_err(io)?;
            write_txn.open_table(SUBJECTS).map_err(io)?;
            write_txn.open_table(SUBJECT_SLUGS).map_err(io)?;
            write_txn.open_table(COURSES).map_err(io)?;
            write_txn.open_table(COURSE_SLUGS).map_err(io)?;
            write_txn.open_table(SUBJECT_COURSES).map_err(io)?;
            write_txn.open_table(OWNER_COURSES).map_err(io)?;
            write_txn.open_table(MODULES).map_err(io)?;
            write_txn.open_table(COURSE_MODULES).map_err(io)?;
            write_txn.open_table(CONTENTS).map_err(io)?;
            write_txn.open_table(MODULE_CONTENTS).map_err(io)?;
            write_txn.open_table(ENROLLMENTS).map_err(io)?;
            write_txn.open_table(STUDENT_COURSES).map_err(io)?;
            write_txn.open_table(MESSAGES).map_err(io)?;
            write_txn.open_table(COURSE_MESSAGES).map_err(io)?;
            write_txn.open_table(METADATA).map_err(io)?;
        }
        write_txn.commit().map_err(io)?;
        Ok(Self { db })
    }

    /// Count records in every table.
    pub fn stats(&self) -> Result<Stats, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        Ok(Stats {
            users: read_txn.open_table(USERS).map_err(io)?.len().map_err(io)?,
            subjects: read_txn.open_table(SUBJECTS).map_err(io)?.len().map_err(io)?,
            courses: read_txn.open_table(COURSES).map_err(io)?.len().map_err(io)?,
            modules: read_txn.open_table(MODULES).map_err(io)?.len().map_err(io)?,
            contents: read_txn.open_table(CONTENTS).map_err(io)?.len().map_err(io)?,
            enrollments: read_txn
                .open_table(ENROLLMENTS)
                .map_err(io)?
                .len()
                .map_err(io)?,
            messages: read_txn.open_table(MESSAGES).map_err(io)?.len().map_err(io)?,
        })
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Map any redb error into `EducaError::Io`.
pub(crate) fn io<E: std::fmt::Display>(e: E) -> EducaError {
    EducaError::Io(e.to_string())
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, EducaError> {
    postcard::to_allocvec(value).map_err(|e| EducaError::Serialization(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EducaError> {
    postcard::from_bytes(bytes).map_err(|e| EducaError::Serialization(e.to_string()))
}

/// Load one record by id.
pub(crate) fn load<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> Result<Option<T>, EducaError> {
    match table.get(id).map_err(io)? {
        Some(data) => decode(data.value()).map(Some),
        None => Ok(None),
    }
}

/// Load every record of a table in id order.
pub(crate) fn load_all<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
) -> Result<Vec<T>, EducaError> {
    let mut records = Vec::new();
    for entry in table.iter().map_err(io)? {
        let (_, value) = entry.map_err(io)?;
        records.push(decode(value.value())?);
    }
    Ok(records)
}

/// Encode and store one record.
pub(crate) fn save<T: Serialize>(
    table: &mut Table<'_, u64, &'static [u8]>,
    id: u64,
    record: &T,
) -> Result<(), EducaError> {
    let bytes = encode(record)?;
    table.insert(id, bytes.as_slice()).map_err(io)?;
    Ok(())
}

/// Child ids of `parent` in a `(parent, child)` index table, ascending.
pub(crate) fn children<V: redb::Value + 'static>(
    table: &impl ReadableTable<(u64, u64), V>,
    parent: u64,
) -> Result<Vec<u64>, EducaError> {
    let mut ids = Vec::new();
    for entry in table.range((parent, 0u64)..=(parent, u64::MAX)).map_err(io)? {
        let (key, _) = entry.map_err(io)?;
        let (_parent, child) = key.value();
        ids.push(child);
    }
    Ok(ids)
}

/// Allocate the next id for a record kind. Ids start at 1.
pub(crate) fn allocate(
    meta: &mut Table<'_, &'static str, u64>,
    counter: &str,
) -> Result<u64, EducaError> {
    let next = meta.get(counter).map_err(io)?.map(|v| v.value()).unwrap_or(1);
    meta.insert(counter, next.saturating_add(1)).map_err(io)?;
    Ok(next)
}

// =============================================================================
// TESTS
// =============================================================================
