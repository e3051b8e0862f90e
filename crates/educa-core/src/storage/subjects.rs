//! Subjects: the top-level categories courses are filed under.

use super::courses::remove_course;
use super::{
    METADATA, SUBJECT_COURSES, SUBJECT_SLUGS, SUBJECTS, Store, allocate, children, io, load,
    load_all, save,
};
use crate::primitives::MAX_TITLE_LENGTH;
use crate::types::{CourseId, EducaError, Subject, SubjectId};
use crate::validation;
use redb::{ReadableDatabase, ReadableTable};

impl Store {
    /// Create a subject. Without a slug one is derived from the title.
    pub fn create_subject(&self, title: &str, slug: Option<&str>) -> Result<Subject, EducaError> {
        let title = validation::title("title", title, MAX_TITLE_LENGTH)?;
        let slug = validation::slug_or_derive(slug, &title)?;

        let write_txn = self.db.begin_write().map_err(io)?;
        let subject = {
            let mut slugs = write_txn.open_table(SUBJECT_SLUGS).map_err(io)?;
            if slugs.get(slug.as_str()).map_err(io)?.is_some() {
                return Err(EducaError::Conflict(format!(
                    "subject with slug '{slug}' already exists"
                )));
            }
            let mut meta = write_txn.open_table(METADATA).map_err(io)?;
            let id = SubjectId(allocate(&mut meta, "next_subject_id")?);
            let subject = Subject { id, title, slug };

            let mut subjects = write_txn.open_table(SUBJECTS).map_err(io)?;
            save(&mut subjects, id.0, &subject)?;
            slugs.insert(subject.slug.as_str(), id.0).map_err(io)?;
            subject
        };
        write_txn.commit().map_err(io)?;
        Ok(subject)
    }

    pub fn subject(&self, id: SubjectId) -> Result<Option<Subject>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let subjects = read_txn.open_table(SUBJECTS).map_err(io)?;
        load(&subjects, id.0)
    }

    pub fn subject_by_slug(&self, slug: &str) -> Result<Option<Subject>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let slugs = read_txn.open_table(SUBJECT_SLUGS).map_err(io)?;
        let Some(id) = slugs.get(slug).map_err(io)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let subjects = read_txn.open_table(SUBJECTS).map_err(io)?;
        load(&subjects, id)
    }

    /// All subjects, alphabetically by title.
    pub fn subjects(&self) -> Result<Vec<Subject>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let subjects = read_txn.open_table(SUBJECTS).map_err(io)?;
        let mut all: Vec<Subject> = load_all(&subjects)?;
        all.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    /// Delete a subject and every course under it.
    ///
    /// Refused with `Protected` when any of those courses has chat history.
    pub fn delete_subject(&self, id: SubjectId) -> Result<(), EducaError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let subject: Subject = {
                let subjects = write_txn.open_table(SUBJECTS).map_err(io)?;
                load(&subjects, id.0)?.ok_or_else(|| EducaError::not_found("subject", id))?
            };

            let course_ids = {
                let index = write_txn.open_table(SUBJECT_COURSES).map_err(io)?;
                children(&index, id.0)?
            };
            for course_id in course_ids {
                remove_course(&write_txn, CourseId(course_id))?;
            }

            let mut subjects = write_txn.open_table(SUBJECTS).map_err(io)?;
            subjects.remove(id.0).map_err(io)?;
            let mut slugs = write_txn.open_table(SUBJECT_SLUGS).map_err(io)?;
            slugs.remove(subject.slug.as_str()).map_err(io)?;
        }
        write_txn.commit().map_err(io)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
