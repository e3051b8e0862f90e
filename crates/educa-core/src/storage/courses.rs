//! Courses and their ordered modules.
//!
//! Mutations are owner-scoped: a course (or module) that exists but belongs
//! to another instructor is reported as not found, the same as a missing one.

use super::{
    COURSE_MESSAGES, COURSE_MODULES, COURSE_SLUGS, COURSES, CONTENTS, ENROLLMENTS, METADATA,
    MODULE_CONTENTS, MODULES, OWNER_COURSES, STUDENT_COURSES, SUBJECT_COURSES, SUBJECTS, Store,
    USERS, allocate, children, io, load, load_all, save,
};
use crate::ordering::{OrderField, Reorder, sort_by_order};
use crate::primitives::MAX_TITLE_LENGTH;
use crate::types::{Course, CourseId, EducaError, Module, ModuleId, SubjectId, User, UserId};
use crate::validation;
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};

/// Fields of a new course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub subject: SubjectId,
    pub title: String,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub overview: String,
}

/// Partial course update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseUpdate {
    pub subject: Option<SubjectId>,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub overview: Option<String>,
}

/// Fields of a new module. Without `order` it is appended to the course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewModule {
    pub title: String,
    pub description: String,
    pub order: Option<u32>,
}

/// Partial module update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<u32>,
}

// =============================================================================
// COURSES
// =============================================================================

impl Store {
    /// Create a course owned by `owner`, who must be an instructor.
    pub fn create_course(&self, owner: UserId, new: NewCourse) -> Result<Course, EducaError> {
        let title = validation::title("title", &new.title, MAX_TITLE_LENGTH)?;
        let slug = validation::slug_or_derive(new.slug.as_deref(), &title)?;
        let overview = validation::text("overview", &new.overview)?;

        let write_txn = self.db.begin_write().map_err(io)?;
        let course = {
            let users = write_txn.open_table(USERS).map_err(io)?;
            let user: User = load(&users, owner.0)?.ok_or(EducaError::Forbidden)?;
            if !user.is_instructor() {
                return Err(EducaError::Forbidden);
            }
            let subjects = write_txn.open_table(SUBJECTS).map_err(io)?;
            if subjects.get(new.subject.0).map_err(io)?.is_none() {
                return Err(EducaError::Validation(format!(
                    "subject {} does not exist",
                    new.subject
                )));
            }
            let mut slugs = write_txn.open_table(COURSE_SLUGS).map_err(io)?;
            if slugs.get(slug.as_str()).map_err(io)?.is_some() {
                return Err(EducaError::Conflict(format!(
                    "course with slug '{slug}' already exists"
                )));
            }

            let mut meta = write_txn.open_table(METADATA).map_err(io)?;
            let id = CourseId(allocate(&mut meta, "next_course_id")?);
            let course = Course {
                id,
                owner,
                subject: new.subject,
                title,
                slug,
                overview,
                created: Utc::now(),
            };

            let mut courses = write_txn.open_table(COURSES).map_err(io)?;
            save(&mut courses, id.0, &course)?;
            slugs.insert(course.slug.as_str(), id.0).map_err(io)?;
            let mut by_subject = write_txn.open_table(SUBJECT_COURSES).map_err(io)?;
            by_subject.insert((course.subject.0, id.0), ()).map_err(io)?;
            let mut by_owner = write_txn.open_table(OWNER_COURSES).map_err(io)?;
            by_owner.insert((owner.0, id.0), ()).map_err(io)?;
            course
        };
        write_txn.commit().map_err(io)?;
        Ok(course)
    }

    /// Update a course owned by `owner`.
    pub fn update_course(
        &self,
        owner: UserId,
        id: CourseId,
        update: CourseUpdate,
    ) -> Result<Course, EducaError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        let course = {
            let mut courses = write_txn.open_table(COURSES).map_err(io)?;
            let mut course = owned(load(&courses, id.0)?, owner, id)?;

            if let Some(title) = update.title {
                course.title = validation::title("title", &title, MAX_TITLE_LENGTH)?;
            }
            if let Some(overview) = update.overview {
                course.overview = validation::text("overview", &overview)?;
            }
            if let Some(slug) = update.slug {
                let slug = validation::slug(slug.trim())?;
                if slug != course.slug {
                    let mut slugs = write_txn.open_table(COURSE_SLUGS).map_err(io)?;
                    if slugs.get(slug.as_str()).map_err(io)?.is_some() {
                        return Err(EducaError::Conflict(format!(
                            "course with slug '{slug}' already exists"
                        )));
                    }
                    slugs.remove(course.slug.as_str()).map_err(io)?;
                    slugs.insert(slug.as_str(), id.0).map_err(io)?;
                    course.slug = slug;
                }
            }
            if let Some(subject) = update.subject {
                if subject != course.subject {
                    let subjects = write_txn.open_table(SUBJECTS).map_err(io)?;
                    if subjects.get(subject.0).map_err(io)?.is_none() {
                        return Err(EducaError::Validation(format!(
                            "subject {subject} does not exist"
                        )));
                    }
                    let mut by_subject = write_txn.open_table(SUBJECT_COURSES).map_err(io)?;
                    by_subject.remove((course.subject.0, id.0)).map_err(io)?;
                    by_subject.insert((subject.0, id.0), ()).map_err(io)?;
                    course.subject = subject;
                }
            }

            save(&mut courses, id.0, &course)?;
            course
        };
        write_txn.commit().map_err(io)?;
        Ok(course)
    }

    /// Delete a course owned by `owner`, with its modules, contents and
    /// enrollments. Refused with `Protected` if the course has chat history.
    pub fn delete_course(&self, owner: UserId, id: CourseId) -> Result<(), EducaError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            owned(load(&courses, id.0)?, owner, id)?;
        }
        remove_course(&write_txn, id)?;
        write_txn.commit().map_err(io)?;
        Ok(())
    }

    pub fn course(&self, id: CourseId) -> Result<Option<Course>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let courses = read_txn.open_table(COURSES).map_err(io)?;
        load(&courses, id.0)
    }

    pub fn course_by_slug(&self, slug: &str) -> Result<Option<Course>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let slugs = read_txn.open_table(COURSE_SLUGS).map_err(io)?;
        let Some(id) = slugs.get(slug).map_err(io)?.map(|v| v.value()) else {
            return Ok(None);
        };
        let courses = read_txn.open_table(COURSES).map_err(io)?;
        load(&courses, id)
    }

    /// A course, only if `owner` owns it.
    pub fn owned_course(&self, owner: UserId, id: CourseId) -> Result<Course, EducaError> {
        owned(self.course(id)?, owner, id)
    }

    /// All courses, newest first.
    pub fn courses(&self) -> Result<Vec<Course>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let courses = read_txn.open_table(COURSES).map_err(io)?;
        let mut all: Vec<Course> = load_all(&courses)?;
        sort_newest_first(&mut all);
        Ok(all)
    }

    /// Courses created by `owner`, newest first.
    pub fn courses_by_owner(&self, owner: UserId) -> Result<Vec<Course>, EducaError> {
        self.courses_in_index(OWNER_COURSES, owner.0)
    }

    /// Courses filed under `subject`, newest first.
    pub fn courses_by_subject(&self, subject: SubjectId) -> Result<Vec<Course>, EducaError> {
        self.courses_in_index(SUBJECT_COURSES, subject.0)
    }

    pub(super) fn courses_in_index(
        &self,
        index: redb::TableDefinition<(u64, u64), ()>,
        parent: u64,
    ) -> Result<Vec<Course>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let index = read_txn.open_table(index).map_err(io)?;
        let courses = read_txn.open_table(COURSES).map_err(io)?;
        let mut found = Vec::new();
        for id in children(&index, parent)? {
            if let Some(course) = load::<Course>(&courses, id)? {
                found.push(course);
            }
        }
        sort_newest_first(&mut found);
        Ok(found)
    }
}

// =============================================================================
// MODULES
// =============================================================================

impl Store {
    /// Add a module to a course owned by `owner`.
    ///
    /// Without an explicit order the module goes after the last module of
    /// this course.
    pub fn add_module(
        &self,
        owner: UserId,
        course: CourseId,
        new: NewModule,
    ) -> Result<Module, EducaError> {
        let title = validation::title("title", &new.title, MAX_TITLE_LENGTH)?;
        let description = validation::text("description", &new.description)?;

        let write_txn = self.db.begin_write().map_err(io)?;
        let module = {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            owned(load(&courses, course.0)?, owner, course)?;

            let mut index = write_txn.open_table(COURSE_MODULES).map_err(io)?;
            let mut modules = write_txn.open_table(MODULES).map_err(io)?;
            let mut existing = Vec::new();
            for module_id in children(&index, course.0)? {
                if let Some(module) = load::<Module>(&modules, module_id)? {
                    existing.push(module.order);
                }
            }
            let order = OrderField::from_existing(existing).resolve(new.order);

            let mut meta = write_txn.open_table(METADATA).map_err(io)?;
            let id = ModuleId(allocate(&mut meta, "next_module_id")?);
            let module = Module {
                id,
                course,
                title,
                description,
                order,
            };
            save(&mut modules, id.0, &module)?;
            index.insert((course.0, id.0), ()).map_err(io)?;
            module
        };
        write_txn.commit().map_err(io)?;
        Ok(module)
    }

    /// Update a module whose course is owned by `owner`.
    pub fn update_module(
        &self,
        owner: UserId,
        id: ModuleId,
        update: ModuleUpdate,
    ) -> Result<Module, EducaError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        let module = {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            let mut modules = write_txn.open_table(MODULES).map_err(io)?;
            let mut module = owned_module_in(&courses, &modules, owner, id)?;

            if let Some(title) = update.title {
                module.title = validation::title("title", &title, MAX_TITLE_LENGTH)?;
            }
            if let Some(description) = update.description {
                module.description = validation::text("description", &description)?;
            }
            if let Some(order) = update.order {
                module.order = order;
            }
            save(&mut modules, id.0, &module)?;
            module
        };
        write_txn.commit().map_err(io)?;
        Ok(module)
    }

    /// Delete a module (and its contents) whose course is owned by `owner`.
    pub fn delete_module(&self, owner: UserId, id: ModuleId) -> Result<(), EducaError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            let modules = write_txn.open_table(MODULES).map_err(io)?;
            owned_module_in(&courses, &modules, owner, id)?;
        }
        remove_module(&write_txn, id)?;
        write_txn.commit().map_err(io)?;
        Ok(())
    }

    pub fn module(&self, id: ModuleId) -> Result<Option<Module>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let modules = read_txn.open_table(MODULES).map_err(io)?;
        load(&modules, id.0)
    }

    /// A module, only if its course is owned by `owner`.
    pub fn owned_module(&self, owner: UserId, id: ModuleId) -> Result<Module, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let courses = read_txn.open_table(COURSES).map_err(io)?;
        let modules = read_txn.open_table(MODULES).map_err(io)?;
        owned_module_in(&courses, &modules, owner, id)
    }

    /// Modules of a course sorted by `(order, id)`.
    pub fn modules(&self, course: CourseId) -> Result<Vec<Module>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let index = read_txn.open_table(COURSE_MODULES).map_err(io)?;
        let modules = read_txn.open_table(MODULES).map_err(io)?;
        let mut found = Vec::new();
        for id in children(&index, course.0)? {
            if let Some(module) = load::<Module>(&modules, id)? {
                found.push(module);
            }
        }
        sort_by_order(&mut found, |m| (m.order, m.id));
        Ok(found)
    }

    /// Apply a batch of module positions. Entries for modules that do not
    /// exist or belong to another owner are skipped. Returns how many
    /// modules were updated.
    pub fn reorder_modules(
        &self,
        owner: UserId,
        batch: &Reorder<ModuleId>,
    ) -> Result<usize, EducaError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        let updated = {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            let mut modules = write_txn.open_table(MODULES).map_err(io)?;
            let mut updated = 0;
            for (id, order) in batch.iter() {
                let Ok(mut module) = owned_module_in(&courses, &modules, owner, id) else {
                    continue;
                };
                module.order = order;
                save(&mut modules, id.0, &module)?;
                updated += 1;
            }
            updated
        };
        write_txn.commit().map_err(io)?;
        Ok(updated)
    }
}

// =============================================================================
// INTERNAL HELPERS
// =============================================================================

/// Keep `course` only if it exists and `owner` owns it.
fn owned(course: Option<Course>, owner: UserId, id: CourseId) -> Result<Course, EducaError> {
    match course {
        Some(course) if course.owner == owner => Ok(course),
        _ => Err(EducaError::not_found("course", id)),
    }
}

/// Load a module and check its course belongs to `owner`.
pub(super) fn owned_module_in(
    courses: &impl ReadableTable<u64, &'static [u8]>,
    modules: &impl ReadableTable<u64, &'static [u8]>,
    owner: UserId,
    id: ModuleId,
) -> Result<Module, EducaError> {
    let module: Module = load(modules, id.0)?.ok_or_else(|| EducaError::not_found("module", id))?;
    let course: Option<Course> = load(courses, module.course.0)?;
    match course {
        Some(course) if course.owner == owner => Ok(module),
        _ => Err(EducaError::not_found("module", id)),
    }
}

fn sort_newest_first(courses: &mut [Course]) {
    courses.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
}

/// Remove a course and everything hanging off it inside `txn`.
pub(super) fn remove_course(txn: &WriteTransaction, id: CourseId) -> Result<(), EducaError> {
    {
        let messages = txn.open_table(COURSE_MESSAGES).map_err(io)?;
        if !children(&messages, id.0)?.is_empty() {
            return Err(EducaError::Protected(format!(
                "course {id} has chat messages"
            )));
        }
    }

    let module_ids = {
        let index = txn.open_table(COURSE_MODULES).map_err(io)?;
        children(&index, id.0)?
    };
    for module_id in module_ids {
        remove_module(txn, ModuleId(module_id))?;
    }

    {
        let mut enrollments = txn.open_table(ENROLLMENTS).map_err(io)?;
        let mut joined = txn.open_table(STUDENT_COURSES).map_err(io)?;
        for student in children(&enrollments, id.0)? {
            enrollments.remove((id.0, student)).map_err(io)?;
            joined.remove((student, id.0)).map_err(io)?;
        }
    }

    let mut courses = txn.open_table(COURSES).map_err(io)?;
    let course: Course = load(&courses, id.0)?.ok_or_else(|| EducaError::not_found("course", id))?;
    courses.remove(id.0).map_err(io)?;
    let mut slugs = txn.open_table(COURSE_SLUGS).map_err(io)?;
    slugs.remove(course.slug.as_str()).map_err(io)?;
    let mut by_subject = txn.open_table(SUBJECT_COURSES).map_err(io)?;
    by_subject.remove((course.subject.0, id.0)).map_err(io)?;
    let mut by_owner = txn.open_table(OWNER_COURSES).map_err(io)?;
    by_owner.remove((course.owner.0, id.0)).map_err(io)?;
    Ok(())
}

/// Remove a module and its contents inside `txn`.
pub(super) fn remove_module(txn: &WriteTransaction, id: ModuleId) -> Result<(), EducaError> {
    let mut modules = txn.open_table(MODULES).map_err(io)?;
    let module: Module = load(&modules, id.0)?.ok_or_else(|| EducaError::not_found("module", id))?;

    let mut module_contents = txn.open_table(MODULE_CONTENTS).map_err(io)?;
    let mut contents = txn.open_table(CONTENTS).map_err(io)?;
    for content_id in children(&module_contents, id.0)? {
        contents.remove(content_id).map_err(io)?;
        module_contents.remove((id.0, content_id)).map_err(io)?;
    }

    modules.remove(id.0).map_err(io)?;
    let mut index = txn.open_table(COURSE_MODULES).map_err(io)?;
    index.remove((module.course.0, id.0)).map_err(io)?;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::storage::tests::{course, fixture};
    use crate::types::Role;
    use std::collections::BTreeMap;

    fn module(store: &Store, owner: &User, course: CourseId, title: &str) -> Module {
        store
            .add_module(
                owner.id,
                course,
                NewModule {
                    title: title.to_string(),
                    ..NewModule::default()
                },
            )
            .expect("module")
    }

    #[test]
    fn students_cannot_create_courses() {
        let (store, _instructor, student, subject) = fixture();
        let err = store
            .create_course(
                student.id,
                NewCourse {
                    subject: subject.id,
                    title: "Sneaky".to_string(),
                    slug: None,
                    overview: String::new(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, EducaError::Forbidden));
    }

    #[test]
    fn course_requires_existing_subject_and_unique_slug() {
        let (store, instructor, _student, subject) = fixture();
        let missing_subject = store.create_course(
            instructor.id,
            NewCourse {
                subject: SubjectId(99),
                title: "Orphan".to_string(),
                slug: None,
                overview: String::new(),
            },
        );
        assert!(matches!(missing_subject, Err(EducaError::Validation(_))));

        course(&store, &instructor, &subject, "rust");
        let dup = store.create_course(
            instructor.id,
            NewCourse {
                subject: subject.id,
                title: "Rust again".to_string(),
                slug: Some("rust".to_string()),
                overview: String::new(),
            },
        );
        assert!(matches!(dup, Err(EducaError::Conflict(_))));
    }

    #[test]
    fn courses_listed_newest_first() {
        let (store, instructor, _student, subject) = fixture();
        let a = course(&store, &instructor, &subject, "a");
        let b = course(&store, &instructor, &subject, "b");
        let c = course(&store, &instructor, &subject, "c");
        let ids: Vec<CourseId> = store.courses().expect("list").iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![c.id, b.id, a.id]);
    }

    #[test]
    fn update_course_checks_owner_and_moves_indexes() {
        let (store, instructor, _student, subject) = fixture();
        let other = store
            .create_user("other", "other-pass-1", Role::Instructor)
            .expect("other");
        let second_subject = store.create_subject("Design", None).expect("subject");
        let c = course(&store, &instructor, &subject, "rust");

        let denied = store.update_course(
            other.id,
            c.id,
            CourseUpdate {
                title: Some("Hijacked".to_string()),
                ..CourseUpdate::default()
            },
        );
        assert!(matches!(denied, Err(EducaError::NotFound { .. })));

        let updated = store
            .update_course(
                instructor.id,
                c.id,
                CourseUpdate {
                    subject: Some(second_subject.id),
                    slug: Some("rust-2024".to_string()),
                    ..CourseUpdate::default()
                },
            )
            .expect("update");
        assert_eq!(updated.slug, "rust-2024");
        assert!(store.course_by_slug("rust").expect("lookup").is_none());
        assert!(store.course_by_slug("rust-2024").expect("lookup").is_some());
        assert!(store.courses_by_subject(subject.id).expect("list").is_empty());
        assert_eq!(store.courses_by_subject(second_subject.id).expect("list").len(), 1);
    }

    #[test]
    fn modules_get_increasing_order_per_course() {
        let (store, instructor, _student, subject) = fixture();
        let first = course(&store, &instructor, &subject, "first");
        let second = course(&store, &instructor, &subject, "second");

        let m0 = module(&store, &instructor, first.id, "Intro");
        let m1 = module(&store, &instructor, first.id, "Basics");
        let other = module(&store, &instructor, second.id, "Elsewhere");
        let m2 = module(&store, &instructor, first.id, "Advanced");

        assert_eq!((m0.order, m1.order, m2.order), (0, 1, 2));
        // Scope is per course.
        assert_eq!(other.order, 0);
    }

    #[test]
    fn explicit_order_kept_and_gaps_not_reused() {
        let (store, instructor, _student, subject) = fixture();
        let c = course(&store, &instructor, &subject, "c");
        let m0 = module(&store, &instructor, c.id, "A");
        let m1 = module(&store, &instructor, c.id, "B");
        let m2 = module(&store, &instructor, c.id, "C");
        store.delete_module(instructor.id, m1.id).expect("delete");

        let next = module(&store, &instructor, c.id, "D");
        assert_eq!(next.order, 3);

        let pinned = store
            .add_module(
                instructor.id,
                c.id,
                NewModule {
                    title: "Pinned".to_string(),
                    description: String::new(),
                    order: Some(0),
                },
            )
            .expect("pinned");
        assert_eq!(pinned.order, 0);

        let titles: Vec<String> = store
            .modules(c.id)
            .expect("modules")
            .into_iter()
            .map(|m| m.title)
            .collect();
        // (0, A) and (0, Pinned) tie on order and fall back to id.
        assert_eq!(titles, vec!["A", "Pinned", "C", "D"]);
        assert_eq!((m0.order, m2.order), (0, 2));
    }

    #[test]
    fn reorder_skips_foreign_and_missing_modules() {
        let (store, instructor, _student, subject) = fixture();
        let other = store
            .create_user("other", "other-pass-1", Role::Instructor)
            .expect("other");
        let mine = course(&store, &instructor, &subject, "mine");
        let theirs = course(&store, &other, &subject, "theirs");
        let a = module(&store, &instructor, mine.id, "A");
        let b = module(&store, &instructor, mine.id, "B");
        let foreign = module(&store, &other, theirs.id, "X");

        let batch = Reorder::new(BTreeMap::from([
            (a.id, 5),
            (b.id, 1),
            (foreign.id, 9),
            (ModuleId(999), 3),
        ]))
        .expect("batch");
        let updated = store.reorder_modules(instructor.id, &batch).expect("reorder");
        assert_eq!(updated, 2);

        let order: Vec<(String, u32)> = store
            .modules(mine.id)
            .expect("modules")
            .into_iter()
            .map(|m| (m.title, m.order))
            .collect();
        assert_eq!(order, vec![("B".to_string(), 1), ("A".to_string(), 5)]);
        assert_eq!(store.module(foreign.id).expect("get").expect("exists").order, 0);
    }

    #[test]
    fn delete_course_cascades() {
        let (store, instructor, student, subject) = fixture();
        let c = course(&store, &instructor, &subject, "c");
        let m = module(&store, &instructor, c.id, "A");
        store.enroll(c.id, student.id).expect("enroll");

        store.delete_course(instructor.id, c.id).expect("delete");

        let stats = store.stats().expect("stats");
        assert_eq!(stats.courses, 0);
        assert_eq!(stats.modules, 0);
        assert_eq!(stats.enrollments, 0);
        assert!(store.module(m.id).expect("get").is_none());
        assert!(store.courses_by_owner(instructor.id).expect("list").is_empty());
    }

    #[test]
    fn delete_course_requires_owner() {
        let (store, instructor, student, subject) = fixture();
        let c = course(&store, &instructor, &subject, "c");
        assert!(matches!(
            store.delete_course(student.id, c.id),
            Err(EducaError::NotFound { .. })
        ));
        assert!(store.course(c.id).expect("get").is_some());
    }
}
