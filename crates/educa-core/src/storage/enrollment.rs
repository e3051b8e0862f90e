//! Enrollment: which students joined which courses.

use super::{COURSES, ENROLLMENTS, STUDENT_COURSES, Store, USERS, children, io, load};
use crate::types::{Course, CourseId, EducaError, User, UserId};
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};

impl Store {
    /// Add `user` to the students of `course`.
    ///
    /// Returns `false` when the user was already enrolled; the original
    /// enrollment time is kept.
    pub fn enroll(&self, course: CourseId, user: UserId) -> Result<bool, EducaError> {
        let write_txn = self.db.begin_write().map_err(io)?;
        let created = {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            if courses.get(course.0).map_err(io)?.is_none() {
                return Err(EducaError::not_found("course", course));
            }
            let users = write_txn.open_table(USERS).map_err(io)?;
            if users.get(user.0).map_err(io)?.is_none() {
                return Err(EducaError::not_found("user", user));
            }

            let mut enrollments = write_txn.open_table(ENROLLMENTS).map_err(io)?;
            if enrollments.get((course.0, user.0)).map_err(io)?.is_some() {
                false
            } else {
                let at = Utc::now().timestamp_millis();
                enrollments.insert((course.0, user.0), at).map_err(io)?;
                let mut joined = write_txn.open_table(STUDENT_COURSES).map_err(io)?;
                joined.insert((user.0, course.0), ()).map_err(io)?;
                true
            }
        };
        write_txn.commit().map_err(io)?;
        Ok(created)
    }

    pub fn is_enrolled(&self, course: CourseId, user: UserId) -> Result<bool, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let enrollments = read_txn.open_table(ENROLLMENTS).map_err(io)?;
        Ok(enrollments.get((course.0, user.0)).map_err(io)?.is_some())
    }

    /// Students of a course, by id.
    pub fn students(&self, course: CourseId) -> Result<Vec<User>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let enrollments = read_txn.open_table(ENROLLMENTS).map_err(io)?;
        let users = read_txn.open_table(USERS).map_err(io)?;
        let mut found = Vec::new();
        for id in children(&enrollments, course.0)? {
            if let Some(user) = load::<User>(&users, id)? {
                found.push(user);
            }
        }
        Ok(found)
    }

    pub fn student_count(&self, course: CourseId) -> Result<usize, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let enrollments = read_txn.open_table(ENROLLMENTS).map_err(io)?;
        Ok(children(&enrollments, course.0)?.len())
    }

    /// Courses `user` has joined, newest course first.
    pub fn courses_joined(&self, user: UserId) -> Result<Vec<Course>, EducaError> {
        self.courses_in_index(STUDENT_COURSES, user.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================
