//! Chat history of course rooms.

use super::{
    COURSE_MESSAGES, COURSES, MESSAGES, METADATA, Store, USERS, allocate, children, io, load,
    load_all, save,
};
use crate::types::{CourseId, EducaError, Message, MessageId, UserId};
use crate::validation;
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};

/// Selection for the message listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub course: Option<CourseId>,
    /// Case-insensitive substring of the message content.
    pub search: Option<String>,
    /// Sent at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Sent strictly before this instant.
    pub until: Option<DateTime<Utc>>,
}

impl MessageFilter {
    fn matches(&self, message: &Message, needle: Option<&str>) -> bool {
        if self.course.is_some_and(|course| course != message.course) {
            return false;
        }
        if self.since.is_some_and(|since| message.sent_on < since) {
            return false;
        }
        if self.until.is_some_and(|until| message.sent_on >= until) {
            return false;
        }
        needle.is_none_or(|needle| message.content.to_lowercase().contains(needle))
    }
}

impl Store {
    /// Persist a chat message posted by `user` in the room of `course`.
    pub fn append_message(
        &self,
        user: UserId,
        course: CourseId,
        content: &str,
    ) -> Result<Message, EducaError> {
        let content = validation::message(content)?;

        let write_txn = self.db.begin_write().map_err(io)?;
        let message = {
            let courses = write_txn.open_table(COURSES).map_err(io)?;
            if courses.get(course.0).map_err(io)?.is_none() {
                return Err(EducaError::not_found("course", course));
            }
            let users = write_txn.open_table(USERS).map_err(io)?;
            if users.get(user.0).map_err(io)?.is_none() {
                return Err(EducaError::not_found("user", user));
            }

            let mut meta = write_txn.open_table(METADATA).map_err(io)?;
            let id = MessageId(allocate(&mut meta, "next_message_id")?);
            let message = Message {
                id,
                user,
                course,
                content,
                sent_on: Utc::now(),
            };
            let mut messages = write_txn.open_table(MESSAGES).map_err(io)?;
            save(&mut messages, id.0, &message)?;
            let mut index = write_txn.open_table(COURSE_MESSAGES).map_err(io)?;
            index.insert((course.0, id.0), ()).map_err(io)?;
            message
        };
        write_txn.commit().map_err(io)?;
        Ok(message)
    }

    /// The newest `limit` messages of a room, returned oldest first.
    pub fn latest_messages(
        &self,
        course: CourseId,
        limit: usize,
    ) -> Result<Vec<Message>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let index = read_txn.open_table(COURSE_MESSAGES).map_err(io)?;
        let messages = read_txn.open_table(MESSAGES).map_err(io)?;
        let ids = children(&index, course.0)?;
        let skip = ids.len().saturating_sub(limit);
        let mut found = Vec::with_capacity(ids.len() - skip);
        for id in ids.into_iter().skip(skip) {
            if let Some(message) = load::<Message>(&messages, id)? {
                found.push(message);
            }
        }
        Ok(found)
    }

    /// Messages matching `filter`, newest first.
    pub fn messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, EducaError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let messages = read_txn.open_table(MESSAGES).map_err(io)?;
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut found: Vec<Message> = match filter.course {
            Some(course) => {
                let index = read_txn.open_table(COURSE_MESSAGES).map_err(io)?;
                let mut in_course = Vec::new();
                for id in children(&index, course.0)? {
                    if let Some(message) = load::<Message>(&messages, id)? {
                        in_course.push(message);
                    }
                }
                in_course
            }
            None => load_all(&messages)?,
        };
        found.retain(|m| filter.matches(m, needle.as_deref()));
        found.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(found)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::storage::tests::{course, fixture};

    #[test]
    fn latest_messages_are_oldest_first() {
        let (store, instructor, student, subject) = fixture();
        let c = course(&store, &instructor, &subject, "c");
        for i in 0..7 {
            store
                .append_message(student.id, c.id, &format!("message {i}"))
                .expect("append");
        }

        let latest = store.latest_messages(c.id, 5).expect("latest");
        let texts: Vec<&str> = latest.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(
            texts,
            vec!["message 2", "message 3", "message 4", "message 5", "message 6"]
        );
        assert_eq!(store.latest_messages(c.id, 50).expect("all").len(), 7);
    }

    #[test]
    fn messages_are_trimmed_and_validated() {
        let (store, instructor, student, subject) = fixture();
        let c = course(&store, &instructor, &subject, "c");
        let message = store
            .append_message(student.id, c.id, "  hi there  ")
            .expect("append");
        assert_eq!(message.content, "hi there");
        assert!(matches!(
            store.append_message(student.id, c.id, "   "),
            Err(EducaError::Validation(_))
        ));
        assert!(matches!(
            store.append_message(student.id, CourseId(77), "hello"),
            Err(EducaError::NotFound { .. })
        ));
    }

    #[test]
    fn filter_by_course_and_search() {
        let (store, instructor, student, subject) = fixture();
        let a = course(&store, &instructor, &subject, "a");
        let b = course(&store, &instructor, &subject, "b");
        store.append_message(student.id, a.id, "Hello world").expect("m1");
        store.append_message(student.id, b.id, "hello again").expect("m2");
        store.append_message(instructor.id, a.id, "Homework due").expect("m3");

        let all = store.messages(&MessageFilter::default()).expect("all");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].content, "Homework due");

        let in_a = store
            .messages(&MessageFilter {
                course: Some(a.id),
                ..MessageFilter::default()
            })
            .expect("course a");
        assert_eq!(in_a.len(), 2);

        let hello = store
            .messages(&MessageFilter {
                search: Some("HELLO".to_string()),
                ..MessageFilter::default()
            })
            .expect("search");
        let texts: Vec<&str> = hello.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["hello again", "Hello world"]);
    }

    #[test]
    fn filter_by_sent_on_window() {
        let (store, instructor, student, subject) = fixture();
        let c = course(&store, &instructor, &subject, "c");
        let first = store.append_message(student.id, c.id, "first").expect("m1");
        let second = store.append_message(student.id, c.id, "second").expect("m2");

        let from_second = store
            .messages(&MessageFilter {
                since: Some(second.sent_on),
                ..MessageFilter::default()
            })
            .expect("since");
        assert!(from_second.iter().any(|m| m.id == second.id));
        assert!(from_second.iter().all(|m| m.sent_on >= second.sent_on));

        let before_first = store
            .messages(&MessageFilter {
                until: Some(first.sent_on),
                ..MessageFilter::default()
            })
            .expect("until");
        assert!(before_first.is_empty());

        let everything = store
            .messages(&MessageFilter {
                since: Some(first.sent_on),
                until: Some(second.sent_on + chrono::Duration::seconds(1)),
                ..MessageFilter::default()
            })
            .expect("window");
        assert_eq!(everything.len(), 2);
    }
}
