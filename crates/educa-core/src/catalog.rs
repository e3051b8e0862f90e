//! # Catalog Views
//!
//! Read-side aggregation over [`Store`]: subject summaries with their most
//! popular courses, courses with their modules, and the nested course
//! contents shown to enrolled students.

use crate::primitives::POPULAR_COURSES_LIMIT;
use crate::storage::Store;
use crate::types::{Content, Course, CourseId, EducaError, Module, ModuleId, Subject, UserId};

/// A subject with its course count and top courses by students.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSummary {
    pub subject: Subject,
    pub total_courses: usize,
    /// `"{title} ({n} students)"`, most students first.
    pub popular_courses: Vec<String>,
}

/// A course with its ordered modules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSummary {
    pub course: Course,
    pub total_modules: usize,
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleContents {
    pub module: Module,
    pub contents: Vec<Content>,
}

/// A course with every module and every content, all in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseContents {
    pub course: Course,
    pub modules: Vec<ModuleContents>,
}

/// What a student sees when opening one of their courses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentCourseView {
    pub course: Course,
    pub modules: Vec<Module>,
    /// The selected module, or the first one. `None` for a course without
    /// modules.
    pub module: Option<ModuleContents>,
}

pub fn subject_summary(store: &Store, subject: Subject) -> Result<SubjectSummary, EducaError> {
    let courses = store.courses_by_subject(subject.id)?;
    let total_courses = courses.len();

    let mut ranked = Vec::with_capacity(courses.len());
    for course in courses {
        let students = store.student_count(course.id)?;
        ranked.push((students, course));
    }
    ranked.sort_by(|(a_n, a), (b_n, b)| b_n.cmp(a_n).then(a.id.cmp(&b.id)));
    let popular_courses = ranked
        .into_iter()
        .take(POPULAR_COURSES_LIMIT)
        .map(|(n, course)| format!("{} ({n} students)", course.title))
        .collect();

    Ok(SubjectSummary {
        subject,
        total_courses,
        popular_courses,
    })
}

/// Summaries of every subject, alphabetically.
pub fn subject_summaries(store: &Store) -> Result<Vec<SubjectSummary>, EducaError> {
    store
        .subjects()?
        .into_iter()
        .map(|subject| subject_summary(store, subject))
        .collect()
}

pub fn course_summary(store: &Store, course: Course) -> Result<CourseSummary, EducaError> {
    let modules = store.modules(course.id)?;
    Ok(CourseSummary {
        course,
        total_modules: modules.len(),
        modules,
    })
}

pub fn course_summaries(
    store: &Store,
    courses: Vec<Course>,
) -> Result<Vec<CourseSummary>, EducaError> {
    courses
        .into_iter()
        .map(|course| course_summary(store, course))
        .collect()
}

fn module_contents(store: &Store, module: Module) -> Result<ModuleContents, EducaError> {
    let contents = store.contents(module.id)?;
    Ok(ModuleContents { module, contents })
}

pub fn course_contents(store: &Store, id: CourseId) -> Result<CourseContents, EducaError> {
    let course = store
        .course(id)?
        .ok_or_else(|| EducaError::not_found("course", id))?;
    let modules = store
        .modules(id)?
        .into_iter()
        .map(|module| module_contents(store, module))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CourseContents { course, modules })
}

/// Open a course for `student`. Courses the student has not joined are
/// reported as not found; so is a `module` outside the course.
pub fn student_course(
    store: &Store,
    student: UserId,
    id: CourseId,
    module: Option<ModuleId>,
) -> Result<StudentCourseView, EducaError> {
    let course = match store.course(id)? {
        Some(course) if store.is_enrolled(id, student)? => course,
        _ => return Err(EducaError::not_found("course", id)),
    };
    let modules = store.modules(id)?;
    let selected = match module {
        Some(module_id) => Some(
            modules
                .iter()
                .find(|m| m.id == module_id)
                .cloned()
                .ok_or_else(|| EducaError::not_found("module", module_id))?,
        ),
        None => modules.first().cloned(),
    };
    let module = selected
        .map(|module| module_contents(store, module))
        .transpose()?;
    Ok(StudentCourseView {
        course,
        modules,
        module,
    })
}

// =============================================================================
// TESTS
// =============================================================================
