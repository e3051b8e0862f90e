//! Integration tests for the Educa HTTP API.
//!
//! Uses axum-test to exercise the router without binding a port, except for
//! the chat socket tests which need a real HTTP transport.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use educa::api::{
    AppState, BODY_LIMIT, ChatFrame, ChatRoomResponse, ContentResponse, CourseContentsResponse,
    CourseResponse, HealthResponse, ModuleResponse, StudentCourseResponse, SubjectResponse,
    UserResponse, create_router,
};
use educa::config::ServerConfig;
use educa_core::{CourseId, MessageFilter, Page, Role, Store, SubjectId, User};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

const INSTRUCTOR: (&str, &str) = ("professor", "professor-pass");
const OTHER_INSTRUCTOR: (&str, &str) = ("rival", "rival-pass");
const STUDENT: (&str, &str) = ("student", "student-pass");
const API_KEY: &str = "test-admin-key";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

struct Fixture {
    server: TestServer,
    state: AppState,
    subject: SubjectId,
    instructor: User,
    student: User,
}

impl Fixture {
    fn store(&self) -> &Arc<Store> {
        &self.state.store
    }
}

fn test_config(api_key: Option<&str>) -> ServerConfig {
    ServerConfig {
        api_key: api_key.map(str::to_string),
        rate_limit: 0,
        ..ServerConfig::default()
    }
}

fn seeded_state(config: ServerConfig) -> (AppState, SubjectId, User, User) {
    let store = Store::in_memory().unwrap();
    let instructor = store
        .create_user(INSTRUCTOR.0, INSTRUCTOR.1, Role::Instructor)
        .unwrap();
    store
        .create_user(OTHER_INSTRUCTOR.0, OTHER_INSTRUCTOR.1, Role::Instructor)
        .unwrap();
    let student = store
        .create_user(STUDENT.0, STUDENT.1, Role::Student)
        .unwrap();
    let subject = store.create_subject("Mathematics", None).unwrap();
    (
        AppState::new(store, config),
        subject.id,
        instructor,
        student,
    )
}

/// Test server over a fresh in-memory store with two instructors, one
/// student and the "mathematics" subject.
fn create_test_server_with(config: ServerConfig) -> Fixture {
    let (state, subject, instructor, student) = seeded_state(config);
    let server = TestServer::new(create_router(state.clone())).unwrap();
    Fixture {
        server,
        state,
        subject,
        instructor,
        student,
    }
}

fn create_test_server() -> Fixture {
    create_test_server_with(test_config(None))
}

fn basic((username, password): (&str, &str)) -> HeaderValue {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}").parse::<HeaderValue>().unwrap()
}

fn bearer(key: &str) -> HeaderValue {
    format!("Bearer {key}").parse::<HeaderValue>().unwrap()
}

/// Create a course through the API and return it.
async fn create_course(fixture: &Fixture, title: &str) -> CourseResponse {
    let response = fixture
        .server
        .post("/api/manage/courses")
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({
            "subject": fixture.subject.0,
            "title": title,
            "overview": "An overview",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn create_module(fixture: &Fixture, course: u64, title: &str) -> ModuleResponse {
    let response = fixture
        .server
        .post(&format!("/api/manage/courses/{course}/modules"))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({ "title": title }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn enroll(fixture: &Fixture, course: u64, who: (&str, &str)) {
    fixture
        .server
        .post(&format!("/api/courses/{course}/enroll"))
        .add_header(header::AUTHORIZATION, basic(who))
        .await
        .assert_status_ok();
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = create_test_server();

    let response = fixture.server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// ACCOUNT TESTS
// =============================================================================

#[tokio::test]
async fn test_register_creates_student() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .post("/api/accounts/register")
        .json(&json!({ "username": "newcomer", "password": "long-enough" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let user: UserResponse = response.json();
    assert_eq!(user.username, "newcomer");
    assert_eq!(user.role, "student");

    // The new account can authenticate right away.
    fixture
        .server
        .get("/api/students/courses")
        .add_header(header::AUTHORIZATION, basic(("newcomer", "long-enough")))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let fixture = create_test_server();

    let duplicate = fixture
        .server
        .post("/api/accounts/register")
        .json(&json!({ "username": STUDENT.0, "password": "another-pass" }))
        .await;
    duplicate.assert_status(StatusCode::CONFLICT);

    let weak = fixture
        .server
        .post("/api/accounts/register")
        .json(&json!({ "username": "weakling", "password": "short" }))
        .await;
    weak.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = weak.json();
    assert!(body["error"].is_string());
}

// =============================================================================
// AUTHENTICATION TESTS
// =============================================================================

#[tokio::test]
async fn test_missing_credentials_get_basic_challenge() {
    let fixture = create_test_server();

    let response = fixture.server.get("/api/students/courses").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE),
        Some(&HeaderValue::from_static(r#"Basic realm="educa""#))
    );
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .get("/api/students/courses")
        .add_header(header::AUTHORIZATION, basic((STUDENT.0, "wrong-password")))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_students_cannot_manage_courses() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .get("/api/manage/courses")
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

// =============================================================================
// CATALOG TESTS
// =============================================================================

#[tokio::test]
async fn test_subjects_are_paginated() {
    let fixture = create_test_server();
    for i in 0..11 {
        fixture
            .store()
            .create_subject(&format!("Subject {i:02}"), None)
            .unwrap();
    }

    let response = fixture
        .server
        .get("/api/subjects")
        .add_query_param("page_size", 5)
        .await;

    response.assert_status_ok();
    let page: Page<SubjectResponse> = response.json();
    assert_eq!(page.count, 12);
    assert_eq!(page.results.len(), 5);
    assert_eq!(page.next.as_deref(), Some("/api/subjects?page=2&page_size=5"));
    assert!(page.previous.is_none());

    let last: Page<SubjectResponse> = fixture
        .server
        .get("/api/subjects?page=3&page_size=5")
        .await
        .json();
    assert_eq!(last.results.len(), 2);
    assert!(last.next.is_none());

    fixture
        .server
        .get("/api/subjects?page=9&page_size=5")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_course_listing_follows_writes() {
    let fixture = create_test_server();

    // Warm the cache with an empty listing.
    let empty: Page<CourseResponse> = fixture.server.get("/api/courses").await.json();
    assert_eq!(empty.count, 0);

    let course = create_course(&fixture, "Algebra").await;
    create_module(&fixture, course.id, "Groups").await;

    let page: Page<CourseResponse> = fixture
        .server
        .get("/api/courses?subject=mathematics")
        .await
        .json();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].slug, "algebra");
    assert_eq!(page.results[0].total_modules, 1);
    assert_eq!(page.results[0].owner, fixture.instructor.id.0);

    fixture
        .server
        .get("/api/courses?subject=unknown")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_subject_reports_popular_courses() {
    let fixture = create_test_server();
    let algebra = create_course(&fixture, "Algebra").await;
    create_course(&fixture, "Geometry").await;
    enroll(&fixture, algebra.id, STUDENT).await;

    let subject: SubjectResponse = fixture
        .server
        .get(&format!("/api/subjects/{}", fixture.subject.0))
        .await
        .json();

    assert_eq!(subject.total_courses, 2);
    assert_eq!(
        subject.popular_courses,
        vec!["Algebra (1 students)", "Geometry (0 students)"]
    );

    fixture
        .server
        .get("/api/subjects/999")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// =============================================================================
// COURSE MANAGEMENT TESTS
// =============================================================================

#[tokio::test]
async fn test_course_crud_respects_ownership() {
    let fixture = create_test_server();
    let course = create_course(&fixture, "Algebra").await;

    // Another instructor cannot see it.
    fixture
        .server
        .put(&format!("/api/manage/courses/{}", course.id))
        .add_header(header::AUTHORIZATION, basic(OTHER_INSTRUCTOR))
        .json(&json!({ "title": "Stolen" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let updated: CourseResponse = fixture
        .server
        .put(&format!("/api/manage/courses/{}", course.id))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({ "title": "Linear Algebra" }))
        .await
        .json();
    assert_eq!(updated.title, "Linear Algebra");

    let own: Vec<CourseResponse> = fixture
        .server
        .get("/api/manage/courses")
        .add_header(header::AUTHORIZATION, basic(OTHER_INSTRUCTOR))
        .await
        .json();
    assert!(own.is_empty());

    fixture
        .server
        .delete(&format!("/api/manage/courses/{}", course.id))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    fixture
        .server
        .get(&format!("/api/courses/{}", course.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .post("/api/manage/courses")
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({
            "subject": fixture.subject.0,
            "title": "Too long",
            "overview": "x".repeat(BODY_LIMIT + 1),
        }))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(fixture.store().courses().unwrap().is_empty());
}

#[tokio::test]
async fn test_course_with_unknown_subject_is_rejected() {
    let fixture = create_test_server();

    let response = fixture
        .server
        .post("/api/manage/courses")
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({ "subject": 999, "title": "Nowhere" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_modules_are_appended_and_reordered() {
    let fixture = create_test_server();
    let course = create_course(&fixture, "Algebra").await;
    let first = create_module(&fixture, course.id, "Sets").await;
    let second = create_module(&fixture, course.id, "Groups").await;
    assert_eq!(first.order, 0);
    assert_eq!(second.order, 1);

    let response = fixture
        .server
        .post("/api/manage/modules/order")
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({
            (first.id.to_string()): 1,
            (second.id.to_string()): 0,
        }))
        .await;
    response.assert_status_ok();
    response.assert_json(&json!({ "saved": "OK" }));

    let modules: Vec<ModuleResponse> = fixture
        .server
        .get(&format!("/api/manage/courses/{}/modules", course.id))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .await
        .json();
    let titles: Vec<&str> = modules.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Groups", "Sets"]);
}

#[tokio::test]
async fn test_reorder_skips_foreign_modules() {
    let fixture = create_test_server();
    let course = create_course(&fixture, "Algebra").await;
    let module = create_module(&fixture, course.id, "Sets").await;

    fixture
        .server
        .post("/api/manage/modules/order")
        .add_header(header::AUTHORIZATION, basic(OTHER_INSTRUCTOR))
        .json(&json!({ (module.id.to_string()): 7 }))
        .await
        .assert_json(&json!({ "saved": "OK" }));

    let stored = fixture
        .store()
        .module(educa_core::ModuleId(module.id))
        .unwrap()
        .unwrap();
    assert_eq!(stored.order, 0);
}

// =============================================================================
// CONTENT TESTS
// =============================================================================

#[tokio::test]
async fn test_contents_by_kind() {
    let fixture = create_test_server();
    let course = create_course(&fixture, "Algebra").await;
    let module = create_module(&fixture, course.id, "Sets").await;
    let base = format!("/api/manage/modules/{}/contents", module.id);

    let text = fixture
        .server
        .post(&format!("{base}/text"))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({ "title": "Intro", "content": "Sets & <elements>" }))
        .await;
    text.assert_status(StatusCode::CREATED);
    let text: ContentResponse = text.json();
    assert_eq!(text.kind, "text");
    assert_eq!(text.order, 0);
    assert!(text.item.contains("&amp;"));
    assert!(!text.item.contains("<elements>"));

    let video: ContentResponse = fixture
        .server
        .post(&format!("{base}/video"))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({ "title": "Lecture", "url": "https://www.youtube.com/watch?v=abc123" }))
        .await
        .json();
    assert_eq!(video.order, 1);

    fixture
        .server
        .post(&format!("{base}/audio"))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({ "title": "Podcast", "url": "https://example.com/a.mp3" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // A field of another kind is rejected.
    fixture
        .server
        .post(&format!("{base}/video"))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({ "title": "Oops", "content": "not a url" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let updated: ContentResponse = fixture
        .server
        .put(&format!("/api/manage/contents/{}", text.id))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({ "content": "Plain" }))
        .await
        .json();
    assert_eq!(updated.title, "Intro");
    assert!(updated.item.contains("Plain"));

    fixture
        .server
        .delete(&format!("/api/manage/contents/{}", video.id))
        .add_header(header::AUTHORIZATION, basic(OTHER_INSTRUCTOR))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    fixture
        .server
        .delete(&format!("/api/manage/contents/{}", video.id))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

// =============================================================================
// STUDENT TESTS
// =============================================================================

#[tokio::test]
async fn test_contents_require_enrollment() {
    let fixture = create_test_server();
    let course = create_course(&fixture, "Algebra").await;
    let module = create_module(&fixture, course.id, "Sets").await;
    fixture
        .server
        .post(&format!("/api/manage/modules/{}/contents/text", module.id))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .json(&json!({ "title": "Intro", "content": "Hello" }))
        .await
        .assert_status(StatusCode::CREATED);

    let path = format!("/api/courses/{}/contents", course.id);
    fixture
        .server
        .get(&path)
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    fixture
        .server
        .get("/api/courses/999/contents")
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    enroll(&fixture, course.id, STUDENT).await;
    // Enrolling twice is harmless.
    enroll(&fixture, course.id, STUDENT).await;

    let contents: CourseContentsResponse = fixture
        .server
        .get(&path)
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .json();
    assert_eq!(contents.modules.len(), 1);
    assert_eq!(contents.modules[0].contents.len(), 1);
    assert_eq!(contents.modules[0].contents[0].title, "Intro");
}

#[tokio::test]
async fn test_student_course_views() {
    let fixture = create_test_server();
    let course = create_course(&fixture, "Algebra").await;
    let sets = create_module(&fixture, course.id, "Sets").await;
    let groups = create_module(&fixture, course.id, "Groups").await;

    let path = format!("/api/students/courses/{}", course.id);
    fixture
        .server
        .get(&path)
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    enroll(&fixture, course.id, STUDENT).await;

    let joined: Vec<CourseResponse> = fixture
        .server
        .get("/api/students/courses")
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .json();
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].id, course.id);

    let view: StudentCourseResponse = fixture
        .server
        .get(&path)
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .json();
    assert_eq!(view.modules.len(), 2);
    assert_eq!(view.module.map(|m| m.id), Some(sets.id));

    let view: StudentCourseResponse = fixture
        .server
        .get(&path)
        .add_query_param("module", groups.id)
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .json();
    assert_eq!(view.module.map(|m| m.title), Some("Groups".to_string()));
}

// =============================================================================
// CHAT ROOM TESTS
// =============================================================================

#[tokio::test]
async fn test_chat_room_returns_latest_messages() {
    let fixture = create_test_server();
    let course = create_course(&fixture, "Algebra").await;
    let path = format!("/api/chat/rooms/{}", course.id);

    fixture
        .server
        .get(&path)
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    enroll(&fixture, course.id, STUDENT).await;
    for i in 0..7 {
        fixture
            .store()
            .append_message(fixture.student.id, CourseId(course.id), &format!("m{i}"))
            .unwrap();
    }

    let room: ChatRoomResponse = fixture
        .server
        .get(&path)
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .json();
    assert_eq!(room.course.id, course.id);
    let contents: Vec<&str> = room
        .latest_messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, vec!["m2", "m3", "m4", "m5", "m6"]);
    assert!(room.latest_messages.iter().all(|m| m.user == STUDENT.0));
}

#[tokio::test]
async fn test_chat_socket_checks_before_upgrade() {
    let fixture = create_test_server();
    let course = create_course(&fixture, "Algebra").await;
    let path = format!("/ws/chat/room/{}", course.id);

    fixture
        .server
        .get(&path)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    fixture
        .server
        .get(&path)
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    fixture
        .server
        .get("/ws/chat/room/999")
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_chat_socket_broadcasts_and_stores() {
    let (state, _, _, student) = seeded_state(test_config(None));
    let classmate = state
        .store
        .create_user("classmate", "classmate-pass", Role::Student)
        .unwrap();
    let course = state
        .store
        .create_course(
            state.store.user_by_username(INSTRUCTOR.0).unwrap().unwrap().id,
            educa_core::NewCourse {
                subject: state.store.subject_by_slug("mathematics").unwrap().unwrap().id,
                title: "Algebra".to_string(),
                slug: None,
                overview: String::new(),
            },
        )
        .unwrap();
    state.store.enroll(course.id, student.id).unwrap();
    state.store.enroll(course.id, classmate.id).unwrap();

    let server = TestServer::builder()
        .http_transport()
        .build(create_router(state.clone()))
        .unwrap();
    let path = format!("/ws/chat/room/{}", course.id);

    let mut alice = server
        .get_websocket(&path)
        .add_header(header::AUTHORIZATION, basic(STUDENT))
        .await
        .into_websocket()
        .await;
    let mut bob = server
        .get_websocket(&path)
        .add_header(header::AUTHORIZATION, basic(("classmate", "classmate-pass")))
        .await
        .into_websocket()
        .await;

    // Sessions join their group after the upgrade completes.
    for _ in 0..100 {
        if state.hub.members(course.id).await == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(state.hub.members(course.id).await, 2);

    alice.send_json(&json!({ "message": "hello class" })).await;
    for socket in [&mut alice, &mut bob] {
        match socket.receive_json::<ChatFrame>().await {
            ChatFrame::ChatMessage { message, user, .. } => {
                assert_eq!(message, "hello class");
                assert_eq!(user, STUDENT.0);
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    // Invalid frames are answered to the sender only.
    alice.send_text("not json").await;
    assert!(matches!(
        alice.receive_json::<ChatFrame>().await,
        ChatFrame::Error { .. }
    ));
    bob.send_json(&json!({ "message": "hi" })).await;
    assert!(matches!(
        bob.receive_json::<ChatFrame>().await,
        ChatFrame::ChatMessage { ref message, .. } if message == "hi"
    ));

    let filter = MessageFilter {
        course: Some(course.id),
        ..MessageFilter::default()
    };
    let mut stored = Vec::new();
    for _ in 0..100 {
        stored = state.store.messages(&filter).unwrap();
        if stored.len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let contents: Vec<&str> = stored.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hi", "hello class"]);
}

#[tokio::test]
async fn test_course_with_chat_history_is_protected() {
    let fixture = create_test_server();
    let course = create_course(&fixture, "Algebra").await;
    enroll(&fixture, course.id, STUDENT).await;
    fixture
        .store()
        .append_message(fixture.student.id, CourseId(course.id), "keep me")
        .unwrap();

    fixture
        .server
        .delete(&format!("/api/manage/courses/{}", course.id))
        .add_header(header::AUTHORIZATION, basic(INSTRUCTOR))
        .await
        .assert_status(StatusCode::CONFLICT);
}

// =============================================================================
// ADMIN TESTS
// =============================================================================

#[tokio::test]
async fn test_admin_routes_absent_without_key() {
    let fixture = create_test_server();

    fixture
        .server
        .get("/api/admin/stats")
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_requires_key() {
    let fixture = create_test_server_with(test_config(Some(API_KEY)));

    fixture
        .server
        .get("/api/admin/stats")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    fixture
        .server
        .get("/api/admin/stats")
        .add_header(header::AUTHORIZATION, bearer("wrong-key"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let stats: Value = fixture
        .server
        .get("/api/admin/stats")
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .await
        .json();
    assert_eq!(stats["users"], 3);
    assert_eq!(stats["subjects"], 1);
}

#[tokio::test]
async fn test_admin_manages_subjects_and_users() {
    let fixture = create_test_server_with(test_config(Some(API_KEY)));

    let subject = fixture
        .server
        .post("/api/admin/subjects")
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .json(&json!({ "title": "Computer Science" }))
        .await;
    subject.assert_status(StatusCode::CREATED);
    let subject: SubjectResponse = subject.json();
    assert_eq!(subject.slug, "computer-science");

    let user = fixture
        .server
        .post("/api/admin/users")
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .json(&json!({ "username": "prof", "password": "prof-password", "role": "instructor" }))
        .await;
    user.assert_status(StatusCode::CREATED);
    let user: UserResponse = user.json();
    assert_eq!(user.role, "instructor");

    fixture
        .server
        .post("/api/admin/users")
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .json(&json!({ "username": "boss", "password": "boss-password", "role": "admin" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    fixture
        .server
        .delete(&format!("/api/admin/subjects/{}", subject.id))
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let page: Page<SubjectResponse> = fixture.server.get("/api/subjects").await.json();
    assert_eq!(page.count, 1);
}

#[tokio::test]
async fn test_admin_searches_messages() {
    let fixture = create_test_server_with(test_config(Some(API_KEY)));
    let course = create_course(&fixture, "Algebra").await;
    enroll(&fixture, course.id, STUDENT).await;
    for text in ["Hello there", "general kenobi", "HELLO again"] {
        fixture
            .store()
            .append_message(fixture.student.id, CourseId(course.id), text)
            .unwrap();
    }

    let page: Page<Value> = fixture
        .server
        .get("/api/admin/messages")
        .add_query_param("course", course.id)
        .add_query_param("search", "hello")
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .await
        .json();

    assert_eq!(page.count, 2);
    assert_eq!(page.results[0]["content"], "HELLO again");
    assert_eq!(page.results[0]["user"], STUDENT.0);

    let later = (chrono::Utc::now() + chrono::Duration::hours(1))
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let none_yet: Page<Value> = fixture
        .server
        .get("/api/admin/messages")
        .add_query_param("since", &later)
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .await
        .json();
    assert_eq!(none_yet.count, 0);

    let all_before: Page<Value> = fixture
        .server
        .get("/api/admin/messages")
        .add_query_param("until", &later)
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .await
        .json();
    assert_eq!(all_before.count, 3);

    fixture
        .server
        .get("/api/admin/messages")
        .add_query_param("since", "yesterday")
        .add_header(header::AUTHORIZATION, bearer(API_KEY))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// RATE LIMIT TESTS
// =============================================================================

#[tokio::test]
async fn test_rate_limit_rejects_bursts() {
    let config = ServerConfig {
        rate_limit: 1,
        ..test_config(None)
    };
    let fixture = create_test_server_with(config);

    fixture.server.get("/health").await.assert_status_ok();
    fixture
        .server
        .get("/health")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
