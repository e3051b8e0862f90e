//! # CLI Command Implementations

use crate::api;
use crate::config::ServerConfig;
use educa_core::{CourseId, EducaError, Role, Store, catalog};
use std::path::Path;

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    config: ServerConfig,
    host: &str,
    port: u16,
) -> Result<(), EducaError> {
    let store = open_store(db_path)?;

    println!("Educa Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", host);
    println!("  Port:       {}", port);
    println!("  Database:   {:?}", db_path);
    println!("  Rate limit: {} req/s", config.rate_limit);
    println!("  Cache TTL:  {} s", config.cache_ttl_secs);
    println!(
        "  Admin API:  {}",
        if config.admin_key().is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!();
    println!("Endpoints:");
    println!("  GET  /api/subjects            - Browse subjects");
    println!("  GET  /api/courses             - Browse courses");
    println!("  POST /api/courses/{{id}}/enroll - Enroll");
    println!("  *    /api/manage/...          - Instructor course management");
    println!("  GET  /ws/chat/room/{{id}}       - Course chat");
    println!("  GET  /health                  - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, store, config).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new database.
pub fn cmd_init(db_path: &Path, force: bool) -> Result<(), EducaError> {
    if db_path.exists() {
        if !force {
            return Err(EducaError::Conflict(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| EducaError::Io(format!("Cannot remove {:?}: {}", db_path, e)))?;
    }

    let _store = Store::open(db_path)?;
    println!("Initialized new database at {:?}", db_path);
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show record counts.
pub fn cmd_status(db_path: &Path, json_mode: bool) -> Result<(), EducaError> {
    let store = open_store(db_path)?;
    let stats = store.stats()?;

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "stats": stats,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Educa Status");
    println!("============");
    println!("Database:    {:?}", db_path);
    println!();
    println!("Users:       {}", stats.users);
    println!("Subjects:    {}", stats.subjects);
    println!("Courses:     {}", stats.courses);
    println!("Modules:     {}", stats.modules);
    println!("Contents:    {}", stats.contents);
    println!("Enrollments: {}", stats.enrollments);
    println!("Messages:    {}", stats.messages);

    Ok(())
}

// =============================================================================
// ACCOUNT / CATALOG COMMANDS
// =============================================================================

/// Create an account with the given role.
pub fn cmd_create_user(
    db_path: &Path,
    json_mode: bool,
    username: &str,
    password: &str,
    role: &str,
) -> Result<(), EducaError> {
    let role = Role::parse(role)?;
    let store = open_store(db_path)?;
    let user = store.create_user(username, password, role)?;

    if json_mode {
        print_json(&serde_json::json!({
            "id": user.id,
            "username": user.username,
            "role": user.role.as_str(),
        }));
    } else {
        println!(
            "Created {} '{}' (id {})",
            user.role.as_str(),
            user.username,
            user.id
        );
    }
    Ok(())
}

/// Create a subject.
pub fn cmd_create_subject(
    db_path: &Path,
    json_mode: bool,
    title: &str,
    slug: Option<&str>,
) -> Result<(), EducaError> {
    let store = open_store(db_path)?;
    let subject = store.create_subject(title, slug)?;

    if json_mode {
        print_json(&serde_json::json!({
            "id": subject.id,
            "title": subject.title,
            "slug": subject.slug,
        }));
    } else {
        println!(
            "Created subject '{}' ({}) with id {}",
            subject.title, subject.slug, subject.id
        );
    }
    Ok(())
}

/// List subjects, alphabetically, with course counts.
pub fn cmd_subjects(db_path: &Path, json_mode: bool) -> Result<(), EducaError> {
    let store = open_store(db_path)?;
    let summaries = catalog::subject_summaries(&store)?;

    if json_mode {
        let output: Vec<serde_json::Value> = summaries
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.subject.id,
                    "title": s.subject.title,
                    "slug": s.subject.slug,
                    "total_courses": s.total_courses,
                })
            })
            .collect();
        print_json(&serde_json::Value::Array(output));
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No subjects.");
        return Ok(());
    }
    for summary in &summaries {
        println!(
            "{:>4}  {:<30} {:<20} {} courses",
            summary.subject.id, summary.subject.title, summary.subject.slug, summary.total_courses
        );
    }
    Ok(())
}

// =============================================================================
// MESSAGES COMMAND
// =============================================================================

/// Show the latest messages of a course chat room, oldest first.
pub fn cmd_messages(
    db_path: &Path,
    json_mode: bool,
    course: u64,
    limit: usize,
) -> Result<(), EducaError> {
    let store = open_store(db_path)?;
    let course = CourseId(course);
    if store.course(course)?.is_none() {
        return Err(EducaError::not_found("course", course));
    }

    let messages = store.latest_messages(course, limit)?;
    let mut lines = Vec::with_capacity(messages.len());
    for message in messages {
        let username = store
            .user(message.user)?
            .map(|u| u.username)
            .unwrap_or_default();
        lines.push((message, username));
    }

    if json_mode {
        let output: Vec<serde_json::Value> = lines
            .iter()
            .map(|(message, username)| {
                serde_json::json!({
                    "id": message.id,
                    "user": username,
                    "content": message.content,
                    "sent_on": message.sent_on.to_rfc3339(),
                })
            })
            .collect();
        print_json(&serde_json::Value::Array(output));
        return Ok(());
    }

    for (message, username) in &lines {
        println!(
            "[{}] {}: {}",
            message.sent_on.format("%Y-%m-%d %H:%M:%S"),
            username,
            message.content
        );
    }
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the database, creating it if missing.
pub fn open_store(db_path: &Path) -> Result<Store, EducaError> {
    Store::open(db_path)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// TESTS
// =============================================================================
