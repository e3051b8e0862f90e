//! # Educa CLI Module
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP/WebSocket server
//! - `init` - Initialize a new database
//! - `status` - Show record counts
//! - `create-user` - Create an account
//! - `create-subject` - Create a subject
//! - `subjects` - List subjects with their course counts
//! - `messages` - Show the latest messages of a course chat room

mod commands;

use crate::config::ServerConfig;
use clap::{Parser, Subcommand};
use educa_core::EducaError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Educa - e-learning server
///
/// Subjects, courses with ordered modules and contents, enrollment and
/// per-course chat rooms.
#[derive(Parser, Debug)]
#[command(name = "educa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the catalog database
    #[arg(short = 'D', long, global = true, default_value = "educa.redb")]
    pub database: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show record counts
    Status,

    /// Create an account
    CreateUser {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        /// Role (student, instructor)
        #[arg(short, long, default_value = "student")]
        role: String,
    },

    /// Create a subject
    CreateSubject {
        #[arg(short, long)]
        title: String,

        /// Slug (derived from the title when omitted)
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// List subjects with their course counts
    Subjects,

    /// Show the latest messages of a course chat room
    Messages {
        /// Course ID
        #[arg(long)]
        course: u64,

        /// Number of messages to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli, config: ServerConfig) -> Result<(), EducaError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&cli.database, config, &host, port).await
        }
        Some(Commands::Init { force }) => cmd_init(&cli.database, force),
        Some(Commands::Status) => cmd_status(&cli.database, json_mode),
        Some(Commands::CreateUser {
            username,
            password,
            role,
        }) => cmd_create_user(&cli.database, json_mode, &username, &password, &role),
        Some(Commands::CreateSubject { title, slug }) => {
            cmd_create_subject(&cli.database, json_mode, &title, slug.as_deref())
        }
        Some(Commands::Subjects) => cmd_subjects(&cli.database, json_mode),
        Some(Commands::Messages { course, limit }) => {
            cmd_messages(&cli.database, json_mode, course, limit)
        }
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.database, json_mode)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
