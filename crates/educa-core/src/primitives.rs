//! # Catalog Limits
//!
//! Hardcoded limits shared by validation, storage and the HTTP layer.
//! They mirror the column sizes of the catalog records.

/// Maximum length of subject, course and module titles.
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum length of content item titles.
pub const MAX_ITEM_TITLE_LENGTH: usize = 250;

/// Maximum length of subject and course slugs.
pub const MAX_SLUG_LENGTH: usize = 200;

/// Maximum length of usernames.
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Minimum length of passwords.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum length of a single chat message.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

/// Maximum length of free-text fields (overviews, descriptions, text items).
pub const MAX_TEXT_LENGTH: usize = 65536;

/// Default number of results per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound a client can request with `page_size`.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Number of recent messages shown when entering a chat room.
pub const CHAT_HISTORY_LIMIT: usize = 5;

/// Number of courses listed as "popular" per subject.
pub const POPULAR_COURSES_LIMIT: usize = 3;

/// Rounds of keyed BLAKE3 applied when hashing a password.
pub const PASSWORD_HASH_ROUNDS: u32 = 100_000;

/// Maximum number of entries accepted in one reorder request.
pub const MAX_REORDER_ENTRIES: usize = 1000;
