//! # Listing Cache
//!
//! Subject and course listings are the hottest reads and change rarely, so
//! they are kept in a moka cache with a TTL. Writes that change a listing
//! call [`CatalogCache::invalidate`].
//!
//! Keys: `all_subjects`, `all_courses`, `subject_{id}_courses`.
//!
//! Entries are stored under `(generation, key)`. Every invalidation bumps the
//! generation, so a listing loaded before a write lands under a generation
//! no reader asks for again and is never served.

use educa_core::{CourseSummary, EducaError, SubjectId, SubjectSummary};
use moka::future::Cache;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Upper bound on cached listings (one per subject plus two).
const MAX_ENTRIES: u64 = 1024;

#[derive(Debug, Clone)]
pub struct CatalogCache {
    subjects: Cache<(u64, String), Arc<Vec<SubjectSummary>>>,
    courses: Cache<(u64, String), Arc<Vec<CourseSummary>>>,
    generation: Arc<AtomicU64>,
}

impl CatalogCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            subjects: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
            courses: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// All subject summaries, computed by `load` on a miss.
    pub async fn subjects(
        &self,
        load: impl FnOnce() -> Result<Vec<SubjectSummary>, EducaError>,
    ) -> Result<Arc<Vec<SubjectSummary>>, EducaError> {
        let key = (self.generation.load(Ordering::Acquire), "all_subjects".to_string());
        if let Some(cached) = self.subjects.get(&key).await {
            tracing::debug!(event = "cache_hit", key = %key.1);
            return Ok(cached);
        }
        let fresh = Arc::new(load()?);
        self.subjects.insert(key, Arc::clone(&fresh)).await;
        Ok(fresh)
    }

    /// Course summaries, optionally of one subject, computed by `load` on a miss.
    pub async fn courses(
        &self,
        subject: Option<SubjectId>,
        load: impl FnOnce() -> Result<Vec<CourseSummary>, EducaError>,
    ) -> Result<Arc<Vec<CourseSummary>>, EducaError> {
        let key = (self.generation.load(Ordering::Acquire), courses_key(subject));
        if let Some(cached) = self.courses.get(&key).await {
            tracing::debug!(event = "cache_hit", key = %key.1);
            return Ok(cached);
        }
        let fresh = Arc::new(load()?);
        self.courses.insert(key, Arc::clone(&fresh)).await;
        Ok(fresh)
    }

    /// Drop every cached listing, including any still being loaded.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.subjects.invalidate_all();
        self.courses.invalidate_all();
        tracing::debug!(event = "cache_invalidated");
    }
}

fn courses_key(subject: Option<SubjectId>) -> String {
    match subject {
        Some(id) => format!("subject_{id}_courses"),
        None => "all_courses".to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
