//! Session history persistence
//!
//! All sessions live in one JSON blob under a fixed storage key. The blob is
//! read once at startup and rewritten in full after every upsert.

mod storage;
mod store;

pub use storage::{FileHistoryStorage, HistoryStorage, MemoryHistoryStorage};
pub use store::{
    truncate_preview, HistorySession, HistoryStore, PREVIEW_MAX_CHARS, UNRECORDED_PREVIEW,
};

/// Storage key used when none is configured
pub const DEFAULT_STORAGE_KEY: &str = "interview_history";
