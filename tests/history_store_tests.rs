// Integration tests for history persistence

use anyhow::Result;
use mock_interview::history::{
    FileHistoryStorage, HistorySession, HistoryStore, MemoryHistoryStorage, UNRECORDED_PREVIEW,
};
use mock_interview::{Message, Phase, Topic};
use tempfile::TempDir;

const KEY: &str = "interview_history";

fn session(id: &str, start_time: i64, messages: Vec<Message>) -> HistorySession {
    HistorySession {
        id: id.to_string(),
        topic: Topic::Redis,
        start_time,
        messages,
        preview: String::new(),
        phase: Some(Phase::AwaitingAnswer),
        current_question: None,
    }
}

fn asked(question: &str) -> Vec<Message> {
    vec![Message::user_text("ready"), Message::ai_text(question)]
}

#[test]
fn test_upsert_is_idempotent() -> Result<()> {
    let storage = MemoryHistoryStorage::new();
    let mut store = HistoryStore::open(Box::new(storage.clone()), KEY);

    let record = session("s1", 1_000, asked("What is a cache stampede?"));
    store.upsert(record.clone());
    let first_blob = storage.get(KEY).expect("blob written");
    store.upsert(record);

    assert_eq!(store.len(), 1);
    assert_eq!(storage.get(KEY).expect("blob written"), first_blob);

    Ok(())
}

#[test]
fn test_update_keeps_start_time_and_position() -> Result<()> {
    let mut store = HistoryStore::open(Box::new(MemoryHistoryStorage::new()), KEY);
    store.upsert(session("s1", 1_000, asked("Q1")));
    store.upsert(session("s2", 2_000, asked("Q2")));

    let mut longer = asked("Q1");
    longer.push(Message::user_text("an answer"));
    let updated = store
        .upsert(session("s1", 9_999, longer))
        .expect("non-empty session stored");
    assert_eq!(updated.start_time, 1_000);
    assert_eq!(updated.messages.len(), 3);

    let ids: Vec<&str> = store.sessions().iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2"]);

    Ok(())
}

#[test]
fn test_preview_precedence() -> Result<()> {
    let mut store = HistoryStore::open(Box::new(MemoryHistoryStorage::new()), KEY);

    // Explicit question wins
    let mut record = session("s1", 1, asked("From the log"));
    record.current_question = Some("Explicit question".to_string());
    assert_eq!(store.upsert(record).map(|s| s.preview.clone()).as_deref(), Some("Explicit question"));

    // Without one, the prior preview is kept
    let record = session("s1", 1, asked("Something else"));
    assert_eq!(store.upsert(record).map(|s| s.preview.clone()).as_deref(), Some("Explicit question"));

    // New record with no question: first AI text
    let record = session("s2", 2, asked("From the log"));
    assert_eq!(store.upsert(record).map(|s| s.preview.clone()).as_deref(), Some("From the log"));

    // Nothing usable at all
    let record = session("s3", 3, vec![Message::user_text("ready")]);
    assert_eq!(
        store.upsert(record).map(|s| s.preview.clone()).as_deref(),
        Some(UNRECORDED_PREVIEW)
    );

    // The sentinel never blocks a real question found later
    let record = session("s3", 3, asked("Late question"));
    assert_eq!(store.upsert(record).map(|s| s.preview.clone()).as_deref(), Some("Late question"));

    Ok(())
}

#[test]
fn test_long_preview_is_truncated() -> Result<()> {
    let mut store = HistoryStore::open(Box::new(MemoryHistoryStorage::new()), KEY);
    let question = "How would you design a rate limiter that works across many data centers?";

    let stored = store.upsert(session("s1", 1, asked(question))).expect("stored");
    assert_eq!(stored.preview.chars().count(), 63);
    assert!(stored.preview.ends_with("..."));
    assert!(question.starts_with(stored.preview.trim_end_matches("...")));

    Ok(())
}

#[test]
fn test_empty_session_is_refused() -> Result<()> {
    let storage = MemoryHistoryStorage::new();
    let mut store = HistoryStore::open(Box::new(storage.clone()), KEY);

    assert!(store.upsert(session("s1", 1, Vec::new())).is_none());
    assert!(store.is_empty());
    assert!(storage.get(KEY).is_none());

    Ok(())
}

#[test]
fn test_corrupt_blob_loads_empty() -> Result<()> {
    let storage = MemoryHistoryStorage::new();
    storage.insert(KEY, "{not json");

    let mut store = HistoryStore::open(Box::new(storage.clone()), KEY);
    assert!(store.is_empty());

    // The next write replaces the corrupt blob
    store.upsert(session("s1", 1, asked("Q1")));
    let reopened = HistoryStore::open(Box::new(storage), KEY);
    assert_eq!(reopened.len(), 1);

    Ok(())
}

#[test]
fn test_file_storage_survives_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let data_dir = temp_dir.path().join("nested").join("history");

    let mut store = HistoryStore::open(Box::new(FileHistoryStorage::new(&data_dir)?), KEY);
    store.upsert(session("s1", 1_000, asked("What is MVCC?")));
    store.upsert(session("s2", 2_000, asked("What is a B+ tree?")));

    let path = FileHistoryStorage::new(&data_dir)?.path_for(KEY);
    assert!(path.exists(), "blob written to {}", path.display());

    let reopened = HistoryStore::open(Box::new(FileHistoryStorage::new(&data_dir)?), KEY);
    assert_eq!(reopened.len(), 2);
    let s1 = reopened.get("s1").expect("s1 stored");
    assert_eq!(s1.preview, "What is MVCC?");
    assert_eq!(s1.phase, Some(Phase::AwaitingAnswer));
    assert_eq!(s1.start_time, 1_000);
    assert_eq!(s1.messages.len(), 2);
    assert_eq!(s1.messages[1].content, "What is MVCC?");

    Ok(())
}

#[test]
fn test_stored_records_use_camel_case() -> Result<()> {
    let storage = MemoryHistoryStorage::new();
    let mut store = HistoryStore::open(Box::new(storage.clone()), KEY);
    let mut record = session("s1", 1_000, asked("Q1"));
    record.current_question = Some("Q1".to_string());
    store.upsert(record);

    let blob: serde_json::Value = serde_json::from_str(&storage.get(KEY).expect("blob written"))?;
    let stored = &blob[0];
    assert_eq!(stored["startTime"], 1_000);
    assert_eq!(stored["topic"], "REDIS");
    assert_eq!(stored["phase"], "AWAITING_ANSWER");
    assert_eq!(stored["currentQuestion"], "Q1");
    assert_eq!(stored["messages"][1]["sender"], "AI");
    assert_eq!(stored["messages"][1]["type"], "TEXT");

    Ok(())
}
