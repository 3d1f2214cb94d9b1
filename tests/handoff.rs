use chrono::{Duration, TimeZone, Utc};
use std::fs;
use streamchat::handoff::{
    handoff_key, FilesystemPromptStore, MemoryPromptStore, PendingPrompt, PromptHandoff,
    PromptStore,
};
use tempfile::TempDir;

#[test]
fn test_handoff_key_format() {
    assert_eq!(handoff_key("abc-123"), "chat-initial-abc-123");
}

#[test]
fn test_fresh_prompt_is_delivered_once() {
    let store = MemoryPromptStore::new();
    let handoff = PromptHandoff::new(store.clone());

    handoff.publish("S1", "plan a trip").unwrap();
    assert!(store.contains("chat-initial-S1"));

    assert_eq!(handoff.consume("S1"), Some("plan a trip".to_string()));
    assert!(store.is_empty());
    assert_eq!(handoff.consume("S1"), None);
}

#[test]
fn test_stored_record_uses_epoch_millis() {
    let store = MemoryPromptStore::new();
    let handoff = PromptHandoff::new(store.clone());
    let created_at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

    handoff.publish_at("S1", "  hello  ", created_at).unwrap();

    let raw = store.take("chat-initial-S1").unwrap().unwrap();
    let record: PendingPrompt = serde_json::from_str(&raw).unwrap();
    assert_eq!(
        record,
        PendingPrompt {
            content: "hello".to_string(),
            timestamp: 1_700_000_000_000,
        }
    );
}

#[test]
fn test_expired_prompt_is_discarded_and_removed() {
    let store = MemoryPromptStore::new();
    let handoff = PromptHandoff::new(store.clone());
    let created_at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

    handoff.publish_at("S1", "stale", created_at).unwrap();
    let now = created_at + Duration::milliseconds(400_000);

    assert_eq!(handoff.consume_at("S1", now), None);
    assert!(!store.contains("chat-initial-S1"));
}

#[test]
fn test_prompt_at_ttl_boundary_is_still_fresh() {
    let store = MemoryPromptStore::new();
    let handoff = PromptHandoff::new(store);
    let created_at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

    handoff.publish_at("S1", "just in time", created_at).unwrap();
    let now = created_at + Duration::minutes(5);

    assert_eq!(
        handoff.consume_at("S1", now),
        Some("just in time".to_string())
    );
}

#[test]
fn test_corrupt_entry_is_discarded_and_removed() {
    let store = MemoryPromptStore::new();
    store.put("chat-initial-S1", "{not json").unwrap();
    let handoff = PromptHandoff::new(store.clone());

    assert_eq!(handoff.consume("S1"), None);
    assert!(store.is_empty());
}

#[test]
fn test_blank_prompt_is_rejected() {
    let store = MemoryPromptStore::new();
    let handoff = PromptHandoff::new(store.clone());

    assert!(handoff.publish("S1", "   ").is_err());
    assert!(store.is_empty());
}

#[test]
fn test_prompts_are_scoped_to_their_session() {
    let handoff = PromptHandoff::new(MemoryPromptStore::new());
    handoff.publish("S1", "first").unwrap();
    handoff.publish("S2", "second").unwrap();

    assert_eq!(handoff.consume("S2"), Some("second".to_string()));
    assert_eq!(handoff.consume("S1"), Some("first".to_string()));
}

#[test]
fn test_filesystem_store_round_trip_across_instances() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("handoff");

    let publisher = PromptHandoff::new(FilesystemPromptStore::with_dir(&dir));
    publisher.publish("S1", "from another process").unwrap();
    assert!(dir.join("chat-initial-S1.json").exists());

    let consumer = PromptHandoff::new(FilesystemPromptStore::with_dir(&dir));
    assert_eq!(
        consumer.consume("S1"),
        Some("from another process".to_string())
    );
    assert_eq!(consumer.consume("S1"), None);
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
}

#[test]
fn test_filesystem_store_take_missing_key() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemPromptStore::with_dir(temp_dir.path());

    assert_eq!(store.take("chat-initial-nothing").unwrap(), None);
    assert!(!store.contains("chat-initial-nothing"));
}

#[test]
fn test_filesystem_store_rejects_path_like_keys() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemPromptStore::with_dir(temp_dir.path());

    assert!(store.put("../escape", "x").is_err());
    assert!(store.put("", "x").is_err());
    assert!(store.take("a/b").is_err());
    assert!(!store.contains("../escape"));
}

#[test]
fn test_filesystem_expired_entry_is_removed() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemPromptStore::with_dir(temp_dir.path());
    let handoff = PromptHandoff::new(store);
    let created_at = Utc::now() - Duration::minutes(10);

    handoff.publish_at("S1", "old", created_at).unwrap();
    assert_eq!(handoff.consume("S1"), None);
    assert!(!handoff.store().contains("chat-initial-S1"));
}

#[test]
fn test_clear_removes_all_pending_prompts() {
    let temp_dir = TempDir::new().unwrap();
    let handoff = PromptHandoff::new(FilesystemPromptStore::with_dir(temp_dir.path()));
    handoff.publish("S1", "one").unwrap();
    handoff.publish("S2", "two").unwrap();

    handoff.clear().unwrap();

    assert_eq!(handoff.consume("S1"), None);
    assert_eq!(handoff.consume("S2"), None);
}

#[test]
fn test_clear_on_missing_directory_is_ok() {
    let temp_dir = TempDir::new().unwrap();
    let store = FilesystemPromptStore::with_dir(temp_dir.path().join("never-created"));
    assert!(store.clear().is_ok());
}
