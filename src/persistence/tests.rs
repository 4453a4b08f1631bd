use super::{EntryKind, EntryLogs, Journal, LogEntry};
use std::sync::Arc;
use tempfile::tempdir;

fn entry(kind: EntryKind, text: &str, timestamp: i64) -> LogEntry {
    LogEntry {
        kind,
        nick: "alice".to_string(),
        text: text.to_string(),
        timestamp,
    }
}

#[test]
fn test_append_and_list_entries_in_order() {
    let dir = tempdir().unwrap();
    let journal = Journal::open(dir.path()).unwrap();

    journal.append(&entry(EntryKind::Success, "second", 2_000)).unwrap();
    journal.append(&entry(EntryKind::Success, "first", 1_000)).unwrap();

    let texts: Vec<_> = journal
        .entries(EntryKind::Success)
        .unwrap()
        .into_iter()
        .map(|e| e.text)
        .collect();
    assert_eq!(texts, vec!["first", "second"]);
}

#[test]
fn test_kinds_are_kept_apart() {
    let dir = tempdir().unwrap();
    let journal = Journal::open(dir.path()).unwrap();

    journal.append(&entry(EntryKind::Thanks, "to bob", 1_000)).unwrap();

    assert!(journal.entries(EntryKind::Success).unwrap().is_empty());
    assert_eq!(journal.entries(EntryKind::Thanks).unwrap().len(), 1);
}

#[test]
fn test_same_millisecond_entries_are_both_kept() {
    let dir = tempdir().unwrap();
    let journal = Journal::open(dir.path()).unwrap();

    journal.append(&entry(EntryKind::Success, "a", 5)).unwrap();
    journal.append(&entry(EntryKind::Success, "b", 5)).unwrap();

    assert_eq!(journal.entries(EntryKind::Success).unwrap().len(), 2);
}

#[tokio::test]
async fn test_journal_as_entry_log() {
    let dir = tempdir().unwrap();
    let journal = Arc::new(Journal::open(dir.path()).unwrap());
    let mut logs = EntryLogs::default();
    logs.register_all(journal.clone());

    for sink in logs.for_kind(EntryKind::Thanks) {
        sink.record(&LogEntry::now(EntryKind::Thanks, "bob", "for the fix"))
            .await
            .unwrap();
    }

    let thanks = journal.entries(EntryKind::Thanks).unwrap();
    assert_eq!(thanks.len(), 1);
    assert_eq!(thanks[0].nick, "bob");
    assert_eq!(logs.for_kind(EntryKind::Success).len(), 1);
}

#[test]
fn test_entry_serializes_kind_lowercase() {
    let json = serde_json::to_value(entry(EntryKind::Success, "x", 1)).unwrap();
    assert_eq!(json["kind"], "success");
}
