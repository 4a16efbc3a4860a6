use super::*;
use tempfile::tempdir;

fn put(table: &str, key: &str, value: serde_json::Value) -> WalOp {
    WalOp::Put {
        table: table.to_string(),
        key: key.to_string(),
        value,
    }
}

#[test]
fn append_then_flush_persists_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();

    wal.append(&put("jobs", "j1", serde_json::json!({"id": "j1"})))
        .unwrap();
    wal.flush().unwrap();

    let entries = wal.entries_after(0).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].seq, 1);
}

#[test]
fn needs_flush_once_threshold_reached() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();
    assert!(!wal.needs_flush());
    for i in 0..100 {
        wal.append(&put("jobs", &i.to_string(), serde_json::json!(i)))
            .unwrap();
    }
    assert!(wal.needs_flush());
}

#[test]
fn reopen_after_flush_recovers_write_seq() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&put("jobs", "j1", serde_json::json!(1))).unwrap();
        wal.append(&put("jobs", "j2", serde_json::json!(2))).unwrap();
        wal.flush().unwrap();
    }

    let wal = Wal::open(&path, 0).unwrap();
    assert_eq!(wal.write_seq(), 2);
}

#[test]
fn corrupt_tail_is_rotated_to_bak_and_valid_entries_survive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    {
        let mut wal = Wal::open(&path, 0).unwrap();
        wal.append(&put("jobs", "j1", serde_json::json!(1))).unwrap();
        wal.flush().unwrap();
    }
    // Corrupt the tail by appending an invalid line.
    {
        use std::io::Write;
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(f, "not json").unwrap();
    }

    let wal = Wal::open(&path, 0).unwrap();
    assert_eq!(wal.write_seq(), 1);
    assert!(dir.path().join("wal.bak").exists());
}

#[test]
fn truncate_before_drops_earlier_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.jsonl");
    let mut wal = Wal::open(&path, 0).unwrap();
    for i in 1..=3u64 {
        wal.append(&put("jobs", &i.to_string(), serde_json::json!(i)))
            .unwrap();
    }
    wal.flush().unwrap();
    wal.mark_processed(2);
    wal.truncate_before(2).unwrap();

    let remaining = wal.entries_after(0).unwrap();
    assert_eq!(remaining.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![2, 3]);
}
