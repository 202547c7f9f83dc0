#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use filegate_contracts::{AccessKey, KeyRecord, QuotaLimits};
use filegate_core::{AdmissionRuntime, Ledger, UploadAdmission};
use filegate_storage::{SnapshotError, SnapshotStore};

fn temp_statefile(tag: &str) -> PathBuf {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock must be >= unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("filegate_snapshot_{tag}_{seed}.json"))
}

fn key(token: &str) -> AccessKey {
    AccessKey::new(token).unwrap()
}

fn seeded(entries: &[(&str, u32, u32)]) -> Ledger {
    let mut records = BTreeMap::new();
    for (token, uploads, issued) in entries {
        records.insert(
            key(token),
            KeyRecord {
                uploaded_file_count: *uploads,
                issued_key_count: *issued,
            },
        );
    }
    Ledger::from_records(records)
}

#[test]
fn at_snapshot_01_missing_file_loads_an_empty_ledger() {
    let store = SnapshotStore::new(temp_statefile("missing"));
    let ledger = store.load().expect("missing snapshot is the first-run case");
    assert!(ledger.is_empty());
    assert!(!ledger.is_dirty());
}

#[test]
fn at_snapshot_02_round_trip_preserves_key_set_and_counters() {
    let path = temp_statefile("round_trip");
    let store = SnapshotStore::new(path.clone());
    let runtime = AdmissionRuntime::new(QuotaLimits::mvp_v1());

    let mut ledger = seeded(&[("abc123", 0, 0), ("def456", 4, 2)]);
    assert_eq!(
        runtime.try_register_upload(&mut ledger, &key("abc123")),
        UploadAdmission::Admitted
    );
    assert!(store.flush_if_dirty(&mut ledger).unwrap());
    assert!(!ledger.is_dirty());

    let reloaded = store.load().expect("snapshot must parse back");
    assert_eq!(reloaded.records(), ledger.records());
    assert_eq!(reloaded.record(&key("abc123")).unwrap().uploaded_file_count, 1);

    let _ = std::fs::remove_file(path);
}

#[test]
fn at_snapshot_03_corrupt_snapshot_fails_with_corrupt_state() {
    let path = temp_statefile("corrupt");
    std::fs::write(&path, "{not json").unwrap();
    let store = SnapshotStore::new(path.clone());

    match store.load() {
        Err(SnapshotError::CorruptState { .. }) => {}
        other => panic!("expected CorruptState, got {other:?}"),
    }

    let _ = std::fs::remove_file(path);
}

#[test]
fn at_snapshot_04_invalid_access_key_in_snapshot_is_corrupt_state() {
    let path = temp_statefile("bad_key");
    std::fs::write(
        &path,
        r#"{"": {"uploadedFileCount": 0, "issuedKeyCount": 0}}"#,
    )
    .unwrap();
    let store = SnapshotStore::new(path.clone());

    match store.load() {
        Err(SnapshotError::CorruptState { detail, .. }) => {
            assert!(detail.contains("invalid access key"));
        }
        other => panic!("expected CorruptState, got {other:?}"),
    }

    let _ = std::fs::remove_file(path);
}

#[test]
fn at_snapshot_05_clean_ledger_flush_is_a_no_op() {
    let path = temp_statefile("idle");
    let store = SnapshotStore::new(path.clone());

    let mut ledger = seeded(&[("abc123", 1, 0)]);
    assert!(!store.flush_if_dirty(&mut ledger).unwrap());
    assert!(!path.exists());

    // Even with a snapshot already on disk, a clean ledger never rewrites it.
    std::fs::write(&path, "sentinel").unwrap();
    assert!(!store.flush_if_dirty(&mut ledger).unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "sentinel");

    let _ = std::fs::remove_file(path);
}

#[test]
fn at_snapshot_06_unconditional_flush_writes_even_when_clean() {
    let path = temp_statefile("unconditional");
    let store = SnapshotStore::new(path.clone());

    let mut ledger = seeded(&[("abc123", 3, 1)]);
    assert!(!ledger.is_dirty());
    store.flush(&mut ledger).unwrap();

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.records(), ledger.records());

    let _ = std::fs::remove_file(path);
}

#[test]
fn at_snapshot_07_snapshot_uses_wire_field_names_and_leaves_no_tmp_behind() {
    let path = temp_statefile("fields");
    let store = SnapshotStore::new(path.clone());

    let mut ledger = seeded(&[("abc123", 2, 5)]);
    store.flush(&mut ledger).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"uploadedFileCount\":2"));
    assert!(raw.contains("\"issuedKeyCount\":5"));

    let mut tmp = path.clone().into_os_string();
    tmp.push(".tmp");
    assert!(!PathBuf::from(tmp).exists());

    let _ = std::fs::remove_file(path);
}

#[test]
fn at_snapshot_08_spec_seed_snapshot_parses() {
    let path = temp_statefile("seed");
    std::fs::write(
        &path,
        r#"{"abc123": {"uploadedFileCount":0,"issuedKeyCount":0}}"#,
    )
    .unwrap();
    let store = SnapshotStore::new(path.clone());

    let ledger = store.load().unwrap();
    assert_eq!(ledger.record(&key("abc123")).unwrap(), &KeyRecord::fresh());

    let _ = std::fs::remove_file(path);
}
