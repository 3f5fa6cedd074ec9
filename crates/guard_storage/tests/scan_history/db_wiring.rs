#![forbid(unsafe_code)]

use guard_contracts::auth::{AccountStatus, PasswordDigest, Username, UserRecord};
use guard_contracts::history::{HistoryRecordInput, ScanEventId};
use guard_contracts::scan::{CorrelationId, ScanText};
use guard_contracts::verdict::{ConfidencePct, VerdictLabel};
use guard_contracts::MonotonicTimeNs;
use guard_storage::repo::ScanHistoryRepo;
use guard_storage::store::{password_digest_hex, GuardStore, StorageError};

fn user(name: &str) -> Username {
    Username::new(name).unwrap()
}

fn store_with_user(name: &str) -> GuardStore {
    let mut s = GuardStore::new_in_memory();
    s.insert_user_row(
        UserRecord::v1(
            user(name),
            PasswordDigest::new(password_digest_hex("pw")).unwrap(),
            MonotonicTimeNs(1),
            AccountStatus::Active,
        )
        .unwrap(),
    )
    .unwrap();
    s
}

// Appends go through the repo trait so this file pins the seam the os layer
// programs against.
fn append<R: ScanHistoryRepo>(
    repo: &mut R,
    row: HistoryRecordInput,
) -> Result<ScanEventId, StorageError> {
    repo.append_history_row(row)
}

fn input(
    username: &str,
    correlation: u64,
    t: u64,
    label: VerdictLabel,
    confidence: f32,
    idempotency_key: Option<&str>,
) -> HistoryRecordInput {
    HistoryRecordInput::v1(
        MonotonicTimeNs(t),
        CorrelationId(correlation),
        user(username),
        ScanText::new("you won a prize").unwrap(),
        label,
        ConfidencePct::new(confidence).unwrap(),
        "3b".repeat(32),
        idempotency_key.map(ToString::to_string),
    )
    .unwrap()
}

#[test]
fn at_hist_db_01_append_assigns_monotonic_ids() {
    let mut s = store_with_user("hist_user_1");
    let a = append(
        &mut s,
        input("hist_user_1", 9001, 10, VerdictLabel::PhishingSpam, 92.5, None),
    )
    .unwrap();
    let b = append(
        &mut s,
        input("hist_user_1", 9002, 20, VerdictLabel::Safe, 42.0, None),
    )
    .unwrap();
    assert_eq!(a, ScanEventId(1));
    assert_eq!(b, ScanEventId(2));
    assert_eq!(s.history_rows().len(), 2);
}

#[test]
fn at_hist_db_02_idempotent_append_dedupes() {
    let mut s = store_with_user("hist_user_2");
    let a = append(
        &mut s,
        input("hist_user_2", 9003, 10, VerdictLabel::Safe, 10.0, Some("turn_1")),
    )
    .unwrap();
    let b = append(
        &mut s,
        input("hist_user_2", 9003, 10, VerdictLabel::Safe, 10.0, Some("turn_1")),
    )
    .unwrap();
    assert_eq!(a, b);
    assert_eq!(s.history_rows().len(), 1);
}

#[test]
fn at_hist_db_03_rows_come_back_ordered_by_timestamp_desc() {
    let mut s = store_with_user("hist_user_3");
    for (correlation, t) in [(1u64, 10u64), (2, 30), (3, 20)] {
        append(
            &mut s,
            input("hist_user_3", correlation, t, VerdictLabel::Safe, 50.0, None),
        )
        .unwrap();
    }

    let rows = s.history_rows_desc();
    let times: Vec<u64> = rows.iter().map(|r| r.recorded_at.0).collect();
    assert_eq!(times, vec![30, 20, 10]);
}

#[test]
fn at_hist_db_04_unknown_user_is_a_foreign_key_violation() {
    let mut s = store_with_user("hist_user_4");
    let err = append(
        &mut s,
        input("ghost_user", 9004, 10, VerdictLabel::Safe, 1.0, None),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        StorageError::ForeignKeyViolation {
            table: "scan_history",
            ..
        }
    ));
    assert!(s.history_rows().is_empty());
}

#[test]
fn at_hist_db_05_overwrite_is_refused() {
    let mut s = store_with_user("hist_user_5");
    let id = append(
        &mut s,
        input("hist_user_5", 9005, 10, VerdictLabel::PhishingSpam, 92.5, None),
    )
    .unwrap();
    assert!(matches!(
        s.attempt_overwrite_history_row(id),
        Err(StorageError::AppendOnlyViolation {
            table: "scan_history"
        })
    ));
}

#[test]
fn at_hist_db_06_per_user_view_is_scoped() {
    let mut s = store_with_user("hist_user_6a");
    s.insert_user_row(
        UserRecord::v1(
            user("hist_user_6b"),
            PasswordDigest::new(password_digest_hex("pw")).unwrap(),
            MonotonicTimeNs(1),
            AccountStatus::Active,
        )
        .unwrap(),
    )
    .unwrap();

    append(
        &mut s,
        input("hist_user_6a", 1, 10, VerdictLabel::Safe, 5.0, None),
    )
    .unwrap();
    append(
        &mut s,
        input("hist_user_6b", 2, 20, VerdictLabel::Safe, 5.0, None),
    )
    .unwrap();
    append(
        &mut s,
        input("hist_user_6a", 3, 30, VerdictLabel::Safe, 5.0, None),
    )
    .unwrap();

    let rows = s.history_rows_by_user(&user("hist_user_6a"));
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.username == user("hist_user_6a")));
}
