#![forbid(unsafe_code)]

use guard_contracts::auth::{AccountStatus, PasswordDigest, Username, UserRecord};
use guard_contracts::MonotonicTimeNs;
use guard_storage::repo::UserAccountRepo;
use guard_storage::store::{password_digest_hex, GuardStore, StorageError};

fn user(name: &str) -> Username {
    Username::new(name).unwrap()
}

fn record(name: &str, password: &str, status: AccountStatus) -> UserRecord {
    UserRecord::v1(
        user(name),
        PasswordDigest::new(password_digest_hex(password)).unwrap(),
        MonotonicTimeNs(1),
        status,
    )
    .unwrap()
}

// Everything below goes through the repo trait: this file verifies the
// wiring the os layer programs against, not the store's inherent surface.
fn insert<R: UserAccountRepo>(repo: &mut R, row: UserRecord) -> Result<(), StorageError> {
    repo.insert_user_row(row)
}

fn verify<R: UserAccountRepo>(repo: &R, name: &str, password: &str) -> bool {
    repo.verify_credentials(&user(name), password)
}

#[test]
fn at_users_db_01_insert_then_lookup() {
    let mut s = GuardStore::new_in_memory();
    insert(&mut s, record("dbw_user_1", "pw-one", AccountStatus::Active))
        .unwrap();

    let row = s.get_user_row(&user("dbw_user_1")).unwrap();
    assert_eq!(row.username, user("dbw_user_1"));
    assert_eq!(row.status, AccountStatus::Active);
}

#[test]
fn at_users_db_02_duplicate_username_is_a_typed_error_with_no_state_change() {
    let mut s = GuardStore::new_in_memory();
    insert(&mut s, record("dbw_user_2", "first-pw", AccountStatus::Active))
        .unwrap();

    let err = s
        .insert_user_row(record("dbw_user_2", "second-pw", AccountStatus::Active))
        .unwrap_err();
    assert!(matches!(err, StorageError::DuplicateKey { table: "users", .. }));

    // Original credentials still verify: the failed insert changed nothing.
    assert!(verify(&s, "dbw_user_2", "first-pw"));
    assert!(!verify(&s, "dbw_user_2", "second-pw"));
}

#[test]
fn at_users_db_03_verify_credentials_compares_digests() {
    let mut s = GuardStore::new_in_memory();
    insert(&mut s, record("dbw_user_3", "s3cret", AccountStatus::Active))
        .unwrap();

    assert!(verify(&s, "dbw_user_3", "s3cret"));
    assert!(!verify(&s, "dbw_user_3", "S3CRET"));
    assert!(!verify(&s, "dbw_user_3", ""));
    assert!(!verify(&s, "nobody", "s3cret"));
}

#[test]
fn at_users_db_04_disabled_accounts_never_verify() {
    let mut s = GuardStore::new_in_memory();
    insert(&mut s, record("dbw_user_4", "pw", AccountStatus::Disabled))
        .unwrap();
    assert!(!verify(&s, "dbw_user_4", "pw"));
}

#[test]
fn at_users_db_05_plaintext_never_lands_in_the_row() {
    let mut s = GuardStore::new_in_memory();
    insert(&mut s, record("dbw_user_5", "hunter2", AccountStatus::Active))
        .unwrap();
    let row = s.get_user_row(&user("dbw_user_5")).unwrap();
    assert_ne!(row.password_digest.as_str(), "hunter2");
    assert_eq!(row.password_digest.as_str().len(), 64);
}
