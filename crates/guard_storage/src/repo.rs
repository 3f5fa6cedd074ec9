#![forbid(unsafe_code)]

use guard_contracts::auth::{Username, UserRecord};
use guard_contracts::history::{HistoryRecord, HistoryRecordInput, ScanEventId};

use crate::store::{GuardStore, StorageError};

/// Typed repository interface for the user-account table.
pub trait UserAccountRepo {
    fn insert_user_row(&mut self, record: UserRecord) -> Result<(), StorageError>;
    fn get_user_row(&self, username: &Username) -> Option<&UserRecord>;
    fn verify_credentials(&self, username: &Username, password: &str) -> bool;
}

/// Typed repository interface for the append-only scan-history ledger.
pub trait ScanHistoryRepo {
    fn append_history_row(&mut self, input: HistoryRecordInput)
        -> Result<ScanEventId, StorageError>;
    fn history_rows(&self) -> &[HistoryRecord];
    fn history_rows_desc(&self) -> Vec<HistoryRecord>;
    fn history_rows_by_user(&self, username: &Username) -> Vec<HistoryRecord>;
}

impl UserAccountRepo for GuardStore {
    fn insert_user_row(&mut self, record: UserRecord) -> Result<(), StorageError> {
        GuardStore::insert_user_row(self, record)
    }

    fn get_user_row(&self, username: &Username) -> Option<&UserRecord> {
        GuardStore::get_user_row(self, username)
    }

    fn verify_credentials(&self, username: &Username, password: &str) -> bool {
        GuardStore::verify_credentials(self, username, password)
    }
}

impl ScanHistoryRepo for GuardStore {
    fn append_history_row(
        &mut self,
        input: HistoryRecordInput,
    ) -> Result<ScanEventId, StorageError> {
        GuardStore::append_history_row(self, input)
    }

    fn history_rows(&self) -> &[HistoryRecord] {
        GuardStore::history_rows(self)
    }

    fn history_rows_desc(&self) -> Vec<HistoryRecord> {
        GuardStore::history_rows_desc(self)
    }

    fn history_rows_by_user(&self, username: &Username) -> Vec<HistoryRecord> {
        GuardStore::history_rows_by_user(self, username)
    }
}
