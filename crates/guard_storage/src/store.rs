#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use guard_contracts::auth::{AccountStatus, PasswordDigest, Username, UserRecord};
use guard_contracts::history::{HistoryRecord, HistoryRecordInput, ScanEventId};
use guard_contracts::scan::CorrelationId;
use guard_contracts::{ContractViolation, Validate};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    DuplicateKey { table: &'static str, key: String },
    ForeignKeyViolation { table: &'static str, key: String },
    AppendOnlyViolation { table: &'static str },
    ContractViolation(ContractViolation),
}

impl From<ContractViolation> for StorageError {
    fn from(v: ContractViolation) -> Self {
        StorageError::ContractViolation(v)
    }
}

/// sha2-256 of the supplied credential, lowercase hex. The plaintext never
/// reaches a table.
pub fn password_digest_hex(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardStoreConfig {
    pub max_history_rows: usize,
}

impl GuardStoreConfig {
    pub fn mvp_v1() -> Self {
        Self {
            max_history_rows: 500_000,
        }
    }
}

/// Deterministic in-memory store backing the persistence collaborator
/// contract: a user-account table and an append-only scan-history ledger.
#[derive(Debug, Clone)]
pub struct GuardStore {
    config: GuardStoreConfig,
    users: BTreeMap<Username, UserRecord>,
    history_rows: Vec<HistoryRecord>,
    next_scan_event_id: u64,
    history_idempotency_index: BTreeMap<(CorrelationId, String), ScanEventId>,
}

impl GuardStore {
    pub fn new_in_memory() -> Self {
        Self::with_config(GuardStoreConfig::mvp_v1())
    }

    pub fn with_config(config: GuardStoreConfig) -> Self {
        Self {
            config,
            users: BTreeMap::new(),
            history_rows: Vec::new(),
            next_scan_event_id: 1,
            history_idempotency_index: BTreeMap::new(),
        }
    }

    /// Fails with `DuplicateKey` when the username is taken; the table is
    /// untouched on every error path.
    pub fn insert_user_row(&mut self, record: UserRecord) -> Result<(), StorageError> {
        record.validate()?;
        if self.users.contains_key(&record.username) {
            return Err(StorageError::DuplicateKey {
                table: "users",
                key: record.username.as_str().to_string(),
            });
        }
        self.users.insert(record.username.clone(), record);
        Ok(())
    }

    pub fn get_user_row(&self, username: &Username) -> Option<&UserRecord> {
        self.users.get(username)
    }

    /// Digest comparison only; unknown or disabled accounts verify false.
    pub fn verify_credentials(&self, username: &Username, password: &str) -> bool {
        let Some(record) = self.users.get(username) else {
            return false;
        };
        if record.status != AccountStatus::Active {
            return false;
        }
        match PasswordDigest::new(password_digest_hex(password)) {
            Ok(digest) => digest == record.password_digest,
            Err(_) => false,
        }
    }

    pub fn append_history_row(
        &mut self,
        input: HistoryRecordInput,
    ) -> Result<ScanEventId, StorageError> {
        input.validate()?;
        if !self.users.contains_key(&input.username) {
            return Err(StorageError::ForeignKeyViolation {
                table: "scan_history",
                key: input.username.as_str().to_string(),
            });
        }
        if self.history_rows.len() >= self.config.max_history_rows {
            return Err(StorageError::ContractViolation(
                ContractViolation::InvalidValue {
                    field: "guard_store.history_rows",
                    reason: "max_history_rows exceeded",
                },
            ));
        }

        if let Some(key) = &input.idempotency_key {
            if let Some(existing) = self
                .history_idempotency_index
                .get(&(input.correlation_id, key.clone()))
            {
                return Ok(*existing);
            }
        }

        let scan_event_id = ScanEventId(self.next_scan_event_id);
        self.next_scan_event_id = self.next_scan_event_id.saturating_add(1);

        let record = HistoryRecord::from_input_v1(scan_event_id, input.clone())?;
        if let Some(key) = input.idempotency_key {
            self.history_idempotency_index
                .insert((input.correlation_id, key), scan_event_id);
        }
        self.history_rows.push(record);
        Ok(scan_event_id)
    }

    pub fn history_rows(&self) -> &[HistoryRecord] {
        &self.history_rows
    }

    /// The spec's history view: newest first, ties broken by id descending.
    pub fn history_rows_desc(&self) -> Vec<HistoryRecord> {
        let mut rows = self.history_rows.clone();
        rows.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then(b.scan_event_id.cmp(&a.scan_event_id))
        });
        rows
    }

    pub fn history_rows_by_user(&self, username: &Username) -> Vec<HistoryRecord> {
        self.history_rows
            .iter()
            .filter(|row| &row.username == username)
            .cloned()
            .collect()
    }

    /// The ledger is append-only; there is no update path by construction,
    /// and this guard documents the invariant for callers that probe it.
    pub fn attempt_overwrite_history_row(
        &self,
        _scan_event_id: ScanEventId,
    ) -> Result<(), StorageError> {
        Err(StorageError::AppendOnlyViolation {
            table: "scan_history",
        })
    }
}
