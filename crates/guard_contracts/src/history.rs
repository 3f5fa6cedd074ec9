#![forbid(unsafe_code)]

use crate::auth::Username;
use crate::scan::{CorrelationId, ScanText};
use crate::verdict::{ConfidencePct, VerdictLabel};
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const GUARD_HISTORY_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanEventId(pub u64);

impl Validate for ScanEventId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "scan_event_id",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

fn validate_digest_hex(field: &'static str, digest: &str) -> Result<(), ContractViolation> {
    if digest.len() != 64 {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be 64 hex chars",
        });
    }
    if !digest
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be lowercase hex",
        });
    }
    Ok(())
}

/// One row to append to the scan-history ledger. Carries the final label and
/// the confidence actually chosen for the verdict: the floored value on the
/// phishing branch, the raw classifier confidence on both safe branches.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecordInput {
    pub schema_version: SchemaVersion,
    pub recorded_at: MonotonicTimeNs,
    pub correlation_id: CorrelationId,
    pub username: Username,
    pub message: ScanText,
    pub label: VerdictLabel,
    pub confidence: ConfidencePct,
    pub message_digest_hex: String,
    pub idempotency_key: Option<String>,
}

impl HistoryRecordInput {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        recorded_at: MonotonicTimeNs,
        correlation_id: CorrelationId,
        username: Username,
        message: ScanText,
        label: VerdictLabel,
        confidence: ConfidencePct,
        message_digest_hex: String,
        idempotency_key: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let i = Self {
            schema_version: GUARD_HISTORY_CONTRACT_VERSION,
            recorded_at,
            correlation_id,
            username,
            message,
            label,
            confidence,
            message_digest_hex,
            idempotency_key,
        };
        i.validate()?;
        Ok(i)
    }
}

impl Validate for HistoryRecordInput {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != GUARD_HISTORY_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "history_record_input.schema_version",
                reason: "must match GUARD_HISTORY_CONTRACT_VERSION",
            });
        }
        self.correlation_id.validate()?;
        self.username.validate()?;
        self.message.validate()?;
        self.confidence.validate()?;
        validate_digest_hex(
            "history_record_input.message_digest_hex",
            &self.message_digest_hex,
        )?;
        if let Some(key) = &self.idempotency_key {
            if key.trim().is_empty() {
                return Err(ContractViolation::InvalidValue {
                    field: "history_record_input.idempotency_key",
                    reason: "must not be empty when provided",
                });
            }
            if key.len() > 128 {
                return Err(ContractViolation::InvalidValue {
                    field: "history_record_input.idempotency_key",
                    reason: "must be <= 128 chars",
                });
            }
        }
        Ok(())
    }
}

/// Persisted ledger row. Append-only: rows are never mutated or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub schema_version: SchemaVersion,
    pub scan_event_id: ScanEventId,
    pub recorded_at: MonotonicTimeNs,
    pub correlation_id: CorrelationId,
    pub username: Username,
    pub message: ScanText,
    pub label: VerdictLabel,
    pub confidence: ConfidencePct,
    pub message_digest_hex: String,
}

impl HistoryRecord {
    pub fn from_input_v1(
        scan_event_id: ScanEventId,
        input: HistoryRecordInput,
    ) -> Result<Self, ContractViolation> {
        scan_event_id.validate()?;
        input.validate()?;
        Ok(Self {
            schema_version: GUARD_HISTORY_CONTRACT_VERSION,
            scan_event_id,
            recorded_at: input.recorded_at,
            correlation_id: input.correlation_id,
            username: input.username,
            message: input.message,
            label: input.label,
            confidence: input.confidence,
            message_digest_hex: input.message_digest_hex,
        })
    }
}

impl Validate for HistoryRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != GUARD_HISTORY_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "history_record.schema_version",
                reason: "must match GUARD_HISTORY_CONTRACT_VERSION",
            });
        }
        self.scan_event_id.validate()?;
        self.correlation_id.validate()?;
        self.username.validate()?;
        self.message.validate()?;
        self.confidence.validate()?;
        validate_digest_hex("history_record.message_digest_hex", &self.message_digest_hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> HistoryRecordInput {
        HistoryRecordInput::v1(
            MonotonicTimeNs(10),
            CorrelationId(1),
            Username::new("hist_user").unwrap(),
            ScanText::new("you won a prize").unwrap(),
            VerdictLabel::PhishingSpam,
            ConfidencePct::new(92.5).unwrap(),
            "0f".repeat(32),
            None,
        )
        .unwrap()
    }

    #[test]
    fn record_ids_must_be_positive() {
        assert!(HistoryRecord::from_input_v1(ScanEventId(0), input()).is_err());
        assert!(HistoryRecord::from_input_v1(ScanEventId(1), input()).is_ok());
    }

    #[test]
    fn digest_format_is_enforced() {
        let mut i = input();
        i.message_digest_hex = "not-hex".to_string();
        assert!(i.validate().is_err());
    }
}
