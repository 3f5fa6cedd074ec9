#![forbid(unsafe_code)]

use crate::{ContractViolation, SchemaVersion, Validate};

pub const GUARD_SCAN_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const MAX_SCAN_TEXT_CHARS: usize = 4_096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationId(pub u64);

impl Validate for CorrelationId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "correlation_id",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

/// One pasted message or URL. Holds the raw text and the lower-cased copy
/// used for all substring matching, built once at construction.
///
/// Empty and whitespace-only submissions are rejected here, before any
/// classifier is consulted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanText {
    raw: String,
    lowered: String,
}

impl ScanText {
    pub fn new(raw: impl Into<String>) -> Result<Self, ContractViolation> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "scan_text",
                reason: "must not be empty or whitespace-only",
            });
        }
        if raw.chars().count() > MAX_SCAN_TEXT_CHARS {
            return Err(ContractViolation::InvalidValue {
                field: "scan_text",
                reason: "must be <= 4096 chars",
            });
        }
        let lowered = raw.to_lowercase();
        Ok(Self { raw, lowered })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lower-cased matching copy. Unanchored `contains` checks run against
    /// this, never against the raw text.
    pub fn lowered(&self) -> &str {
        &self.lowered
    }
}

impl Validate for ScanText {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.raw.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "scan_text",
                reason: "must not be empty or whitespace-only",
            });
        }
        if self.raw.chars().count() > MAX_SCAN_TEXT_CHARS {
            return Err(ContractViolation::InvalidValue {
                field: "scan_text",
                reason: "must be <= 4096 chars",
            });
        }
        if self.lowered != self.raw.to_lowercase() {
            return Err(ContractViolation::InvalidValue {
                field: "scan_text.lowered",
                reason: "must be the lower-cased raw text",
            });
        }
        Ok(())
    }
}

/// Ephemeral, one per user submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub schema_version: SchemaVersion,
    pub correlation_id: CorrelationId,
    pub text: ScanText,
}

impl ScanRequest {
    pub fn v1(correlation_id: CorrelationId, text: ScanText) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: GUARD_SCAN_CONTRACT_VERSION,
            correlation_id,
            text,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for ScanRequest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != GUARD_SCAN_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "scan_request.schema_version",
                reason: "must match GUARD_SCAN_CONTRACT_VERSION",
            });
        }
        self.correlation_id.validate()?;
        self.text.validate()?;
        Ok(())
    }
}

/// Closed label set of the external spam classifier: the positive/spam label
/// and everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ClassifierLabel {
    Spam,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierScore(pub f32);

impl ClassifierScore {
    pub fn new(value: f32) -> Result<Self, ContractViolation> {
        let s = Self(value);
        s.validate()?;
        Ok(s)
    }
}

impl Validate for ClassifierScore {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !self.0.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "classifier_score",
            });
        }
        if !(0.0..=1.0).contains(&self.0) {
            return Err(ContractViolation::InvalidRange {
                field: "classifier_score",
                min: 0.0,
                max: 1.0,
                got: self.0 as f64,
            });
        }
        Ok(())
    }
}

/// Read-only input to the verdict engine; produced by the external
/// classifier before `evaluate` ever runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierResult {
    pub schema_version: SchemaVersion,
    pub label: ClassifierLabel,
    pub score: ClassifierScore,
}

impl ClassifierResult {
    pub fn v1(label: ClassifierLabel, score: ClassifierScore) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: GUARD_SCAN_CONTRACT_VERSION,
            label,
            score,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for ClassifierResult {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != GUARD_SCAN_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "classifier_result.schema_version",
                reason: "must match GUARD_SCAN_CONTRACT_VERSION",
            });
        }
        self.score.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_text_rejects_empty_and_whitespace() {
        assert!(ScanText::new("").is_err());
        assert!(ScanText::new("   \t\n").is_err());
    }

    #[test]
    fn scan_text_keeps_a_lowered_matching_copy() {
        let t = ScanText::new("URGENT: Visit Google.COM now").unwrap();
        assert_eq!(t.as_str(), "URGENT: Visit Google.COM now");
        assert_eq!(t.lowered(), "urgent: visit google.com now");
    }

    #[test]
    fn classifier_score_bounds_are_enforced() {
        assert!(ClassifierScore::new(0.0).is_ok());
        assert!(ClassifierScore::new(1.0).is_ok());
        assert!(ClassifierScore::new(1.01).is_err());
        assert!(ClassifierScore::new(f32::NAN).is_err());
    }

    #[test]
    fn scan_request_requires_nonzero_correlation() {
        let text = ScanText::new("hello").unwrap();
        assert!(ScanRequest::v1(CorrelationId(0), text.clone()).is_err());
        assert!(ScanRequest::v1(CorrelationId(7), text).is_ok());
    }
}
