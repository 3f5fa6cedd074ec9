#![forbid(unsafe_code)]

use crate::{ContractViolation, ReasonCodeId, SchemaVersion, Validate};

pub const GUARD_VERDICT_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Small-talk categories that bypass classification entirely. Greeting is
/// checked before WellBeing; the first matching category wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ConversationalIntent {
    Greeting,
    WellBeing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum VerdictLabel {
    Safe,
    PhishingSpam,
}

impl VerdictLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::PhishingSpam => "PHISHING/SPAM",
        }
    }
}

/// Displayed confidence in percent. Construction rounds to 2 decimals so
/// identical inputs always render and persist identically.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ConfidencePct(f32);

impl ConfidencePct {
    pub fn new(value: f32) -> Result<Self, ContractViolation> {
        if !value.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "confidence_pct",
            });
        }
        let rounded = (value * 100.0).round() / 100.0;
        if !(0.0..=100.0).contains(&rounded) {
            return Err(ContractViolation::InvalidRange {
                field: "confidence_pct",
                min: 0.0,
                max: 100.0,
                got: rounded as f64,
            });
        }
        Ok(Self(rounded))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Validate for ConfidencePct {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !self.0.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "confidence_pct",
            });
        }
        if !(0.0..=100.0).contains(&self.0) {
            return Err(ContractViolation::InvalidRange {
                field: "confidence_pct",
                min: 0.0,
                max: 100.0,
                got: self.0 as f64,
            });
        }
        Ok(())
    }
}

/// Final decision for one non-conversational submission: label, displayed
/// confidence, the explainability report, and the impact statement. The
/// reason code names the branch that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub schema_version: SchemaVersion,
    pub label: VerdictLabel,
    pub confidence: ConfidencePct,
    pub report: String,
    pub impact: String,
    pub reason_code: ReasonCodeId,
}

impl Verdict {
    pub fn v1(
        label: VerdictLabel,
        confidence: ConfidencePct,
        report: String,
        impact: String,
        reason_code: ReasonCodeId,
    ) -> Result<Self, ContractViolation> {
        let v = Self {
            schema_version: GUARD_VERDICT_CONTRACT_VERSION,
            label,
            confidence,
            report,
            impact,
            reason_code,
        };
        v.validate()?;
        Ok(v)
    }
}

impl Validate for Verdict {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != GUARD_VERDICT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "verdict.schema_version",
                reason: "must match GUARD_VERDICT_CONTRACT_VERSION",
            });
        }
        self.confidence.validate()?;
        if self.report.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "verdict.report",
                reason: "must not be empty",
            });
        }
        if self.report.len() > 512 {
            return Err(ContractViolation::InvalidValue {
                field: "verdict.report",
                reason: "must be <= 512 chars",
            });
        }
        if self.impact.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "verdict.impact",
                reason: "must not be empty",
            });
        }
        if self.impact.len() > 1024 {
            return Err(ContractViolation::InvalidValue {
                field: "verdict.impact",
                reason: "must be <= 1024 chars",
            });
        }
        if self.reason_code.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "verdict.reason_code",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

/// Fail-closed refusal for one request. Carries an operator-safe detail,
/// never the submitted text and never a fabricated verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReject {
    pub schema_version: SchemaVersion,
    pub reason_code: ReasonCodeId,
    pub detail: String,
}

impl ScanReject {
    pub fn v1(reason_code: ReasonCodeId, detail: String) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: GUARD_VERDICT_CONTRACT_VERSION,
            reason_code,
            detail,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for ScanReject {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != GUARD_VERDICT_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "scan_reject.schema_version",
                reason: "must match GUARD_VERDICT_CONTRACT_VERSION",
            });
        }
        if self.reason_code.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "scan_reject.reason_code",
                reason: "must be > 0",
            });
        }
        if self.detail.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "scan_reject.detail",
                reason: "must not be empty",
            });
        }
        if self.detail.len() > 256 {
            return Err(ContractViolation::InvalidValue {
                field: "scan_reject.detail",
                reason: "must be <= 256 chars",
            });
        }
        Ok(())
    }
}
