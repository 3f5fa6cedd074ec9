#![forbid(unsafe_code)]

use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const GUARD_AUTH_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(raw: impl Into<String>) -> Result<Self, ContractViolation> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "username",
                reason: "must not be empty",
            });
        }
        if raw.len() > 64 {
            return Err(ContractViolation::InvalidValue {
                field: "username",
                reason: "must be <= 64 chars",
            });
        }
        if !raw.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ContractViolation::InvalidValue {
                field: "username",
                reason: "must be printable ASCII without whitespace",
            });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for Username {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.is_empty() || self.0.len() > 64 {
            return Err(ContractViolation::InvalidValue {
                field: "username",
                reason: "must be 1..=64 chars",
            });
        }
        if !self.0.chars().all(|c| c.is_ascii_graphic()) {
            return Err(ContractViolation::InvalidValue {
                field: "username",
                reason: "must be printable ASCII without whitespace",
            });
        }
        Ok(())
    }
}

/// A sha2-256 digest of the credential, lowercase hex. The plaintext
/// password never appears in any contract type and is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn new(hex: impl Into<String>) -> Result<Self, ContractViolation> {
        let hex = hex.into();
        let d = Self(hex);
        d.validate()?;
        Ok(d)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for PasswordDigest {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.len() != 64 {
            return Err(ContractViolation::InvalidValue {
                field: "password_digest",
                reason: "must be 64 hex chars",
            });
        }
        if !self
            .0
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(ContractViolation::InvalidValue {
                field: "password_digest",
                reason: "must be lowercase hex",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    Active,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub schema_version: SchemaVersion,
    pub username: Username,
    pub password_digest: PasswordDigest,
    pub created_at: MonotonicTimeNs,
    pub status: AccountStatus,
}

impl UserRecord {
    pub fn v1(
        username: Username,
        password_digest: PasswordDigest,
        created_at: MonotonicTimeNs,
        status: AccountStatus,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: GUARD_AUTH_CONTRACT_VERSION,
            username,
            password_digest,
            created_at,
            status,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for UserRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != GUARD_AUTH_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "user_record.schema_version",
                reason: "must match GUARD_AUTH_CONTRACT_VERSION",
            });
        }
        self.username.validate()?;
        self.password_digest.validate()?;
        Ok(())
    }
}
