#![forbid(unsafe_code)]

pub mod auth;
pub mod common;
pub mod history;
pub mod provider_secrets;
pub mod scan;
pub mod verdict;

pub use common::{
    ContractViolation, MonotonicTimeNs, ReasonCodeId, SchemaVersion, SessionState, Validate,
};
