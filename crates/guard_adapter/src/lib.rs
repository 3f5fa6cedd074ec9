#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL;
use base64::Engine;
use guard_contracts::MonotonicTimeNs;
use guard_os::scan_session::{GuardTurnReply, ScanSessionRuntime};
use guard_os::scan_turn::{ScanClassifier, ScanTurnConfig};
use guard_os::session::{login, register_account, AuthError, SessionContext};
use guard_storage::store::GuardStore;
use sha2::{Digest, Sha256};

pub type BoxedClassifier = Box<dyn ScanClassifier + Send>;

#[derive(Debug, Clone, PartialEq)]
pub enum AdapterError {
    Unauthorized,
    UsernameExists,
    InvalidCredentials,
    InvalidInput(String),
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub reason: Option<String>,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            reason: None,
        }
    }

    pub fn error(reason: String) -> Self {
        Self {
            status: "error".to_string(),
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegisterAdapterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoginAdapterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoginAdapterResponse {
    pub status: String,
    pub session_token: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogoutAdapterRequest {
    pub session_token: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScanTurnAdapterRequest {
    pub session_token: String,
    pub message: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ScanTurnAdapterResponse {
    pub status: String,
    pub outcome: String,
    pub reply_text: Option<String>,
    pub label: Option<String>,
    pub confidence_pct: Option<f32>,
    pub report: Option<String>,
    pub impact: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HistoryRowDto {
    pub recorded_at_ns: u64,
    pub message: String,
    pub label: String,
    pub confidence_pct: f32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HistoryAdapterResponse {
    pub status: String,
    pub rows: Vec<HistoryRowDto>,
}

/// One process-wide runtime behind the HTTP surface: the scan pipeline, the
/// in-memory store, and the live session-token table. Tokens are opaque and
/// per-login; sessions die with the process, like the UI framework flag they
/// replace, but each one is an explicit object.
pub struct AdapterRuntime {
    runtime: ScanSessionRuntime<BoxedClassifier>,
    sessions: BTreeMap<String, SessionContext>,
    token_seq: u64,
}

impl AdapterRuntime {
    pub fn new(classifier: BoxedClassifier) -> Self {
        Self {
            runtime: ScanSessionRuntime::new(
                ScanTurnConfig::mvp_v1(),
                classifier,
                GuardStore::new_in_memory(),
            ),
            sessions: BTreeMap::new(),
            token_seq: 0,
        }
    }

    pub fn register(
        &mut self,
        req: &RegisterAdapterRequest,
        now_ns: u64,
    ) -> Result<StatusResponse, AdapterError> {
        register_account(
            self.runtime.store_mut(),
            &req.username,
            &req.password,
            MonotonicTimeNs(now_ns),
        )
        .map_err(adapter_error_from_auth)?;
        Ok(StatusResponse::ok())
    }

    pub fn login(
        &mut self,
        req: &LoginAdapterRequest,
        now_ns: u64,
    ) -> Result<LoginAdapterResponse, AdapterError> {
        let session = login(
            self.runtime.store(),
            &req.username,
            &req.password,
            MonotonicTimeNs(now_ns),
        )
        .map_err(adapter_error_from_auth)?;

        self.token_seq = self.token_seq.saturating_add(1);
        let token = issue_session_token(&req.username, now_ns, self.token_seq);
        self.sessions.insert(token.clone(), session);
        Ok(LoginAdapterResponse {
            status: "ok".to_string(),
            session_token: Some(token),
            reason: None,
        })
    }

    pub fn logout(&mut self, token: &str, now_ns: u64) -> Result<StatusResponse, AdapterError> {
        let mut session = self
            .sessions
            .remove(token)
            .ok_or(AdapterError::Unauthorized)?;
        session
            .logout(MonotonicTimeNs(now_ns))
            .map_err(|v| AdapterError::Internal(format!("{v:?}")))?;
        Ok(StatusResponse::ok())
    }

    pub fn scan_turn(
        &mut self,
        req: &ScanTurnAdapterRequest,
        now_ns: u64,
    ) -> Result<ScanTurnAdapterResponse, AdapterError> {
        let mut session = self
            .sessions
            .remove(&req.session_token)
            .ok_or(AdapterError::Unauthorized)?;

        let reply = self
            .runtime
            .submit_turn(&mut session, &req.message, MonotonicTimeNs(now_ns));
        self.sessions.insert(req.session_token.clone(), session);

        let reply = reply.map_err(|v| AdapterError::InvalidInput(format!("{v:?}")))?;
        Ok(scan_turn_response(reply))
    }

    pub fn history(&self, token: &str) -> Result<HistoryAdapterResponse, AdapterError> {
        if !self.sessions.contains_key(token) {
            return Err(AdapterError::Unauthorized);
        }
        let rows = self
            .runtime
            .store()
            .history_rows_desc()
            .into_iter()
            .map(|row| HistoryRowDto {
                recorded_at_ns: row.recorded_at.0,
                message: row.message.as_str().to_string(),
                label: row.label.as_str().to_string(),
                confidence_pct: row.confidence.value(),
            })
            .collect();
        Ok(HistoryAdapterResponse {
            status: "ok".to_string(),
            rows,
        })
    }
}

fn adapter_error_from_auth(err: AuthError) -> AdapterError {
    match err {
        AuthError::UsernameExists => AdapterError::UsernameExists,
        AuthError::InvalidCredentials => AdapterError::InvalidCredentials,
        AuthError::Contract(v) => AdapterError::InvalidInput(format!("{v:?}")),
        AuthError::Storage(e) => AdapterError::Internal(format!("{e:?}")),
    }
}

fn scan_turn_response(reply: GuardTurnReply) -> ScanTurnAdapterResponse {
    match reply {
        GuardTurnReply::Conversational { reply_text, .. } => ScanTurnAdapterResponse {
            status: "ok".to_string(),
            outcome: "CONVERSATIONAL".to_string(),
            reply_text: Some(reply_text),
            label: None,
            confidence_pct: None,
            report: None,
            impact: None,
            reason: None,
        },
        GuardTurnReply::Scanned { verdict } => ScanTurnAdapterResponse {
            status: "ok".to_string(),
            outcome: "SCANNED".to_string(),
            reply_text: None,
            label: Some(verdict.label.as_str().to_string()),
            confidence_pct: Some(verdict.confidence.value()),
            report: Some(verdict.report),
            impact: Some(verdict.impact),
            reason: None,
        },
        GuardTurnReply::Refused { reject } => ScanTurnAdapterResponse {
            status: "error".to_string(),
            outcome: "REFUSED".to_string(),
            reply_text: None,
            label: None,
            confidence_pct: None,
            report: None,
            impact: None,
            reason: Some(reject.detail),
        },
    }
}

fn issue_session_token(username: &str, now_ns: u64, seq: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(now_ns.to_be_bytes());
    hasher.update(seq.to_be_bytes());
    BASE64_URL.encode(hasher.finalize())
}
