#![forbid(unsafe_code)]

use guard_contracts::auth::{AccountStatus, PasswordDigest, Username, UserRecord};
use guard_contracts::{ContractViolation, MonotonicTimeNs, SessionState};
use guard_storage::repo::UserAccountRepo;
use guard_storage::store::{password_digest_hex, StorageError};

/// Auth failures surfaced to the UI. Duplicate registration is its own
/// variant, never folded into generic storage failure.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    UsernameExists,
    InvalidCredentials,
    Contract(ContractViolation),
    Storage(StorageError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UsernameExists => write!(f, "Username exists."),
            Self::InvalidCredentials => write!(f, "Invalid credentials."),
            Self::Contract(_) => write!(f, "invalid input"),
            Self::Storage(_) => write!(f, "storage failure"),
        }
    }
}

impl From<ContractViolation> for AuthError {
    fn from(v: ContractViolation) -> Self {
        Self::Contract(v)
    }
}

/// Explicit per-session context threaded through every caller. Replaces the
/// process-global "logged in" flag: the engines never read session state,
/// and there is exactly one owner per interactive session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub username: Username,
    pub state: SessionState,
    pub opened_at: MonotonicTimeNs,
    pub last_activity_at: MonotonicTimeNs,
}

impl SessionContext {
    pub fn authenticated(username: Username, now: MonotonicTimeNs) -> Self {
        Self {
            username,
            state: SessionState::Authenticated,
            opened_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn touch(&mut self, now: MonotonicTimeNs) {
        if now > self.last_activity_at {
            self.last_activity_at = now;
        }
    }

    pub fn transition(
        &mut self,
        to: SessionState,
        now: MonotonicTimeNs,
    ) -> Result<(), ContractViolation> {
        if !is_allowed_session_transition(self.state, to) {
            return Err(ContractViolation::InvalidValue {
                field: "session_context.state",
                reason: "transition not allowed",
            });
        }
        self.state = to;
        self.touch(now);
        Ok(())
    }

    pub fn logout(&mut self, now: MonotonicTimeNs) -> Result<(), ContractViolation> {
        self.transition(SessionState::Anonymous, now)
    }
}

pub fn is_allowed_session_transition(from: SessionState, to: SessionState) -> bool {
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (SessionState::Anonymous, SessionState::Authenticated)
            | (SessionState::Anonymous, SessionState::Closed)
            | (SessionState::Authenticated, SessionState::Anonymous)
            | (SessionState::Authenticated, SessionState::Closed)
    )
}

/// Creates the account or fails with `UsernameExists`; the user table is
/// untouched on every error path.
pub fn register_account<R: UserAccountRepo>(
    repo: &mut R,
    username_raw: &str,
    password: &str,
    now: MonotonicTimeNs,
) -> Result<(), AuthError> {
    let username = Username::new(username_raw)?;
    if password.trim().is_empty() {
        return Err(AuthError::Contract(ContractViolation::InvalidValue {
            field: "password",
            reason: "must not be empty",
        }));
    }
    let digest = PasswordDigest::new(password_digest_hex(password))?;
    let record = UserRecord::v1(username, digest, now, AccountStatus::Active)?;
    match repo.insert_user_row(record) {
        Ok(()) => Ok(()),
        Err(StorageError::DuplicateKey { table: "users", .. }) => Err(AuthError::UsernameExists),
        Err(other) => Err(AuthError::Storage(other)),
    }
}

/// Verifies the credentials and opens an authenticated session context.
/// Wrong password and unknown username are indistinguishable to the caller.
pub fn login<R: UserAccountRepo>(
    repo: &R,
    username_raw: &str,
    password: &str,
    now: MonotonicTimeNs,
) -> Result<SessionContext, AuthError> {
    let username = Username::new(username_raw)?;
    if !repo.verify_credentials(&username, password) {
        return Err(AuthError::InvalidCredentials);
    }
    Ok(SessionContext::authenticated(username, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_storage::store::GuardStore;

    #[test]
    fn at_session_01_register_then_login_opens_authenticated_context() {
        let mut store = GuardStore::new_in_memory();
        register_account(&mut store, "asha", "pw-1", MonotonicTimeNs(1)).unwrap();

        let session = login(&store, "asha", "pw-1", MonotonicTimeNs(2)).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.username.as_str(), "asha");
    }

    #[test]
    fn at_session_02_duplicate_registration_is_username_exists() {
        let mut store = GuardStore::new_in_memory();
        register_account(&mut store, "asha", "pw-1", MonotonicTimeNs(1)).unwrap();
        let err = register_account(&mut store, "asha", "pw-2", MonotonicTimeNs(2)).unwrap_err();
        assert_eq!(err, AuthError::UsernameExists);
        assert_eq!(err.to_string(), "Username exists.");
    }

    #[test]
    fn at_session_03_wrong_password_and_unknown_user_read_the_same() {
        let mut store = GuardStore::new_in_memory();
        register_account(&mut store, "asha", "pw-1", MonotonicTimeNs(1)).unwrap();

        let wrong = login(&store, "asha", "nope", MonotonicTimeNs(2)).unwrap_err();
        let unknown = login(&store, "ghost", "pw-1", MonotonicTimeNs(2)).unwrap_err();
        assert_eq!(wrong, AuthError::InvalidCredentials);
        assert_eq!(unknown, AuthError::InvalidCredentials);
        assert_eq!(wrong.to_string(), "Invalid credentials.");
    }

    #[test]
    fn at_session_04_logout_transitions_back_to_anonymous() {
        let mut store = GuardStore::new_in_memory();
        register_account(&mut store, "asha", "pw-1", MonotonicTimeNs(1)).unwrap();
        let mut session = login(&store, "asha", "pw-1", MonotonicTimeNs(2)).unwrap();

        session.logout(MonotonicTimeNs(3)).unwrap();
        assert_eq!(session.state, SessionState::Anonymous);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn at_session_05_closed_sessions_cannot_reauthenticate() {
        let mut session =
            SessionContext::authenticated(Username::new("asha").unwrap(), MonotonicTimeNs(1));
        session
            .transition(SessionState::Closed, MonotonicTimeNs(2))
            .unwrap();
        assert!(session
            .transition(SessionState::Authenticated, MonotonicTimeNs(3))
            .is_err());
    }

    #[test]
    fn at_session_06_empty_password_is_rejected_before_storage() {
        let mut store = GuardStore::new_in_memory();
        let err = register_account(&mut store, "asha", "  ", MonotonicTimeNs(1)).unwrap_err();
        assert!(matches!(err, AuthError::Contract(_)));
        assert!(store.get_user_row(&Username::new("asha").unwrap()).is_none());
    }
}
