#![forbid(unsafe_code)]

use guard_contracts::history::HistoryRecordInput;
use guard_contracts::scan::{CorrelationId, ScanRequest, ScanText};
use guard_contracts::verdict::{ConversationalIntent, ScanReject, Verdict};
use guard_contracts::{ContractViolation, MonotonicTimeNs};
use guard_storage::store::GuardStore;
use sha2::{Digest, Sha256};

use crate::scan_turn::{
    reason_codes, ScanClassifier, ScanTurnConfig, ScanTurnOutcome, ScanTurnWiring,
};
use crate::session::SessionContext;

/// What one chat turn hands back to the UI collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardTurnReply {
    Conversational {
        intent: ConversationalIntent,
        reply_text: String,
    },
    Scanned {
        verdict: Verdict,
    },
    Refused {
        reject: ScanReject,
    },
}

/// Owns the turn pipeline plus the persistence discipline: exactly one
/// history append per scanned turn, none for conversational or refused
/// turns.
#[derive(Debug)]
pub struct ScanSessionRuntime<C>
where
    C: ScanClassifier,
{
    wiring: ScanTurnWiring<C>,
    store: GuardStore,
    next_correlation_id: u64,
}

impl<C> ScanSessionRuntime<C>
where
    C: ScanClassifier,
{
    pub fn new(config: ScanTurnConfig, classifier: C, store: GuardStore) -> Self {
        Self {
            wiring: ScanTurnWiring::new(config, classifier),
            store,
            next_correlation_id: 1,
        }
    }

    pub fn store(&self) -> &GuardStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut GuardStore {
        &mut self.store
    }

    /// Runs one chat turn for an authenticated session. Invalid text (empty,
    /// whitespace-only, oversized) surfaces as a contract error before any
    /// classification; unauthenticated sessions are refused.
    pub fn submit_turn(
        &mut self,
        session: &mut SessionContext,
        raw_text: &str,
        now: MonotonicTimeNs,
    ) -> Result<GuardTurnReply, ContractViolation> {
        if !session.is_authenticated() {
            return Ok(GuardTurnReply::Refused {
                reject: ScanReject::v1(
                    reason_codes::SCAN_SESSION_NOT_AUTHENTICATED,
                    "session is not authenticated".to_string(),
                )?,
            });
        }
        session.touch(now);

        let text = ScanText::new(raw_text)?;
        let correlation_id = CorrelationId(self.next_correlation_id);
        self.next_correlation_id = self.next_correlation_id.saturating_add(1);
        let req = ScanRequest::v1(correlation_id, text)?;

        match self.wiring.run_turn(&req)? {
            ScanTurnOutcome::Conversational(intent) => Ok(GuardTurnReply::Conversational {
                intent,
                reply_text: conversation_reply(intent, session.username.as_str()),
            }),
            ScanTurnOutcome::Scanned(verdict) => {
                let input = HistoryRecordInput::v1(
                    now,
                    req.correlation_id,
                    session.username.clone(),
                    req.text.clone(),
                    verdict.label,
                    verdict.confidence,
                    message_digest_hex(req.text.as_str()),
                    Some(format!("turn_{}", req.correlation_id.0)),
                )?;
                self.store
                    .append_history_row(input)
                    .map_err(|_| ContractViolation::InvalidValue {
                        field: "scan_session.history",
                        reason: "history append failed",
                    })?;
                Ok(GuardTurnReply::Scanned { verdict })
            }
            ScanTurnOutcome::Refused(reject) => Ok(GuardTurnReply::Refused { reject }),
        }
    }
}

/// Canned small-talk replies; the username is the only dynamic part.
pub fn conversation_reply(intent: ConversationalIntent, username: &str) -> String {
    match intent {
        ConversationalIntent::Greeting => format!(
            "Hello {username}! How can I help you today? If you have any suspicious links, paste them here and I'll analyze the impact for you."
        ),
        ConversationalIntent::WellBeing => {
            "I'm doing great! Ready to protect you from cybersecurity threats. What's on your mind?"
                .to_string()
        }
    }
}

fn message_digest_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
