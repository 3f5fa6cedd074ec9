#![forbid(unsafe_code)]

use guard_contracts::scan::{ClassifierResult, ScanRequest, ScanText};
use guard_contracts::verdict::{ConversationalIntent, ScanReject, Verdict};
use guard_contracts::{ContractViolation, ReasonCodeId, Validate};
use guard_engines::intent::{IntentConfig, IntentRuntime};
use guard_engines::verdict::{VerdictConfig, VerdictRuntime};

pub mod reason_codes {
    use guard_contracts::ReasonCodeId;

    // Scan-turn wiring reason-code namespace.
    pub const SCAN_REQUEST_INVALID: ReasonCodeId = ReasonCodeId(0x5347_0001);
    pub const SCAN_CLASSIFIER_UNAVAILABLE: ReasonCodeId = ReasonCodeId(0x5347_0002);
    pub const SCAN_INTERNAL_PIPELINE_ERROR: ReasonCodeId = ReasonCodeId(0x5347_0003);
    pub const SCAN_SESSION_NOT_AUTHENTICATED: ReasonCodeId = ReasonCodeId(0x5347_0004);
}

/// The external classifier collaborator seam. The live implementation wraps
/// the hosted inference endpoint; tests substitute stubs.
pub trait ScanClassifier {
    fn classify(&self, text: &ScanText) -> Result<ClassifierResult, ClassifierUnavailable>;
}

impl<C: ScanClassifier + ?Sized> ScanClassifier for Box<C> {
    fn classify(&self, text: &ScanText) -> Result<ClassifierResult, ClassifierUnavailable> {
        (**self).classify(text)
    }
}

/// Hard failure of the classifier collaborator. The detail is operator-safe
/// (no message text, no credentials).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierUnavailable {
    pub detail: String,
}

impl ScanClassifier for guard_engines::classifier_client::LiveSpamClassifier {
    fn classify(&self, text: &ScanText) -> Result<ClassifierResult, ClassifierUnavailable> {
        guard_engines::classifier_client::LiveSpamClassifier::classify(self, text).map_err(|e| {
            ClassifierUnavailable {
                detail: e.safe_detail(),
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct ScanTurnConfig {
    pub intent: IntentConfig,
    pub verdict: VerdictConfig,
}

impl ScanTurnConfig {
    pub fn mvp_v1() -> Self {
        Self {
            intent: IntentConfig::mvp_v1(),
            verdict: VerdictConfig::mvp_v1(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScanTurnOutcome {
    /// Small talk; the classifier was never consulted and nothing may be
    /// persisted for this turn.
    Conversational(ConversationalIntent),
    Scanned(Verdict),
    Refused(ScanReject),
}

/// Fail-closed orchestration of one submission: contract check, intent
/// bypass, classifier call, verdict composition, output re-validation.
#[derive(Debug, Clone)]
pub struct ScanTurnWiring<C>
where
    C: ScanClassifier,
{
    intent: IntentRuntime,
    verdict: VerdictRuntime,
    classifier: C,
}

impl<C> ScanTurnWiring<C>
where
    C: ScanClassifier,
{
    pub fn new(config: ScanTurnConfig, classifier: C) -> Self {
        Self {
            intent: IntentRuntime::new(config.intent),
            verdict: VerdictRuntime::new(config.verdict),
            classifier,
        }
    }

    pub fn run_turn(&self, req: &ScanRequest) -> Result<ScanTurnOutcome, ContractViolation> {
        if req.validate().is_err() {
            return Ok(ScanTurnOutcome::Refused(fail_closed_reject(
                reason_codes::SCAN_REQUEST_INVALID,
                "request contract validation failed",
            )?));
        }

        if let Some(intent) = self.intent.classify_intent(&req.text) {
            return Ok(ScanTurnOutcome::Conversational(intent));
        }

        let classifier_result = match self.classifier.classify(&req.text) {
            Ok(result) => result,
            Err(unavailable) => {
                // A dead classifier must never become a fabricated verdict.
                return Ok(ScanTurnOutcome::Refused(ScanReject::v1(
                    reason_codes::SCAN_CLASSIFIER_UNAVAILABLE,
                    bounded_detail(&unavailable.detail),
                )?));
            }
        };
        if classifier_result.validate().is_err() {
            return Ok(ScanTurnOutcome::Refused(fail_closed_reject(
                reason_codes::SCAN_INTERNAL_PIPELINE_ERROR,
                "classifier result violated its contract",
            )?));
        }

        let verdict = match self.verdict.evaluate(req, &classifier_result) {
            Ok(verdict) => verdict,
            Err(_) => {
                return Ok(ScanTurnOutcome::Refused(fail_closed_reject(
                    reason_codes::SCAN_INTERNAL_PIPELINE_ERROR,
                    "verdict composition failed",
                )?));
            }
        };
        if verdict.validate().is_err() {
            return Ok(ScanTurnOutcome::Refused(fail_closed_reject(
                reason_codes::SCAN_INTERNAL_PIPELINE_ERROR,
                "verdict violated its contract",
            )?));
        }

        Ok(ScanTurnOutcome::Scanned(verdict))
    }
}

fn fail_closed_reject(
    reason_code: ReasonCodeId,
    detail: &str,
) -> Result<ScanReject, ContractViolation> {
    ScanReject::v1(reason_code, detail.to_string())
}

fn bounded_detail(detail: &str) -> String {
    let trimmed = detail.trim();
    if trimmed.is_empty() {
        return "provider=unknown error=upstream".to_string();
    }
    let mut out = String::new();
    for c in trimmed.chars() {
        if out.len() + c.len_utf8() > 256 {
            break;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_contracts::scan::{ClassifierLabel, ClassifierScore, CorrelationId};
    use guard_contracts::verdict::VerdictLabel;

    #[derive(Debug, Clone)]
    struct StubClassifier {
        out: Result<ClassifierResult, ClassifierUnavailable>,
    }

    impl ScanClassifier for StubClassifier {
        fn classify(&self, _text: &ScanText) -> Result<ClassifierResult, ClassifierUnavailable> {
            self.out.clone()
        }
    }

    fn spam(score: f32) -> ClassifierResult {
        ClassifierResult::v1(ClassifierLabel::Spam, ClassifierScore::new(score).unwrap()).unwrap()
    }

    fn other(score: f32) -> ClassifierResult {
        ClassifierResult::v1(ClassifierLabel::Other, ClassifierScore::new(score).unwrap()).unwrap()
    }

    fn wiring(out: Result<ClassifierResult, ClassifierUnavailable>) -> ScanTurnWiring<StubClassifier> {
        ScanTurnWiring::new(ScanTurnConfig::mvp_v1(), StubClassifier { out })
    }

    fn req(raw: &str) -> ScanRequest {
        ScanRequest::v1(CorrelationId(41), ScanText::new(raw).unwrap()).unwrap()
    }

    #[test]
    fn at_turn_01_greeting_bypasses_the_classifier() {
        // The stub would fail hard; a greeting must never reach it.
        let w = wiring(Err(ClassifierUnavailable {
            detail: "provider=hf_inference error=timeout".to_string(),
        }));
        match w.run_turn(&req("hi there")).unwrap() {
            ScanTurnOutcome::Conversational(ConversationalIntent::Greeting) => {}
            other => panic!("expected greeting bypass, got: {other:?}"),
        }
    }

    #[test]
    fn at_turn_02_scan_produces_a_verdict() {
        let w = wiring(Ok(spam(0.80)));
        match w
            .run_turn(&req("URGENT: your account is suspended, click to verify"))
            .unwrap()
        {
            ScanTurnOutcome::Scanned(v) => {
                assert_eq!(v.label, VerdictLabel::PhishingSpam);
                assert_eq!(v.confidence.value(), 92.50);
            }
            other => panic!("expected scanned verdict, got: {other:?}"),
        }
    }

    #[test]
    fn at_turn_03_classifier_outage_refuses_instead_of_fabricating() {
        let w = wiring(Err(ClassifierUnavailable {
            detail: "provider=hf_inference error=connection".to_string(),
        }));
        match w.run_turn(&req("you won a refund bonus")).unwrap() {
            ScanTurnOutcome::Refused(r) => {
                assert_eq!(r.reason_code, reason_codes::SCAN_CLASSIFIER_UNAVAILABLE);
                assert!(r.detail.contains("connection"));
            }
            other => panic!("expected refusal, got: {other:?}"),
        }
    }

    #[test]
    fn at_turn_04_invalid_request_contract_fails_closed() {
        let mut r = req("fine text");
        r.correlation_id = CorrelationId(0);
        let w = wiring(Ok(other(0.5)));
        match w.run_turn(&r).unwrap() {
            ScanTurnOutcome::Refused(reject) => {
                assert_eq!(reject.reason_code, reason_codes::SCAN_REQUEST_INVALID);
            }
            other => panic!("expected fail-closed refusal, got: {other:?}"),
        }
    }

    #[test]
    fn at_turn_05_empty_outage_detail_is_normalized() {
        let w = wiring(Err(ClassifierUnavailable {
            detail: "   ".to_string(),
        }));
        match w.run_turn(&req("please scan work.example.com")).unwrap() {
            ScanTurnOutcome::Refused(r) => {
                assert_eq!(r.detail, "provider=unknown error=upstream");
            }
            other => panic!("expected refusal, got: {other:?}"),
        }
    }
}
