#![forbid(unsafe_code)]

use guard_contracts::scan::{ClassifierLabel, ClassifierResult, ScanRequest};
use guard_contracts::verdict::{ConfidencePct, Verdict, VerdictLabel};
use guard_contracts::ContractViolation;

pub mod reason_codes {
    use guard_contracts::ReasonCodeId;

    // Verdict-engine reason-code namespace.
    pub const VERDICT_SAFE_TRUSTED_DOMAIN: ReasonCodeId = ReasonCodeId(0x5644_0001);
    pub const VERDICT_FLAGGED_PHISHING_SPAM: ReasonCodeId = ReasonCodeId(0x5644_0002);
    pub const VERDICT_SAFE_NO_PATTERNS: ReasonCodeId = ReasonCodeId(0x5644_0003);
}

/// Minimum confidence displayed (and persisted) whenever the phishing branch
/// is taken, regardless of the model's actual score. Preserved as shipped;
/// the safe branches always carry the raw classifier confidence.
pub const SPAM_CONFIDENCE_FLOOR_PCT: f32 = 92.50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedDomainEntry {
    pub domain: String,
    pub description: String,
}

/// Ordered allow-list. First entry in definition order whose domain is a
/// substring of the lowered text wins; this is NOT a longest-match table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedDomainTable {
    entries: Vec<TrustedDomainEntry>,
}

impl TrustedDomainTable {
    pub fn new(entries: Vec<TrustedDomainEntry>) -> Self {
        Self { entries }
    }

    pub fn mvp_v1() -> Self {
        Self::new(vec![
            entry("google.com", "Official Google Security."),
            entry("amazon.in", "Official Amazon India."),
            entry("onlinesbi.com", "Official SBI net banking."),
        ])
    }

    pub fn first_match(&self, lowered: &str) -> Option<&TrustedDomainEntry> {
        self.entries.iter().find(|e| lowered.contains(&e.domain))
    }
}

fn entry(domain: &str, description: &str) -> TrustedDomainEntry {
    TrustedDomainEntry {
        domain: domain.to_string(),
        description: description.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskPatternEntry {
    pub category: String,
    pub triggers: Vec<String>,
}

/// Ordered category table; found categories are reported in definition
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskPatternTable {
    entries: Vec<RiskPatternEntry>,
}

impl RiskPatternTable {
    pub fn new(entries: Vec<RiskPatternEntry>) -> Self {
        Self { entries }
    }

    pub fn mvp_v1() -> Self {
        Self::new(vec![
            RiskPatternEntry {
                category: "Urgency/Threat".to_string(),
                triggers: owned(&["urgent", "suspended", "action required"]),
            },
            RiskPatternEntry {
                category: "Financial Scam".to_string(),
                triggers: owned(&["bonus", "winner", "prize", "refund"]),
            },
        ])
    }

    /// A category is "found" when any of its triggers is a substring of the
    /// lowered text.
    pub fn found_categories(&self, lowered: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.triggers.iter().any(|t| lowered.contains(t.as_str())))
            .map(|e| e.category.as_str())
            .collect()
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictConfig {
    pub trusted_domains: TrustedDomainTable,
    pub risk_patterns: RiskPatternTable,
}

impl VerdictConfig {
    pub fn mvp_v1() -> Self {
        Self {
            trusted_domains: TrustedDomainTable::mvp_v1(),
            risk_patterns: RiskPatternTable::mvp_v1(),
        }
    }
}

const IMPACT_SAFE_DOMAIN: &str = "No negative impact. You can proceed safely.";
const IMPACT_SAFE_DEFAULT: &str = "Seems safe, but always be cautious with unknown links.";
const IMPACT_PHISHING: &str = "How this affects you:\n\
    1. Credential theft: scammers might steal your login details and passwords.\n\
    2. Financial loss: they could gain unauthorized access to your bank accounts.\n\
    3. Identity theft: your personal data can be sold or misused for illegal activities.\n\
    4. Malware risk: clicking the link might download hidden trackers or viruses to your device.";

#[derive(Debug, Clone)]
pub struct VerdictRuntime {
    config: VerdictConfig,
}

impl VerdictRuntime {
    pub fn new(config: VerdictConfig) -> Self {
        Self { config }
    }

    /// Deterministic verdict composition over an already-computed classifier
    /// result. Callers only invoke this after the intent check returned
    /// None. Pure and stateless: identical inputs yield identical verdicts.
    pub fn evaluate(
        &self,
        req: &ScanRequest,
        classifier: &ClassifierResult,
    ) -> Result<Verdict, ContractViolation> {
        let lowered = req.text.lowered();
        let raw_pct = classifier.score.0 * 100.0;

        if let Some(trusted) = self.config.trusted_domains.first_match(lowered) {
            let report = format!(
                "Safe source: this link belongs to {}. {} It is a verified official portal and is safe to use.",
                trusted.domain, trusted.description
            );
            return Verdict::v1(
                VerdictLabel::Safe,
                ConfidencePct::new(raw_pct)?,
                report,
                IMPACT_SAFE_DOMAIN.to_string(),
                reason_codes::VERDICT_SAFE_TRUSTED_DOMAIN,
            );
        }

        let found = self.config.risk_patterns.found_categories(lowered);
        if classifier.label == ClassifierLabel::Spam || !found.is_empty() {
            let report = format!(
                "Risk detected: found {} triggers. The spam classification model flagged this as a high-risk social engineering attempt.",
                found.join(", ")
            );
            return Verdict::v1(
                VerdictLabel::PhishingSpam,
                ConfidencePct::new(raw_pct.max(SPAM_CONFIDENCE_FLOOR_PCT))?,
                report,
                IMPACT_PHISHING.to_string(),
                reason_codes::VERDICT_FLAGGED_PHISHING_SPAM,
            );
        }

        Verdict::v1(
            VerdictLabel::Safe,
            ConfidencePct::new(raw_pct)?,
            "No common phishing patterns detected.".to_string(),
            IMPACT_SAFE_DEFAULT.to_string(),
            reason_codes::VERDICT_SAFE_NO_PATTERNS,
        )
    }
}
