#![forbid(unsafe_code)]

use std::time::Duration;

use guard_contracts::scan::{ClassifierLabel, ClassifierResult, ClassifierScore, ScanText};
use serde_json::Value;

/// Configuration for the hosted text-classification provider. The fixture
/// field bypasses the network entirely and is how tests (and fully offline
/// deployments) inject a canned provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub model_id: String,
    pub positive_label: String,
    pub timeout_ms: u32,
    pub user_agent: String,
    pub api_token: Option<String>,
    pub fixture_json: Option<String>,
}

impl ClassifierConfig {
    pub fn mvp_v1(api_token: Option<String>) -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            model_id: "mrm8488/bert-tiny-finetuned-sms-spam-detection".to_string(),
            positive_label: "LABEL_1".to_string(),
            timeout_ms: 8_000,
            user_agent: "phishguard/0.1".to_string(),
            api_token,
            fixture_json: None,
        }
    }

    pub fn with_fixture_json(mut self, fixture_json: Option<String>) -> Self {
        self.fixture_json = fixture_json;
        self
    }
}

/// Provider failure with an operator-safe shape: never carries the submitted
/// text, never the API token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCallError {
    pub provider: &'static str,
    pub error_kind: &'static str,
    pub http_status: Option<u16>,
}

impl ProviderCallError {
    pub fn new(provider: &'static str, error_kind: &'static str, http_status: Option<u16>) -> Self {
        Self {
            provider,
            error_kind,
            http_status,
        }
    }

    pub fn safe_detail(&self) -> String {
        match self.http_status {
            Some(status) => format!(
                "provider={} error={} status={status}",
                self.provider, self.error_kind
            ),
            None => format!("provider={} error={}", self.provider, self.error_kind),
        }
    }
}

const PROVIDER: &str = "hf_inference";

#[derive(Debug, Clone)]
pub struct LiveSpamClassifier {
    config: ClassifierConfig,
}

impl LiveSpamClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Scores one message. Failure is a hard error for the current request:
    /// there is no retry ladder here, and callers must never turn an error
    /// into a verdict.
    pub fn classify(&self, text: &ScanText) -> Result<ClassifierResult, ProviderCallError> {
        let body: Value = if let Some(fixture) = self.config.fixture_json.as_deref() {
            serde_json::from_str(fixture)
                .map_err(|_| ProviderCallError::new(PROVIDER, "json_parse", None))?
        } else {
            let agent = build_http_agent(self.config.timeout_ms, &self.config.user_agent)
                .map_err(|_| ProviderCallError::new(PROVIDER, "config_invalid", None))?;
            let url = format!(
                "{}/{}",
                self.config.endpoint.trim_end_matches('/'),
                self.config.model_id
            );
            let mut request = agent
                .post(&url)
                .set("Content-Type", "application/json")
                .set("Accept", "application/json");
            if let Some(token) = self.config.api_token.as_deref() {
                request = request.set("Authorization", &format!("Bearer {token}"));
            }
            let response = request
                .send_json(serde_json::json!({ "inputs": text.as_str() }))
                .map_err(provider_error_from_ureq)?;
            serde_json::from_reader(response.into_reader())
                .map_err(|_| ProviderCallError::new(PROVIDER, "json_parse", None))?
        };

        self.top_candidate(&body)
    }

    /// The inference API answers `[[{label, score}, ...]]` (some deployments
    /// flatten the outer array). The highest-scoring candidate decides.
    fn top_candidate(&self, body: &Value) -> Result<ClassifierResult, ProviderCallError> {
        let candidates: Vec<Value> = match body.as_array() {
            Some(outer) if outer.first().map(Value::is_array).unwrap_or(false) => {
                outer[0].as_array().cloned().unwrap_or_default()
            }
            Some(outer) => outer.clone(),
            None => return Err(ProviderCallError::new(PROVIDER, "json_parse", None)),
        };

        let mut best: Option<(&str, f64)> = None;
        for candidate in &candidates {
            let Some(label) = candidate.get("label").and_then(Value::as_str) else {
                continue;
            };
            let Some(score) = candidate.get("score").and_then(Value::as_f64) else {
                continue;
            };
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((label, score)),
            }
        }

        let (label_tag, score) =
            best.ok_or_else(|| ProviderCallError::new(PROVIDER, "empty_results", None))?;
        let label = if label_tag == self.config.positive_label {
            ClassifierLabel::Spam
        } else {
            ClassifierLabel::Other
        };
        let score = ClassifierScore::new(score as f32)
            .map_err(|_| ProviderCallError::new(PROVIDER, "invalid_score", None))?;
        ClassifierResult::v1(label, score)
            .map_err(|_| ProviderCallError::new(PROVIDER, "invalid_score", None))
    }
}

fn build_http_agent(timeout_ms: u32, user_agent: &str) -> Result<ureq::Agent, String> {
    if timeout_ms == 0 {
        return Err("timeout must be > 0".to_string());
    }
    let timeout = Duration::from_millis(u64::from(timeout_ms).max(100));
    Ok(ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .timeout_write(timeout)
        .user_agent(user_agent)
        .build())
}

fn provider_error_from_ureq(err: ureq::Error) -> ProviderCallError {
    match err {
        ureq::Error::Status(status, _) => {
            ProviderCallError::new(PROVIDER, "http_non_200", Some(status as u16))
        }
        ureq::Error::Transport(transport) => {
            let combined = format!("{:?} {}", transport.kind(), transport);
            ProviderCallError::new(PROVIDER, classify_transport_error_kind(&combined), None)
        }
    }
}

fn classify_transport_error_kind(raw: &str) -> &'static str {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("timeout") {
        "timeout"
    } else if lower.contains("tls") || lower.contains("ssl") {
        "tls"
    } else if lower.contains("dns") {
        "dns"
    } else if lower.contains("connection") || lower.contains("connect") {
        "connection"
    } else {
        "transport"
    }
}
