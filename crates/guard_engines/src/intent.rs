#![forbid(unsafe_code)]

use guard_contracts::scan::ScanText;
use guard_contracts::verdict::ConversationalIntent;

/// Marker lists are ordered sequences: within a category the first matching
/// marker wins, and Greeting is always checked before WellBeing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentConfig {
    pub greeting_markers: Vec<String>,
    pub wellbeing_markers: Vec<String>,
}

impl IntentConfig {
    pub fn mvp_v1() -> Self {
        Self {
            greeting_markers: to_owned(&["hi", "hello", "hey", "vanakkam"]),
            wellbeing_markers: to_owned(&["how are you", "epdi iruka"]),
        }
    }
}

fn to_owned(markers: &[&str]) -> Vec<String> {
    markers.iter().map(|m| m.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct IntentRuntime {
    config: IntentConfig,
}

impl IntentRuntime {
    pub fn new(config: IntentConfig) -> Self {
        Self { config }
    }

    /// Decides whether a submission is conversational small talk that must
    /// bypass classification. Matching is unanchored `contains` against the
    /// lower-cased copy; a greeting match short-circuits everything else,
    /// including risk keywords elsewhere in the text. Pure, no side effects.
    pub fn classify_intent(&self, text: &ScanText) -> Option<ConversationalIntent> {
        let lowered = text.lowered();
        if contains_any(lowered, &self.config.greeting_markers) {
            return Some(ConversationalIntent::Greeting);
        }
        if contains_any(lowered, &self.config.wellbeing_markers) {
            return Some(ConversationalIntent::WellBeing);
        }
        None
    }
}

fn contains_any(lowered: &str, markers: &[String]) -> bool {
    markers.iter().any(|m| lowered.contains(m.as_str()))
}
