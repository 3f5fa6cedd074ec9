#![forbid(unsafe_code)]

/// Closed set of secrets the token vault may hold. Anything outside this
/// enum is refused at the vault boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderSecretId {
    HuggingFaceApiToken,
}

impl ProviderSecretId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HuggingFaceApiToken => "hf_api_token",
        }
    }

    pub const fn all() -> &'static [Self] {
        &[Self::HuggingFaceApiToken]
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "hf_api_token" => Some(Self::HuggingFaceApiToken),
            _ => None,
        }
    }

    pub fn allowed_key_names() -> Vec<&'static str> {
        Self::all().iter().map(|id| id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ProviderSecretId;

    #[test]
    fn provider_secret_ids_are_roundtrippable() {
        for secret in ProviderSecretId::all() {
            assert_eq!(ProviderSecretId::parse(secret.as_str()), Some(*secret));
        }
    }

    #[test]
    fn unknown_ids_are_refused() {
        assert_eq!(ProviderSecretId::parse("openai_api_key"), None);
    }
}
