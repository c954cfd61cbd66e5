use tether_wait::ErrorCode;
use thiserror::Error;

use crate::codes;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Error classified by the provider with a code.
    #[error("{code}: {message}")]
    Api { code: String, message: String },
    /// Anything that never reached the provider's error taxonomy (network, decoding).
    #[error("transport error: {0}")]
    Transport(String),
}

impl ProviderError {
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn auth_failure() -> Self {
        Self::api(codes::AUTH_FAILURE, "credentials could not be validated")
    }

    pub fn in_use(allocation_id: &str) -> Self {
        Self::api(
            codes::IN_USE_IP_ADDRESS,
            format!("Address {allocation_id} is in use"),
        )
    }

    pub fn association_not_found(association_id: &str) -> Self {
        Self::api(
            codes::ASSOCIATION_ID_NOT_FOUND,
            format!("The association ID '{association_id}' does not exist"),
        )
    }

    pub fn is_code(&self, code: &str) -> bool {
        self.code() == Some(code)
    }
}

impl ErrorCode for ProviderError {
    fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            Self::Transport(_) => None,
        }
    }
}
