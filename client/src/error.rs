use reqwest::StatusCode;

/// How a failed registration attempt is treated.
///
/// Neither class is persisted; both leave the installation undecided so the
/// next launch asks again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Malformed endpoint or unencodable request. Fixed by redeploying config.
    ConfigurationFault,
    /// Network error, bad status, or undecodable body.
    TransportFailure,
}

impl FailureClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfigurationFault => "configuration_fault",
            Self::TransportFailure => "transport_failure",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("invalid registration endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to encode registration request: {0}")]
    EncodeRequest(#[source] serde_json::Error),
    #[error("registration request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("registration server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("registration response exceeded {limit} bytes")]
    TooLarge { limit: usize },
    #[error("failed to decode registration response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl RegistrationError {
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::InvalidEndpoint { .. } | Self::EncodeRequest(_) => {
                FailureClass::ConfigurationFault
            }
            Self::Transport(_) | Self::Status { .. } | Self::TooLarge { .. } | Self::Decode(_) => {
                FailureClass::TransportFailure
            }
        }
    }
}
