use dripfile_contract::ErrorDetail;
use thiserror::Error;

pub const NETWORK_FAILURE_MESSAGE: &str = "Network response was not OK";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// `reason` is for logs only.
    #[error("Network response was not OK")]
    Network { reason: String },
    #[error("{0}")]
    Application(ErrorDetail),
}

impl ApiError {
    pub fn network(reason: impl Into<String>) -> Self {
        ApiError::Network {
            reason: reason.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        ApiError::Application(ErrorDetail::Message(message.into()))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }
}
