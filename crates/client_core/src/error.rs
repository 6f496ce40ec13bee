use shared::domain::RecordId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("record {0} not found")]
    NotFound(RecordId),
    #[error("network request failed: {0}")]
    Network(String),
    #[error("response superseded by a newer request")]
    StaleResponse,
}

impl ControllerError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }

    /// Stale completions are dropped silently; everything else is user-visible.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::StaleResponse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("history already started")]
    AlreadyStarted,
    #[error("history not started")]
    NotStarted,
    #[error("location '{location}' is outside app root '{root}'")]
    OutsideRoot { location: String, root: String },
}
