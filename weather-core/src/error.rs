use thiserror::Error;

/// Ways a provider payload can fail to match what we expect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Malformation {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("unexpected shape: {0}")]
    UnexpectedShape(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// Rejected before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport failure or non-success status.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(#[from] Malformation),

    /// Well-formed response with zero results.
    #[error("not found: {0}")]
    NotFound(String),
}

impl WeatherError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, WeatherError::NotFound(_))
    }

    pub(crate) fn missing(field: &'static str) -> Self {
        WeatherError::MalformedResponse(Malformation::MissingField(field))
    }

    pub(crate) fn shape(detail: impl Into<String>) -> Self {
        WeatherError::MalformedResponse(Malformation::UnexpectedShape(detail.into()))
    }
}

/// Which fallback message a failed string operation should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePhase {
    Fetch,
    Parse,
    Process,
}

impl From<&WeatherError> for FailurePhase {
    fn from(err: &WeatherError) -> Self {
        match err {
            WeatherError::MalformedResponse(Malformation::MissingField(_)) => FailurePhase::Parse,
            WeatherError::MalformedResponse(Malformation::UnexpectedShape(_)) => {
                FailurePhase::Process
            }
            _ => FailurePhase::Fetch,
        }
    }
}
