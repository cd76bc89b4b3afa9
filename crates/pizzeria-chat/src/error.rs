//! Failures talking to the language-model endpoint.

use pizzeria_core::error::PizzeriaError;

/// Errors from one relay round trip.
///
/// The display form of every variant is the reply text shown to the user
/// in place of a model answer, and always starts with `ERROR`.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("ERROR: Could not connect to Ollama. Is Ollama running? Try: ollama --version")]
    Unreachable,
    #[error("ERROR calling Ollama: {status} {body}")]
    Status { status: u16, body: String },
    #[error("ERROR calling Ollama: {0}")]
    Transport(String),
}

impl From<RelayError> for PizzeriaError {
    fn from(err: RelayError) -> Self {
        PizzeriaError::Connectivity(err.to_string())
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            RelayError::Unreachable
        } else {
            RelayError::Transport(err.to_string())
        }
    }
}
