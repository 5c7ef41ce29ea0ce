use std::io;
use std::time::Duration;

use thiserror::Error;

use super::conversation_state::PathwayKind;

/// Failures of the text generation service.
///
/// None of these reach the person on the other end of the conversation; the
/// orchestrator swaps in a fixed question or guidance block instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation service unavailable: {0}")]
    Unavailable(String),

    #[error("generation service returned no text")]
    EmptyResponse,

    #[error("generated question touches an excluded topic: {0}")]
    ExcludedTopic(String),

    #[error("generated question was already asked: {0}")]
    Repeated(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("failed to write message: {0}")]
    Io(#[from] io::Error),

    #[error("delivery rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no session for sender {0}")]
    NotFound(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuideError {
    #[error("question cursor {index} out of range for {pathway:?} ({len} questions)")]
    StateCorruption {
        pathway: PathwayKind,
        index: usize,
        len: usize,
    },
}
