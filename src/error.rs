use thiserror::Error;

use crate::card::CardId;
use crate::session::Phase;

/// Errors raised by the trainer core and its collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// `start` was requested while no card is due
    #[error("Nothing to review right now")]
    NothingToReview,

    /// A session event arrived in a phase that does not accept it
    #[error("Cannot {action} while the session is {phase:?}")]
    InvalidPhase { action: &'static str, phase: Phase },

    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    /// Front and back terms are required
    #[error("The {0} field cannot be empty")]
    EmptyField(&'static str),

    /// Import bundle is missing `version` or `cards`, or is not valid JSON
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
