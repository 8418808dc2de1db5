//! Per-token error conditions.

use thiserror::Error;

/// Why a single chord annotation could not be normalized.
///
/// Neither variant is fatal to a piece: the pipeline drops the offending
/// record, records a [`Feedback`](crate::Feedback) entry and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChordError {
    /// A root/accidental string that is not one of the 35 lattice spellings.
    #[error("unknown spelling '{0}'")]
    UnknownSpelling(String),

    /// Raw text that matches no grammar the corpus understands.
    #[error("malformed token '{text}': {reason}")]
    MalformedToken { text: String, reason: String },
}

impl ChordError {
    pub fn malformed(text: impl Into<String>, reason: impl Into<String>) -> Self {
        ChordError::MalformedToken {
            text: text.into(),
            reason: reason.into(),
        }
    }
}
