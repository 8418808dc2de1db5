//! Normalization feedback (dropped records, merges, fixups).
//!
//! A corrupt annotation never aborts a piece: the record is dropped and the
//! reason is collected here, alongside informational notes about what the
//! pipeline rewrote.

use serde::{Deserialize, Serialize};

use crate::error::ChordError;

/// One diagnostic, tied to a record position within its piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub level: FeedbackLevel,
    pub kind: FeedbackKind,
    pub message: String,
    /// Zero-based index of the record within its piece.
    pub record: usize,
    /// Raw text of the record, when there is one.
    pub text: Option<String>,
}

impl Feedback {
    pub fn warning(kind: FeedbackKind, message: impl Into<String>, record: usize) -> Self {
        Feedback {
            level: FeedbackLevel::Warning,
            kind,
            message: message.into(),
            record,
            text: None,
        }
    }

    pub fn info(kind: FeedbackKind, message: impl Into<String>, record: usize) -> Self {
        Feedback {
            level: FeedbackLevel::Info,
            kind,
            message: message.into(),
            record,
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackLevel {
    /// The record was dropped from the output.
    Warning,
    /// The record was rewritten; nothing was lost.
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackKind {
    UnknownSpelling,
    MalformedToken,
    /// Six-four and dominant were adjacent but applied to different keys.
    AmbiguousCadentialMerge,
    CadentialMerge,
    /// A corpus fixup rewrote the token.
    Fixup,
}

impl From<&ChordError> for FeedbackKind {
    fn from(error: &ChordError) -> Self {
        match error {
            ChordError::UnknownSpelling(_) => FeedbackKind::UnknownSpelling,
            ChordError::MalformedToken { .. } => FeedbackKind::MalformedToken,
        }
    }
}

/// Collector for feedback while walking one piece.
#[derive(Debug, Default)]
pub struct FeedbackCollector {
    feedback: Vec<Feedback>,
    current_record: usize,
}

impl FeedbackCollector {
    pub fn new() -> Self {
        FeedbackCollector::default()
    }

    /// Update position tracking (call when advancing to the next record)
    pub fn set_record(&mut self, record: usize) {
        self.current_record = record;
    }

    /// Record a dropped token at the current position
    pub fn dropped(&mut self, error: &ChordError, text: &str) {
        self.feedback.push(
            Feedback::warning(FeedbackKind::from(error), error.to_string(), self.current_record)
                .with_text(text),
        );
    }

    /// Add info at current position
    pub fn info(&mut self, kind: FeedbackKind, message: impl Into<String>) {
        self.feedback
            .push(Feedback::info(kind, message, self.current_record));
    }

    /// Add info about an explicit record
    pub fn info_at(&mut self, record: usize, kind: FeedbackKind, message: impl Into<String>) {
        self.feedback.push(Feedback::info(kind, message, record));
    }

    /// Get all feedback, ordered by record
    pub fn into_feedback(mut self) -> Vec<Feedback> {
        self.feedback.sort_by_key(|f| f.record);
        self.feedback
    }
}

/// Result of normalizing with feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeResult<T> {
    pub value: T,
    pub feedback: Vec<Feedback>,
}

impl<T> NormalizeResult<T> {
    pub fn new(value: T, feedback: Vec<Feedback>) -> Self {
        NormalizeResult { value, feedback }
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Feedback> {
        self.feedback
            .iter()
            .filter(|f| f.level == FeedbackLevel::Warning)
    }

    /// Records that did not make it into the output.
    pub fn dropped(&self) -> usize {
        self.warnings().count()
    }

    pub fn of_kind(&self, kind: FeedbackKind) -> impl Iterator<Item = &Feedback> {
        self.feedback.iter().filter(move |f| f.kind == kind)
    }
}
