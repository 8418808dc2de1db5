//! Distinct canonical chord strings across a corpus.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::pipeline::Piece;

/// Sorted, de-duplicated set of canonical chords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vocabulary(BTreeSet<String>);

impl Vocabulary {
    pub fn new() -> Self {
        Vocabulary::default()
    }

    pub fn from_pieces<'a>(pieces: impl IntoIterator<Item = &'a Piece>) -> Self {
        let mut vocabulary = Vocabulary::new();
        for piece in pieces {
            vocabulary.extend_piece(piece);
        }
        vocabulary
    }

    /// Returns whether the chord was new.
    pub fn insert(&mut self, chord: impl Into<String>) -> bool {
        self.0.insert(chord.into())
    }

    pub fn extend_piece(&mut self, piece: &Piece) {
        self.0.extend(piece.chords.iter().cloned());
    }

    pub fn merge(&mut self, other: Vocabulary) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, chord: &str) -> bool {
        self.0.contains(chord)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for Vocabulary {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Vocabulary(iter.into_iter().collect())
    }
}
