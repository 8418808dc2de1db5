//! Roman-numeral chord label normalization.
//!
//! Corpora of harmonic analyses each spell Roman numerals their own way.
//! This crate reads them into one canonical vocabulary, "Relative Root"
//! notation: every applied chord (`V/V`, `viio7/ii`) is resolved into a
//! single numeral relative to the local key, and every label renders as
//! `root form figbass (extensions)`.
//!
//! # Example
//!
//! ```
//! use relroot::{normalize_piece, CorpusKind, Mode, Options, RawRecord};
//!
//! let records: Vec<RawRecord> = ["I", "viio/V", "I64", "V7", "I"]
//!     .into_iter()
//!     .map(|text| RawRecord::new("op2no1", Mode::Major, text))
//!     .collect();
//!
//! let result = normalize_piece(
//!     CorpusKind::Dcml.normalizer(),
//!     "op2no1",
//!     &records,
//!     &Options::default(),
//! );
//! assert_eq!(result.value.chords, vec!["I", "#ivo", "V7(64)", "I"]);
//! ```

pub mod corpus;
pub mod error;
pub mod feedback;
pub mod lattice;
pub mod parser;
pub mod pipeline;
pub mod resolver;
pub mod rules;
pub mod token;
pub mod vocabulary;

pub use corpus::{CorpusKind, KeyContext, Normalizer, Reading};
pub use error::ChordError;
pub use feedback::{Feedback, FeedbackKind, FeedbackLevel, NormalizeResult};
pub use pipeline::{normalize_corpus, normalize_piece, Options, Piece, RawRecord};
pub use resolver::{resolve, resolve_chain, resolve_spelling, resolve_token, Resolution};
pub use token::{Accidental, ChordToken, Degree, Figbass, Form, Mode, Numeral};
pub use vocabulary::Vocabulary;
