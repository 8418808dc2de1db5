//! Per-corpus front ends.
//!
//! Each corpus writes Roman numerals its own way. A [`Normalizer`] reads one
//! raw record into a [`ChordToken`] using the shared symbol set, and names
//! the corpus's known annotation defects in a small [`Fixup`] table that the
//! pipeline runs in order.

pub mod bps;
pub mod dcml;
pub mod humdrum;
pub mod rock;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use winnow::combinator::separated;
use winnow::prelude::*;

use crate::error::ChordError;
use crate::parser::numeral::{spelled, PResult, Spelled};
use crate::pipeline::RawRecord;
use crate::token::{ChordToken, Degree, Mode, Numeral};

/// Running key context threaded through one piece.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyContext {
    /// Local key label, when the corpus provides one.
    pub key: Option<String>,
    pub mode: Mode,
}

impl KeyContext {
    pub fn new(key: Option<String>, mode: Mode) -> Self {
        KeyContext { key, mode }
    }

    /// Take the key and mode a record carries.
    pub fn follow(&mut self, record: &RawRecord) {
        self.mode = record.local_key_mode;
        self.key = record.local_key.clone();
    }
}

/// What one raw record turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Chord(ChordToken),
    /// A key-change boundary; the context has already been updated.
    KeyChange,
    /// Filler the corpus interleaves with chords (null tokens, barlines).
    Ignore,
}

/// A named repair for a known corpus defect. Returns whether it fired.
pub struct Fixup {
    pub name: &'static str,
    pub apply: fn(&mut ChordToken, &KeyContext) -> bool,
}

impl fmt::Debug for Fixup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixup").field("name", &self.name).finish()
    }
}

/// One corpus's reading of raw chord text.
pub trait Normalizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Classify one record, updating the key context at key changes.
    fn read(&self, record: &RawRecord, context: &mut KeyContext) -> Result<Reading, ChordError>;

    /// Defect repairs, run in order on every chord this corpus reads.
    fn fixups(&self) -> &'static [Fixup] {
        &[]
    }

    /// Degrees that this corpus spells against the minor scale in minor keys.
    fn minor_flattened_degrees(&self) -> &'static [Degree] {
        &[Degree::III, Degree::VI]
    }
}

/// Drops `/I` denominators: applying a chord to the tonic changes nothing
/// but would wrongly tag `V7/I` as an applied dominant seventh.
pub(crate) const STRIP_APPLIED_TONIC: Fixup = Fixup {
    name: "strip-applied-to-tonic",
    apply: strip_applied_tonic,
};

fn strip_applied_tonic(token: &mut ChordToken, _context: &KeyContext) -> bool {
    let before = token.applied_to.len();
    token
        .applied_to
        .retain(|den| *den != Numeral::major(Degree::I));
    token.applied_to.len() != before
}

fn chain<'a>(input: &mut &'a str) -> PResult<Vec<Spelled<'a>>> {
    separated(1.., spelled, '/').parse_next(input)
}

/// Denominators from the record's applied-to column (`V`, `V/V`, `bVI`),
/// innermost first. Empty when the column is absent or blank.
pub(crate) fn applied_column(record: &RawRecord) -> Result<Vec<Numeral>, ChordError> {
    let Some(text) = record
        .applied_to
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    else {
        return Ok(Vec::new());
    };
    let chain = chain
        .parse(text)
        .map_err(|e| ChordError::malformed(text, e.to_string()))?;
    chain.iter().map(Spelled::numeral).collect()
}

/// The corpora this crate knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusKind {
    Dcml,
    Bps,
    Humdrum,
    Rock,
}

impl CorpusKind {
    pub fn all() -> [CorpusKind; 4] {
        [
            CorpusKind::Dcml,
            CorpusKind::Bps,
            CorpusKind::Humdrum,
            CorpusKind::Rock,
        ]
    }

    pub fn normalizer(&self) -> &'static dyn Normalizer {
        match self {
            CorpusKind::Dcml => &dcml::Dcml,
            CorpusKind::Bps => &bps::Bps,
            CorpusKind::Humdrum => &humdrum::Humdrum,
            CorpusKind::Rock => &rock::Rock,
        }
    }
}

impl fmt::Display for CorpusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.normalizer().name())
    }
}

impl FromStr for CorpusKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CorpusKind::all()
            .into_iter()
            .find(|kind| kind.normalizer().name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown corpus '{}'", s))
    }
}
