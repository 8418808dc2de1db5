//! Piece and corpus normalization.
//!
//! A piece is one linear pass with a single record of look-ahead: each record
//! is read, repaired and respelled into a slot, then slots are merged
//! (cadential six-four) and resolved into canonical strings. Pieces share
//! nothing, so a corpus fans out across pieces with rayon.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::corpus::{KeyContext, Normalizer, Reading};
use crate::error::ChordError;
use crate::feedback::{FeedbackCollector, FeedbackKind, NormalizeResult};
use crate::resolver::resolve_token;
use crate::rules;
use crate::token::{ChordToken, Mode};

/// One chord annotation as the corpus table provides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub piece_id: String,
    pub local_key_mode: Mode,
    pub raw_chord_text: String,
    /// Explicit applied-to column (`V`, `V/V`), when the corpus has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_key: Option<String>,
}

impl RawRecord {
    pub fn new(piece_id: impl Into<String>, mode: Mode, text: impl Into<String>) -> Self {
        RawRecord {
            piece_id: piece_id.into(),
            local_key_mode: mode,
            raw_chord_text: text.into(),
            applied_to: None,
            local_key: None,
        }
    }

    pub fn with_applied_to(mut self, applied_to: impl Into<String>) -> Self {
        self.applied_to = Some(applied_to.into());
        self
    }

    pub fn with_local_key(mut self, key: impl Into<String>) -> Self {
        self.local_key = Some(key.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Fold cadential six-fours into the following dominant.
    pub merge_cadential: bool,
    /// Normalize pieces on the rayon pool.
    pub parallel: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            merge_cadential: true,
            parallel: true,
        }
    }
}

/// Canonical chord sequence of one piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub piece_id: String,
    pub chords: Vec<String>,
}

#[derive(Debug)]
struct Drafted {
    token: ChordToken,
    key: KeyContext,
    record: usize,
}

/// A dropped record or key change leaves a gap so that look-ahead never
/// pairs chords the annotator did not write next to each other.
#[derive(Debug)]
enum Slot {
    Chord(Drafted),
    Gap,
}

/// Normalize one piece's records, in temporal order.
pub fn normalize_piece(
    normalizer: &dyn Normalizer,
    piece_id: &str,
    records: &[RawRecord],
    options: &Options,
) -> NormalizeResult<Piece> {
    let mut collector = FeedbackCollector::new();
    let mut context = records
        .first()
        .map(|record| KeyContext::new(record.local_key.clone(), record.local_key_mode))
        .unwrap_or_default();

    let mut slots = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        collector.set_record(index);
        match read_record(normalizer, record, &mut context, &mut collector) {
            Ok(Reading::Chord(token)) => slots.push(Slot::Chord(Drafted {
                token,
                key: context.clone(),
                record: index,
            })),
            Ok(Reading::KeyChange) => slots.push(Slot::Gap),
            Ok(Reading::Ignore) => {}
            Err(error) => {
                warn!(
                    corpus = normalizer.name(),
                    piece = piece_id,
                    record = index,
                    text = %record.raw_chord_text,
                    %error,
                    "dropping record"
                );
                collector.dropped(&error, &record.raw_chord_text);
                slots.push(Slot::Gap);
            }
        }
    }

    let mut chords = Vec::with_capacity(slots.len());
    let mut slots = slots.into_iter().peekable();
    while let Some(slot) = slots.next() {
        let Slot::Chord(current) = slot else {
            continue;
        };

        let mut token = current.token;
        if options.merge_cadential && rules::is_cadential_six_four(&token) {
            if let Some(Slot::Chord(next)) = slots.peek() {
                if next.key == current.key && rules::is_cadential_dominant(&next.token) {
                    if next.token.applied_to == token.applied_to {
                        let merged = rules::merge_cadential(&next.token);
                        debug!(piece = piece_id, record = current.record, merged = %merged, "merged cadential six-four");
                        collector.info_at(
                            current.record,
                            FeedbackKind::CadentialMerge,
                            format!("'{}' folded into '{}'", token, next.token),
                        );
                        token = merged;
                        slots.next();
                    } else {
                        collector.info_at(
                            current.record,
                            FeedbackKind::AmbiguousCadentialMerge,
                            format!(
                                "'{}' and '{}' are applied to different keys; kept both",
                                token, next.token
                            ),
                        );
                    }
                }
            }
        }

        let applied = !token.is_resolved();
        let mut token = resolve_token(token);
        if applied {
            token.root = rules::respell_resolved(
                token.root,
                current.key.mode,
                normalizer.minor_flattened_degrees(),
            );
        }
        chords.push(token.to_string());
    }

    NormalizeResult::new(
        Piece {
            piece_id: piece_id.to_string(),
            chords,
        },
        collector.into_feedback(),
    )
}

/// Read one record and bring it into the shared spelling: corpus fixups,
/// then mode conventions for each element of its applied chain.
fn read_record(
    normalizer: &dyn Normalizer,
    record: &RawRecord,
    context: &mut KeyContext,
    collector: &mut FeedbackCollector,
) -> Result<Reading, ChordError> {
    let reading = normalizer.read(record, context)?;
    let Reading::Chord(mut token) = reading else {
        return Ok(reading);
    };

    for fixup in normalizer.fixups() {
        if (fixup.apply)(&mut token, context) {
            debug!(
                corpus = normalizer.name(),
                fixup = fixup.name,
                text = %record.raw_chord_text,
                token = %token,
                "applied fixup"
            );
            collector.info(
                FeedbackKind::Fixup,
                format!("{} rewrote '{}'", fixup.name, record.raw_chord_text),
            );
        }
    }

    rules::apply_mode_conventions(&mut token, context.mode, normalizer.minor_flattened_degrees());
    token.validate()?;
    Ok(Reading::Chord(token))
}

/// Normalize a whole corpus. Records are grouped by piece in first-seen
/// order and results come back in that order.
pub fn normalize_corpus(
    normalizer: &dyn Normalizer,
    records: impl IntoIterator<Item = RawRecord>,
    options: &Options,
) -> Vec<NormalizeResult<Piece>> {
    let pieces = group_by_piece(records);

    let results: Vec<NormalizeResult<Piece>> = if options.parallel {
        pieces
            .par_iter()
            .map(|(piece_id, records)| normalize_piece(normalizer, piece_id, records, options))
            .collect()
    } else {
        pieces
            .iter()
            .map(|(piece_id, records)| normalize_piece(normalizer, piece_id, records, options))
            .collect()
    };

    let chords: usize = results.iter().map(|r| r.value.chords.len()).sum();
    let dropped: usize = results.iter().map(|r| r.dropped()).sum();
    info!(
        corpus = normalizer.name(),
        pieces = results.len(),
        chords,
        dropped,
        "normalized corpus"
    );

    results
}

fn group_by_piece(records: impl IntoIterator<Item = RawRecord>) -> Vec<(String, Vec<RawRecord>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut pieces: Vec<(String, Vec<RawRecord>)> = Vec::new();
    for record in records {
        match index.get(&record.piece_id) {
            Some(&i) => pieces[i].1.push(record),
            None => {
                index.insert(record.piece_id.clone(), pieces.len());
                pieces.push((record.piece_id.clone(), vec![record]));
            }
        }
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusKind;
    use crate::feedback::FeedbackLevel;
    use pretty_assertions::assert_eq;

    fn records(mode: Mode, texts: &[&str]) -> Vec<RawRecord> {
        texts
            .iter()
            .map(|text| RawRecord::new("piece", mode, *text))
            .collect()
    }

    fn run(kind: CorpusKind, mode: Mode, texts: &[&str]) -> NormalizeResult<Piece> {
        normalize_piece(
            kind.normalizer(),
            "piece",
            &records(mode, texts),
            &Options::default(),
        )
    }

    #[test]
    fn test_cadential_six_four_merges() {
        let result = run(CorpusKind::Dcml, Mode::Minor, &["i", "i64", "V7", "i"]);
        assert_eq!(result.value.chords, vec!["i", "V7(64)", "i"]);
        assert_eq!(result.of_kind(FeedbackKind::CadentialMerge).count(), 1);
        assert_eq!(result.dropped(), 0);
    }

    #[test]
    fn test_merge_can_be_disabled() {
        let options = Options {
            merge_cadential: false,
            ..Options::default()
        };
        let result = normalize_piece(
            &crate::corpus::dcml::Dcml,
            "piece",
            &records(Mode::Major, &["I64", "V7"]),
            &options,
        );
        assert_eq!(result.value.chords, vec!["I64", "V7"]);
    }

    #[test]
    fn test_applied_leading_tone() {
        let result = run(CorpusKind::Dcml, Mode::Major, &["viio/V", "V"]);
        assert_eq!(result.value.chords, vec!["#ivo", "V"]);
    }

    #[test]
    fn test_applied_dominant_seventh() {
        let result = run(CorpusKind::Dcml, Mode::Major, &["V7/ii", "ii"]);
        assert_eq!(result.value.chords, vec!["VId7", "ii"]);
    }

    #[test]
    fn test_dropped_record_blocks_merge() {
        let result = run(CorpusKind::Dcml, Mode::Major, &["I64", "@none", "V7", "I"]);
        assert_eq!(result.value.chords, vec!["I64", "V7", "I"]);
        assert_eq!(result.dropped(), 1);

        let warning = &result.feedback[0];
        assert_eq!(warning.level, FeedbackLevel::Warning);
        assert_eq!(warning.kind, FeedbackKind::MalformedToken);
        assert_eq!(warning.record, 1);
        assert_eq!(warning.text.as_deref(), Some("@none"));
    }

    #[test]
    fn test_ambiguous_merge_keeps_both() {
        let records = vec![
            RawRecord::new("piece", Mode::Major, "I64").with_applied_to("V"),
            RawRecord::new("piece", Mode::Major, "V7"),
        ];
        let result = normalize_piece(
            CorpusKind::Dcml.normalizer(),
            "piece",
            &records,
            &Options::default(),
        );
        assert_eq!(result.value.chords, vec!["V64", "V7"]);
        assert_eq!(result.of_kind(FeedbackKind::AmbiguousCadentialMerge).count(), 1);
        assert_eq!(result.dropped(), 0);
    }

    #[test]
    fn test_applied_six_four_merges_with_applied_dominant() {
        let result = run(CorpusKind::Dcml, Mode::Major, &["I64/V", "V7/V", "V"]);
        assert_eq!(result.value.chords, vec!["IId7(64)", "V"]);
    }

    #[test]
    fn test_key_change_blocks_merge() {
        let records = vec![
            RawRecord::new("piece", Mode::Major, "I64").with_local_key("C"),
            RawRecord::new("piece", Mode::Major, "V7").with_local_key("G"),
        ];
        let result = normalize_piece(
            CorpusKind::Dcml.normalizer(),
            "piece",
            &records,
            &Options::default(),
        );
        assert_eq!(result.value.chords, vec!["I64", "V7"]);
    }

    #[test]
    fn test_minor_conventions() {
        let result = run(CorpusKind::Dcml, Mode::Minor, &["III", "VI", "VII", "#viio7", "V/III"]);
        assert_eq!(result.value.chords, vec!["-III", "-VI", "-VII", "viio7", "-VII"]);
    }

    #[test]
    fn test_resolved_roots_follow_spelling_conventions() {
        // V/iii in major is the natural seventh degree.
        let result = run(CorpusKind::Dcml, Mode::Major, &["V/iii", "V7/iii", "#viio/iii"]);
        assert_eq!(result.value.chords, vec!["-VII", "-VIId7", "#iio"]);

        // V/ii in minor lands on the sixth degree.
        let result = run(CorpusKind::Dcml, Mode::Minor, &["V/ii"]);
        assert_eq!(result.value.chords, vec!["-VI"]);

        let result = run(CorpusKind::Rock, Mode::Minor, &["V/ii"]);
        assert_eq!(result.value.chords, vec!["VI"]);
    }

    #[test]
    fn test_applied_column_in_every_corpus() {
        for (kind, text, column) in [
            (CorpusKind::Dcml, "V7", "V"),
            (CorpusKind::Bps, "5 D7 0", "5"),
            (CorpusKind::Humdrum, "V7", "V"),
            (CorpusKind::Rock, "V7", "V"),
        ] {
            let records = vec![RawRecord::new("piece", Mode::Major, text).with_applied_to(column)];
            let result = normalize_piece(kind.normalizer(), "piece", &records, &Options::default());
            assert_eq!(result.value.chords, vec!["IId7"], "{}", kind);
            assert!(result.feedback.is_empty(), "{}", kind);
        }
    }

    #[test]
    fn test_applied_tonic_fixup() {
        let result = run(CorpusKind::Dcml, Mode::Major, &["V7/I", "I"]);
        assert_eq!(result.value.chords, vec!["V7", "I"]);
        assert_eq!(result.of_kind(FeedbackKind::Fixup).count(), 1);
    }

    #[test]
    fn test_humdrum_key_changes() {
        let result = run(
            CorpusKind::Humdrum,
            Mode::Major,
            &["*C:", "I", "=1", "V", "*a:", "VI", "Ic", "V7", "."],
        );
        assert_eq!(result.value.chords, vec!["I", "V", "-VI", "V7(64)"]);
    }

    #[test]
    fn test_bps_fixup() {
        let result = run(CorpusKind::Bps, Mode::Minor, &["1 m 0", "7 h7 0", "1 m 0"]);
        assert_eq!(result.value.chords, vec!["i", "viio7", "i"]);
    }

    #[test]
    fn test_empty_piece() {
        let result = run(CorpusKind::Rock, Mode::Major, &[]);
        assert!(result.value.chords.is_empty());
        assert!(result.feedback.is_empty());
    }

    #[test]
    fn test_corpus_keeps_piece_order() {
        let mut records = Vec::new();
        for piece in ["b", "a", "c"] {
            for text in ["I", "IV", "V7", "I"] {
                records.push(RawRecord::new(piece, Mode::Major, text));
            }
        }
        records.push(RawRecord::new("b", Mode::Major, "bVII"));

        for parallel in [true, false] {
            let options = Options {
                parallel,
                ..Options::default()
            };
            let results = normalize_corpus(CorpusKind::Rock.normalizer(), records.clone(), &options);
            let ids: Vec<&str> = results.iter().map(|r| r.value.piece_id.as_str()).collect();
            assert_eq!(ids, vec!["b", "a", "c"]);
            assert_eq!(results[0].value.chords, vec!["I", "IV", "V7", "I", "-VII"]);
        }
    }
}
