//! DCML harmony labels (`V65/V`, `#viio7`, `Ger6`, `V(64)`).
//!
//! Accidentals are `b`/`#`, `%` marks half-diminished, and chord changes sit
//! in parentheses. Degrees in minor keys are spelled against natural minor,
//! so `VII` is the subtonic and the leading tone is `#vii`.

use winnow::combinator::{alt, delimited, opt, preceded, repeat};
use winnow::prelude::*;
use winnow::token::take_while;

use super::{applied_column, Fixup, KeyContext, Normalizer, Reading, STRIP_APPLIED_TONIC};
use crate::error::ChordError;
use crate::parser::figure::digits;
use crate::parser::numeral::{spelled, PResult, Spelled};
use crate::pipeline::RawRecord;
use crate::rules::{self, AugmentedSixth, ChordClass, RawChord};
use crate::token::{Degree, Form};

/// Label the corpus writes for a chord it could not interpret.
const NONE_MARKER: &str = "@none";

const FIXUPS: &[Fixup] = &[STRIP_APPLIED_TONIC];

#[derive(Debug, Clone, Copy)]
pub struct Dcml;

impl Normalizer for Dcml {
    fn name(&self) -> &'static str {
        "dcml"
    }

    fn read(&self, record: &RawRecord, context: &mut KeyContext) -> Result<Reading, ChordError> {
        context.follow(record);

        let text = strip_phrase_markers(&record.raw_chord_text);
        if text.is_empty() {
            return Ok(Reading::Ignore);
        }
        if text == NONE_MARKER {
            return Err(ChordError::malformed(text, "uninterpretable chord marker"));
        }

        let label = label
            .parse(text)
            .map_err(|e| ChordError::malformed(text, e.to_string()))?;
        let mut raw = classify(label, text)?;

        if raw.applied_to.is_empty() {
            raw.applied_to = applied_column(record)?;
        }

        Ok(Reading::Chord(rules::build(raw)))
    }

    fn fixups(&self) -> &'static [Fixup] {
        FIXUPS
    }

    fn minor_flattened_degrees(&self) -> &'static [Degree] {
        &[Degree::III, Degree::VI, Degree::VII]
    }
}

fn strip_phrase_markers(text: &str) -> &str {
    text.trim().trim_matches(|c: char| matches!(c, '{' | '}' | '\\'))
}

#[derive(Debug, Clone, Copy)]
enum Head<'a> {
    Numeral(Spelled<'a>),
    Sixth(AugmentedSixth),
    CommonTone,
}

#[derive(Debug)]
struct Label<'a> {
    head: Head<'a>,
    form: Option<Form>,
    /// `+M`: augmented triad with a major seventh.
    major_seventh: bool,
    figure: Option<&'a str>,
    changes: Option<&'a str>,
    relative: Vec<Spelled<'a>>,
}

fn head<'a>(input: &mut &'a str) -> PResult<Head<'a>> {
    alt((
        "Ger".value(Head::Sixth(AugmentedSixth::German)),
        "It".value(Head::Sixth(AugmentedSixth::Italian)),
        "Fr".value(Head::Sixth(AugmentedSixth::French)),
        "Ct".value(Head::CommonTone),
        spelled.map(Head::Numeral),
    ))
    .parse_next(input)
}

fn form(input: &mut &str) -> PResult<(Form, bool)> {
    alt((
        "%".value((Form::HalfDiminished, false)),
        "o".value((Form::Diminished, false)),
        "+M".value((Form::Augmented, true)),
        "+".value((Form::Augmented, false)),
        "M".value((Form::Major, false)),
    ))
    .parse_next(input)
}

fn changes<'a>(input: &mut &'a str) -> PResult<&'a str> {
    delimited('(', take_while(1.., |c: char| c != ')'), ')').parse_next(input)
}

fn label<'a>(input: &mut &'a str) -> PResult<Label<'a>> {
    let head = head(input)?;
    let form = opt(form).parse_next(input)?;
    let figure = opt(digits).parse_next(input)?;
    let changes = opt(changes).parse_next(input)?;
    let relative = repeat(0.., preceded('/', spelled)).parse_next(input)?;

    Ok(Label {
        head,
        form: form.map(|(form, _)| form),
        major_seventh: form.is_some_and(|(_, seventh)| seventh),
        figure,
        changes,
        relative,
    })
}

fn classify(label: Label<'_>, text: &str) -> Result<RawChord, ChordError> {
    let class = match label.head {
        Head::Numeral(spelled) => ChordClass::Numeral {
            root: spelled.numeral()?,
            form: label.form.unwrap_or_default(),
        },
        Head::Sixth(kind) => ChordClass::AugmentedSixth(kind),
        Head::CommonTone => ChordClass::CommonTone,
    };

    let mut raw = RawChord::new(class);
    match (label.figure, &raw.class) {
        // `Ger6`: the 6 is part of the name, not an inversion.
        (Some("6"), ChordClass::AugmentedSixth(_)) => {}
        (Some(figure), _) => raw.set_figure(figure, text)?,
        (None, _) => {}
    }
    if label.major_seventh {
        raw.extensions.push("M7".to_string());
    }
    if let Some(changes) = label.changes {
        raw.extensions.push(respell_changes(changes));
    }
    raw.applied_to = label
        .relative
        .iter()
        .map(Spelled::numeral)
        .collect::<Result<_, _>>()?;
    Ok(raw)
}

/// Chord changes keep their own syntax apart from flats, which take the
/// canonical `-`: `b9` becomes `-9`, `#11` stays.
fn respell_changes(changes: &str) -> String {
    changes.replace('b', "-")
}
