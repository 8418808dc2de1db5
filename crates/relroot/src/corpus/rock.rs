//! Rock-corpus chord labels (`bVII`, `Vsus4`, `I5`, `V/vi`).
//!
//! Accidentals are relative to the major scale whatever the key, so nothing
//! is respelled for minor contexts.

use winnow::combinator::{alt, opt, preceded, repeat};
use winnow::prelude::*;

use super::{applied_column, KeyContext, Normalizer, Reading};
use crate::error::ChordError;
use crate::parser::figure::digits;
use crate::parser::numeral::{spelled, PResult, Spelled};
use crate::pipeline::RawRecord;
use crate::rules::{self, ChordClass, RawChord};
use crate::token::{Degree, Form};

/// Markers for stretches with no harmony.
const NO_CHORD: &[&str] = &["N", "NC", "X"];

#[derive(Debug, Clone, Copy)]
pub struct Rock;

impl Normalizer for Rock {
    fn name(&self) -> &'static str {
        "rock"
    }

    fn read(&self, record: &RawRecord, context: &mut KeyContext) -> Result<Reading, ChordError> {
        context.follow(record);

        let text = record.raw_chord_text.trim();
        if text.is_empty() {
            return Ok(Reading::Ignore);
        }
        if NO_CHORD.contains(&text) {
            return Err(ChordError::malformed(text, "no-chord marker"));
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

    fn minor_flattened_degrees(&self) -> &'static [Degree] {
        &[]
    }
}

#[derive(Debug)]
struct Label<'a> {
    root: Spelled<'a>,
    form: Option<Form>,
    figure: Option<&'a str>,
    added: Vec<&'static str>,
    relative: Vec<Spelled<'a>>,
}

fn form(input: &mut &str) -> PResult<Form> {
    alt((
        "o".value(Form::Diminished),
        "h".value(Form::HalfDiminished),
        "+".value(Form::Augmented),
        "M".value(Form::Major),
    ))
    .parse_next(input)
}

/// Suspensions and added tones, as extension symbols.
fn added(input: &mut &str) -> PResult<&'static str> {
    alt((
        "sus2".value("2"),
        "sus4".value("4"),
        "sus".value("4"),
        "add9".value("+9"),
        "add6".value("+6"),
    ))
    .parse_next(input)
}

fn label<'a>(input: &mut &'a str) -> PResult<Label<'a>> {
    let root = spelled(input)?;
    let form = opt(form).parse_next(input)?;
    let figure = opt(digits).parse_next(input)?;
    let added = repeat(0.., added).parse_next(input)?;
    let relative = repeat(0.., preceded('/', spelled)).parse_next(input)?;
    Ok(Label {
        root,
        form,
        figure,
        added,
        relative,
    })
}

fn classify(label: Label<'_>, text: &str) -> Result<RawChord, ChordError> {
    let root = label.root.numeral()?;
    let power = label.figure == Some("5");
    let form = if power {
        Form::Power
    } else {
        label.form.unwrap_or_default()
    };

    let mut raw = RawChord::new(ChordClass::Numeral { root, form });
    match label.figure {
        Some("5") | None => {}
        Some(figure) => raw.set_figure(figure, text)?,
    }
    raw.extensions
        .extend(label.added.iter().map(|symbol| symbol.to_string()));
    raw.applied_to = label
        .relative
        .iter()
        .map(Spelled::numeral)
        .collect::<Result<_, _>>()?;
    Ok(raw)
}
