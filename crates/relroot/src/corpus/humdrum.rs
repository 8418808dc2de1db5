//! Humdrum `**harm` spines (`V7b/V`, `viio7c`, `N`, `Gn`).
//!
//! The spine interleaves chords with null tokens, barlines, comments and
//! interpretations. Key interpretations (`*c#:`) are the only source of the
//! running key; inversions are letters, `a` for root position to `d` for
//! third inversion.

use winnow::combinator::{alt, opt, preceded, repeat};
use winnow::prelude::*;
use winnow::token::one_of;

use super::{applied_column, Fixup, KeyContext, Normalizer, Reading, STRIP_APPLIED_TONIC};
use crate::error::ChordError;
use crate::parser::figure::digits;
use crate::parser::numeral::{spelled, PResult, Spelled};
use crate::pipeline::RawRecord;
use crate::rules::{self, split_figure, AugmentedSixth, ChordClass, RawChord};
use crate::token::{Accidental, Degree, Figbass, Form, Mode, Numeral};

const FIXUPS: &[Fixup] = &[STRIP_APPLIED_TONIC];

#[derive(Debug, Clone, Copy)]
pub struct Humdrum;

impl Normalizer for Humdrum {
    fn name(&self) -> &'static str {
        "humdrum"
    }

    fn read(&self, record: &RawRecord, context: &mut KeyContext) -> Result<Reading, ChordError> {
        let text = record.raw_chord_text.trim();

        if let Some(interpretation) = text.strip_prefix('*') {
            return Ok(match key_interpretation(interpretation) {
                Some((key, mode)) => {
                    context.key = Some(key.to_string());
                    context.mode = mode;
                    Reading::KeyChange
                }
                None => Reading::Ignore,
            });
        }
        if text.is_empty() || text == "." || text.starts_with('=') || text.starts_with('!') {
            return Ok(Reading::Ignore);
        }

        // Implied harmony is written in parentheses.
        let text = text.trim_start_matches('(').trim_end_matches(')');
        let harm = harm
            .parse(text)
            .map_err(|e| ChordError::malformed(text, e.to_string()))?;
        let mut raw = classify(harm, text)?;
        if raw.applied_to.is_empty() {
            raw.applied_to = applied_column(record)?;
        }
        Ok(Reading::Chord(rules::build(raw)))
    }

    fn fixups(&self) -> &'static [Fixup] {
        FIXUPS
    }
}

/// `c#:` is C-sharp minor, `B-:` is B-flat major.
fn key_interpretation(text: &str) -> Option<(&str, Mode)> {
    let key = text.strip_suffix(':')?;
    let mut chars = key.chars();
    let tonic = chars.next()?;
    if !matches!(tonic.to_ascii_lowercase(), 'a'..='g') || !chars.all(|c| matches!(c, '#' | '-')) {
        return None;
    }
    let mode = if tonic.is_ascii_lowercase() {
        Mode::Minor
    } else {
        Mode::Major
    };
    Some((key, mode))
}

#[derive(Debug, Clone, Copy)]
enum Head<'a> {
    Numeral(Spelled<'a>),
    Neapolitan,
    Sixth(AugmentedSixth),
}

#[derive(Debug)]
struct Harm<'a> {
    head: Head<'a>,
    form: Option<Form>,
    figure: Option<&'a str>,
    inversion: Option<u8>,
    relative: Vec<Spelled<'a>>,
}

fn head<'a>(input: &mut &'a str) -> PResult<Head<'a>> {
    alt((
        "N".value(Head::Neapolitan),
        "Lt".value(Head::Sixth(AugmentedSixth::Italian)),
        "Gn".value(Head::Sixth(AugmentedSixth::German)),
        "Fr".value(Head::Sixth(AugmentedSixth::French)),
        spelled.map(Head::Numeral),
    ))
    .parse_next(input)
}

fn form(input: &mut &str) -> PResult<Form> {
    alt((
        "o".value(Form::Diminished),
        "h".value(Form::HalfDiminished),
        "ø".value(Form::HalfDiminished),
        "+".value(Form::Augmented),
        "M".value(Form::Major),
    ))
    .parse_next(input)
}

fn inversion(input: &mut &str) -> PResult<u8> {
    one_of('a'..='d')
        .map(|c: char| c as u8 - b'a')
        .parse_next(input)
}

fn harm<'a>(input: &mut &'a str) -> PResult<Harm<'a>> {
    let head = head(input)?;
    let form = opt(form).parse_next(input)?;
    let figure = opt(digits).parse_next(input)?;
    let inversion = opt(inversion).parse_next(input)?;
    let relative = repeat(0.., preceded('/', spelled)).parse_next(input)?;
    Ok(Harm {
        head,
        form,
        figure,
        inversion,
        relative,
    })
}

fn classify(harm: Harm<'_>, text: &str) -> Result<RawChord, ChordError> {
    let (figbass, extension) = match harm.figure {
        Some(figure) => {
            let (figbass, extension) = split_figure(figure).ok_or_else(|| {
                ChordError::malformed(text, format!("unknown figure '{}'", figure))
            })?;
            (Some(figbass), extension)
        }
        None => (None, None),
    };
    let seventh = figbass.is_some_and(|f| f.is_seventh());

    let (class, figbass) = match harm.head {
        Head::Numeral(spelled) => {
            let class = ChordClass::Numeral {
                root: spelled.numeral()?,
                form: harm.form.unwrap_or_default(),
            };
            let figbass = match harm.inversion {
                Some(inversion) => Some(invert(inversion, seventh, text)?),
                None => figbass,
            };
            (class, figbass)
        }
        Head::Neapolitan => {
            let class = ChordClass::Numeral {
                root: Numeral::new(Accidental::Flat, Degree::II, false),
                form: Form::Default,
            };
            let inversion = harm.inversion.unwrap_or(1);
            (class, Some(invert(inversion, seventh, text)?))
        }
        Head::Sixth(kind) => {
            let figbass = match harm.inversion {
                Some(inversion) => Some(invert(inversion, kind != AugmentedSixth::Italian, text)?),
                None => None,
            };
            (ChordClass::AugmentedSixth(kind), figbass)
        }
    };

    let mut raw = RawChord::new(class);
    raw.figbass = figbass;
    if let Some(extension) = extension {
        raw.extensions.push(extension.to_string());
    }
    raw.applied_to = harm
        .relative
        .iter()
        .map(Spelled::numeral)
        .collect::<Result<_, _>>()?;
    Ok(raw)
}

fn invert(inversion: u8, seventh: bool, text: &str) -> Result<Figbass, ChordError> {
    Figbass::from_inversion(inversion, seventh)
        .ok_or_else(|| ChordError::malformed(text, "third inversion of a triad"))
}
