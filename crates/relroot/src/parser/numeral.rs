//! Numeral parsing: accidental prefixes and Roman degree letters.

use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::{take, take_while};

use crate::error::ChordError;
use crate::token::{Accidental, Degree, Numeral};

pub(crate) type PResult<T> = winnow::ModalResult<T>;

/// Canonical accidental prefix (`--`, `-`, `#`, `##`, or nothing).
pub fn accidental(input: &mut &str) -> PResult<Accidental> {
    let accidental = opt(alt((
        "--".value(Accidental::DoubleFlat),
        "-".value(Accidental::Flat),
        "##".value(Accidental::DoubleSharp),
        "#".value(Accidental::Sharp),
    )))
    .parse_next(input)?;
    Ok(accidental.unwrap_or(Accidental::Natural))
}

/// Raw accidental run as corpora write it: any mix of `b`, `-` and `#`.
///
/// Validation happens in [`accidental_from_run`] so that an over-long run
/// can be reported as an unknown spelling instead of a grammar failure.
pub fn accidental_run<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(0.., ['b', '-', '#']).parse_next(input)
}

/// Convert a raw accidental run (`bb`, `-`, `#`) to an [`Accidental`].
pub fn accidental_from_run(run: &str, spelling: &str) -> Result<Accidental, ChordError> {
    let flats = run.chars().filter(|c| matches!(c, 'b' | '-')).count();
    let sharps = run.chars().filter(|c| *c == '#').count();
    let offset = match (flats, sharps) {
        (0, s) => s as i8,
        (f, 0) => -(f as i8),
        _ => return Err(ChordError::UnknownSpelling(spelling.to_string())),
    };
    Accidental::from_offset(offset).ok_or_else(|| ChordError::UnknownSpelling(spelling.to_string()))
}

/// Upper-case degree letters. A trailing `I` that starts an `It` tag is left
/// for the quality parser, so `VIt6` reads as `V` then `It6`.
fn upper_letters<'a>(input: &mut &'a str) -> PResult<&'a str> {
    let run = input.len() - input.trim_start_matches(['I', 'V']).len();
    let italian = input[run..].starts_with('t') && input[..run].ends_with('I');
    let run = if italian { run - 1 } else { run };
    take(run).verify(|s: &str| !s.is_empty()).parse_next(input)
}

/// Roman degree letters in a single case. Returns the degree and whether it
/// was written lower-case.
pub fn roman(input: &mut &str) -> PResult<(Degree, bool)> {
    alt((
        upper_letters.map(|s: &str| (s, false)),
        take_while(1.., ['i', 'v']).map(|s: &str| (s, true)),
    ))
    .verify_map(|(letters, minor)| Degree::from_roman(letters).map(|degree| (degree, minor)))
    .parse_next(input)
}

/// A numeral as a corpus writes it, before its accidental run is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spelled<'a> {
    pub text: &'a str,
    pub run: &'a str,
    pub degree: Degree,
    pub minor: bool,
}

impl Spelled<'_> {
    pub fn numeral(&self) -> Result<Numeral, ChordError> {
        let accidental = accidental_from_run(self.run, self.text)?;
        Ok(Numeral::new(accidental, self.degree, self.minor))
    }
}

/// Accidental run plus Roman letters, keeping the text for error reports.
pub fn spelled<'a>(input: &mut &'a str) -> PResult<Spelled<'a>> {
    (accidental_run, roman)
        .with_taken()
        .map(|((run, (degree, minor)), text)| Spelled {
            text,
            run,
            degree,
            minor,
        })
        .parse_next(input)
}

/// Canonical lattice spelling with case (`#iv`, `-VII`).
pub fn numeral(input: &mut &str) -> PResult<Numeral> {
    let accidental = accidental(input)?;
    let (degree, minor) = roman(input)?;
    Ok(Numeral::new(accidental, degree, minor))
}
