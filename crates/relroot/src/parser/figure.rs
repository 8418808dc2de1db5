//! Quality, figured-bass and extension parsing.

use winnow::combinator::{alt, delimited, separated};
use winnow::prelude::*;
use winnow::token::take_while;

use super::numeral::PResult;
use crate::token::{Figbass, Form};

/// Canonical quality tag.
pub fn form(input: &mut &str) -> PResult<Form> {
    alt((
        "Ger".value(Form::German),
        "Fr".value(Form::French),
        "It".value(Form::Italian),
        "Ct".value(Form::CommonTone),
        "M".value(Form::Major),
        "d".value(Form::Dominant),
        "h".value(Form::HalfDiminished),
        "o".value(Form::Diminished),
        "+".value(Form::Augmented),
        "p".value(Form::Power),
    ))
    .parse_next(input)
}

/// Canonical figured-bass tag. Longer figures are tried first.
pub fn figbass(input: &mut &str) -> PResult<Figbass> {
    alt((
        "64".value(Figbass::SixFour),
        "65".value(Figbass::SixFive),
        "6".value(Figbass::Six),
        "43".value(Figbass::FourThree),
        "42".value(Figbass::FourTwo),
        "7".value(Figbass::Seven),
    ))
    .parse_next(input)
}

/// A run of figure digits as corpora write them (`7`, `65`, `9`, `13`).
pub fn digits<'a>(input: &mut &'a str) -> PResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)
}

fn extension_symbol(input: &mut &str) -> PResult<String> {
    take_while(1.., |c: char| !matches!(c, ',' | '(' | ')' | '/'))
        .map(str::to_string)
        .parse_next(input)
}

/// Canonical extension list: `(64)`, `(9,+6)`.
pub fn extensions(input: &mut &str) -> PResult<Vec<String>> {
    delimited('(', separated(1.., extension_symbol, ','), ')').parse_next(input)
}
