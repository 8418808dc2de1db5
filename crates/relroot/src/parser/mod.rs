//! Canonical chord-token grammar using winnow.
//!
//! ```text
//! token    := numeral form? figbass? ("(" ext ("," ext)* ")")? ("/" numeral)*
//! numeral  := ("--" | "-" | "#" | "##")? (I|V)+ | (i|v)+
//! ```
//!
//! The sub-parsers are shared with the corpus lexers, which layer their
//! own spellings on top.

pub mod figure;
pub mod numeral;

use std::str::FromStr;

use winnow::combinator::{opt, preceded, repeat};
use winnow::prelude::*;

use crate::error::ChordError;
use crate::token::{ChordToken, Numeral};
use numeral::PResult;

fn token(input: &mut &str) -> PResult<ChordToken> {
    let root = numeral::numeral(input)?;
    let form = opt(figure::form).parse_next(input)?.unwrap_or_default();
    let figbass = opt(figure::figbass).parse_next(input)?.unwrap_or_default();
    let extensions = opt(figure::extensions).parse_next(input)?.unwrap_or_default();
    let applied_to: Vec<Numeral> = repeat(0.., preceded('/', numeral::numeral)).parse_next(input)?;

    Ok(ChordToken {
        root,
        form,
        figbass,
        extensions,
        applied_to,
    })
}

/// Decompose a canonical chord string into its token.
pub fn parse_token(text: &str) -> Result<ChordToken, ChordError> {
    let token = token
        .parse(text)
        .map_err(|e| ChordError::malformed(text, e.to_string()))?;
    token.validate()?;
    Ok(token)
}

/// Parse a pure degree+accidental spelling (`-VI`, `#iv`).
pub fn parse_spelling(text: &str) -> Result<Numeral, ChordError> {
    numeral::numeral
        .parse(text)
        .map_err(|_| ChordError::UnknownSpelling(text.to_string()))
}

impl FromStr for ChordToken {
    type Err = ChordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token(s)
    }
}

impl FromStr for Numeral {
    type Err = ChordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_spelling(s)
    }
}
