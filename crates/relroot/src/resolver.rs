//! Applied-chord resolution.
//!
//! Turns a numeral written against a temporary tonic (`V/ii`) into a single
//! numeral against the true key (`VI`). Transposition is coordinate addition
//! on the [lattice](crate::lattice); quality travels with the numerator's
//! case.

use serde::{Deserialize, Serialize};

use crate::error::ChordError;
use crate::lattice;
use crate::parser;
use crate::token::{ChordToken, Form, Numeral};

/// Outcome of folding one or more denominators into a numerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub root: Numeral,
    /// The resolved chord is a major triad carrying a minor seventh and
    /// should be tagged with [`Form::Dominant`].
    pub dominant_seventh: bool,
}

impl Resolution {
    /// Resolved root spelling with case.
    pub fn spelling(&self) -> String {
        self.root.to_string()
    }

    /// Quality tag to use when the token had none of its own.
    pub fn form(&self) -> Form {
        if self.dominant_seventh {
            Form::Dominant
        } else {
            Form::Default
        }
    }
}

/// Resolve `num` applied to `den`.
///
/// The result always takes the numerator's case: `I/ii` is the major
/// chord on the supertonic, `II`.
pub fn resolve(num: &Numeral, den: &Numeral, seventh: bool) -> Resolution {
    let coordinate = lattice::transpose(num.coordinate(), den.coordinate());
    let root = Numeral::from_coordinate(coordinate, num.minor);
    Resolution {
        root,
        dominant_seventh: seventh && !root.minor,
    }
}

/// Resolve a numerator against a chain of denominators, innermost first.
///
/// `V/V/ii` is `resolve_chain(V, [V, ii])`: the outer denominators fold
/// right-to-left into a single key (`V/ii` -> `VI`), then the numerator is
/// resolved against it. An empty chain returns the numerator unchanged.
pub fn resolve_chain(num: &Numeral, denominators: &[Numeral], seventh: bool) -> Resolution {
    let Some((outermost, inner)) = denominators.split_last() else {
        return Resolution {
            root: *num,
            dominant_seventh: false,
        };
    };

    let key = inner
        .iter()
        .rev()
        .fold(*outermost, |key, den| resolve(den, &key, false).root);

    resolve(num, &key, seventh)
}

/// Fold a token's applied chain into its root.
///
/// A token without its own quality tag picks up [`Form::Dominant`] when the
/// resolved root is major and the chord carries a seventh.
pub fn resolve_token(token: ChordToken) -> ChordToken {
    if token.is_resolved() {
        return token;
    }
    let resolution = resolve_chain(&token.root, &token.applied_to, token.has_seventh());
    let mut token = token;
    token.root = resolution.root;
    token.applied_to.clear();
    if token.form == Form::Default {
        token.form = resolution.form();
    }
    token
}

/// String form of [`resolve`]: both spellings must already be pure
/// degree+accidental lattice spellings (`-VI`, `#iv`).
pub fn resolve_spelling(num: &str, den: &str, seventh: bool) -> Result<Resolution, ChordError> {
    let num = parser::parse_spelling(num)?;
    let den = parser::parse_spelling(den)?;
    Ok(resolve(&num, &den, seventh))
}
