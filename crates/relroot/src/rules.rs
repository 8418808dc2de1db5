//! Corpus-agnostic normalization rules.
//!
//! Every corpus lexer classifies its raw text into a [`RawChord`] using the
//! shared symbol set; [`build`] turns that into a [`ChordToken`] and
//! [`apply_mode_conventions`] respells each numeral of the applied chain for
//! the key it is read in. Nothing here knows which corpus a chord came from.

use crate::error::ChordError;
use crate::token::{Accidental, ChordToken, Degree, Figbass, Form, Mode, Numeral};

/// Augmented-sixth species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugmentedSixth {
    Italian,
    French,
    German,
}

impl AugmentedSixth {
    /// Fixed root: `II` for the French sixth, `#iv` for German and Italian.
    pub fn root(&self) -> Numeral {
        match self {
            AugmentedSixth::French => Numeral::major(Degree::II),
            AugmentedSixth::Italian | AugmentedSixth::German => {
                Numeral::new(Accidental::Sharp, Degree::IV, true)
            }
        }
    }

    pub fn form(&self) -> Form {
        match self {
            AugmentedSixth::Italian => Form::Italian,
            AugmentedSixth::French => Form::French,
            AugmentedSixth::German => Form::German,
        }
    }

    /// Inversion that puts the lowered sixth degree in the bass.
    pub fn default_figbass(&self) -> Figbass {
        match self {
            AugmentedSixth::Italian => Figbass::Six,
            AugmentedSixth::French => Figbass::FourThree,
            AugmentedSixth::German => Figbass::SixFive,
        }
    }
}

/// Closed classification of a raw chord, decided before any transposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordClass {
    Numeral { root: Numeral, form: Form },
    AugmentedSixth(AugmentedSixth),
    /// Common-tone diminished seventh.
    CommonTone,
}

/// What a corpus lexer hands to the shared rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChord {
    pub class: ChordClass,
    /// `None` when the corpus did not write an inversion.
    pub figbass: Option<Figbass>,
    pub extensions: Vec<String>,
    /// Denominators, innermost first.
    pub applied_to: Vec<Numeral>,
}

impl RawChord {
    pub fn new(class: ChordClass) -> Self {
        RawChord {
            class,
            figbass: None,
            extensions: Vec::new(),
            applied_to: Vec::new(),
        }
    }

    /// Read a figure (`7`, `65`, `9`) into figbass and extensions.
    pub fn set_figure(&mut self, digits: &str, text: &str) -> Result<(), ChordError> {
        let (figbass, extension) = split_figure(digits)
            .ok_or_else(|| ChordError::malformed(text, format!("unknown figure '{}'", digits)))?;
        self.figbass = Some(figbass);
        if let Some(extension) = extension {
            self.extensions.push(extension.to_string());
        }
        Ok(())
    }
}

/// Split a figure into a figbass no larger than a seventh-chord inversion
/// and the extension that spilled over.
pub fn split_figure(digits: &str) -> Option<(Figbass, Option<&'static str>)> {
    let split = match digits {
        "" => (Figbass::Root, None),
        "6" => (Figbass::Six, None),
        "64" => (Figbass::SixFour, None),
        "7" => (Figbass::Seven, None),
        "65" => (Figbass::SixFive, None),
        "43" => (Figbass::FourThree, None),
        "42" | "2" => (Figbass::FourTwo, None),
        "9" => (Figbass::Seven, Some("9")),
        "11" => (Figbass::Seven, Some("11")),
        "13" => (Figbass::Seven, Some("13")),
        _ => return None,
    };
    Some(split)
}

/// Build the token for a classified chord.
pub fn build(raw: RawChord) -> ChordToken {
    let mut token = match raw.class {
        ChordClass::Numeral { root, form } => ChordToken::new(root)
            .with_form(form)
            .with_figbass(raw.figbass.unwrap_or_default()),
        ChordClass::AugmentedSixth(kind) => ChordToken::new(kind.root())
            .with_form(kind.form())
            .with_figbass(raw.figbass.unwrap_or(kind.default_figbass())),
        ChordClass::CommonTone => ChordToken::new(Numeral::new(Accidental::Sharp, Degree::II, true))
            .with_form(Form::CommonTone)
            .with_figbass(Figbass::FourTwo),
    };
    for extension in raw.extensions {
        token.add_extension(extension);
    }
    token.applied_to = raw.applied_to;
    token
}

/// Respell one numeral for the mode it is read in.
///
/// In minor, the given degrees move onto the major-based lattice (natural
/// to flat, sharp to natural). Upper-case natural `VII` is then `-VII`.
/// This reads a written spelling and must run once per numeral.
pub fn respell(numeral: Numeral, mode: Mode, minor_degrees: &[Degree]) -> Numeral {
    let mut numeral = numeral;
    if mode == Mode::Minor && minor_degrees.contains(&numeral.degree) {
        numeral.accidental = numeral.accidental.minor_shift();
    }
    if numeral.degree == Degree::VII && !numeral.minor && numeral.accidental == Accidental::Natural {
        numeral.accidental = Accidental::Flat;
    }
    numeral
}

/// Spelling convention for a root that came out of resolution.
///
/// The root is already a lattice spelling against the local key, so only
/// natural degrees move: upper-case `VII` and, in minor, the corpus's
/// minor-flattened degrees take a flat.
pub fn respell_resolved(numeral: Numeral, mode: Mode, minor_degrees: &[Degree]) -> Numeral {
    let mut numeral = numeral;
    if numeral.accidental != Accidental::Natural {
        return numeral;
    }
    let subtonic = numeral.degree == Degree::VII && !numeral.minor;
    let minor_degree = mode == Mode::Minor && minor_degrees.contains(&numeral.degree);
    if subtonic || minor_degree {
        numeral.accidental = Accidental::Flat;
    }
    numeral
}

/// Respell the root and every denominator of a token.
///
/// Each numeral is read in the key of the denominator to its right; the
/// outermost one is read in the local key.
pub fn apply_mode_conventions(token: &mut ChordToken, local_mode: Mode, minor_degrees: &[Degree]) {
    let modes: Vec<Mode> = token
        .applied_to
        .iter()
        .map(Numeral::mode)
        .chain(std::iter::once(local_mode))
        .collect();

    token.root = respell(token.root, modes[0], minor_degrees);
    for (den, mode) in token.applied_to.iter_mut().zip(modes.iter().skip(1)) {
        *den = respell(*den, *mode, minor_degrees);
    }
}

/// Tonic triad in second inversion with no quality of its own.
pub fn is_cadential_six_four(token: &ChordToken) -> bool {
    token.root.is_tonic() && token.form == Form::Default && token.figbass == Figbass::SixFour
}

/// Major dominant in root position, triad or seventh.
pub fn is_cadential_dominant(token: &ChordToken) -> bool {
    token.root == Numeral::major(Degree::V)
        && matches!(token.form, Form::Default | Form::Dominant)
        && matches!(token.figbass, Figbass::Root | Figbass::Seven)
}

/// Fold a cadential six-four into the dominant that follows it.
pub fn merge_cadential(dominant: &ChordToken) -> ChordToken {
    let mut merged = dominant.clone();
    merged.extensions.retain(|e| e != "64");
    merged.extensions.insert(0, "64".to_string());
    merged
}
