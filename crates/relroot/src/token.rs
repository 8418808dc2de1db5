//! Chord token model.
//!
//! A [`ChordToken`] is the unit that flows through normalization: a root
//! numeral, a quality tag, an inversion tag and a list of extensions. While a
//! token is mid-resolution it may also carry the chain of numerals it is
//! applied to; the canonical form never does.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ChordError;

/// Accidental prefix of a scale-degree spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    /// Signed number of chromatic steps away from the natural degree.
    pub fn offset(&self) -> i8 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    pub fn from_offset(offset: i8) -> Option<Accidental> {
        match offset {
            -2 => Some(Accidental::DoubleFlat),
            -1 => Some(Accidental::Flat),
            0 => Some(Accidental::Natural),
            1 => Some(Accidental::Sharp),
            2 => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }

    /// Canonical prefix: `--`, `-`, ``, `#`, `##`.
    pub fn symbol(&self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "--",
            Accidental::Flat => "-",
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "##",
        }
    }

    /// Respell a degree written against the minor scale onto the major-based
    /// lattice, one step down. Flats are left alone. Apply once per reading.
    pub fn minor_shift(&self) -> Accidental {
        match self {
            Accidental::DoubleSharp => Accidental::Sharp,
            Accidental::Sharp => Accidental::Natural,
            Accidental::Natural => Accidental::Flat,
            Accidental::Flat => Accidental::Flat,
            Accidental::DoubleFlat => Accidental::DoubleFlat,
        }
    }
}

/// Diatonic scale degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Degree {
    I,
    II,
    III,
    IV,
    V,
    VI,
    VII,
}

impl Degree {
    pub fn all() -> [Degree; 7] {
        [
            Degree::I,
            Degree::II,
            Degree::III,
            Degree::IV,
            Degree::V,
            Degree::VI,
            Degree::VII,
        ]
    }

    /// Upper-case Roman numeral.
    pub fn roman(&self) -> &'static str {
        match self {
            Degree::I => "I",
            Degree::II => "II",
            Degree::III => "III",
            Degree::IV => "IV",
            Degree::V => "V",
            Degree::VI => "VI",
            Degree::VII => "VII",
        }
    }

    /// Parse a Roman numeral, ignoring case.
    pub fn from_roman(s: &str) -> Option<Degree> {
        match s.to_ascii_uppercase().as_str() {
            "I" => Some(Degree::I),
            "II" => Some(Degree::II),
            "III" => Some(Degree::III),
            "IV" => Some(Degree::IV),
            "V" => Some(Degree::V),
            "VI" => Some(Degree::VI),
            "VII" => Some(Degree::VII),
            _ => None,
        }
    }

    /// Degree from its Arabic number (1-7).
    pub fn from_number(n: u8) -> Option<Degree> {
        Degree::all().get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn number(&self) -> u8 {
        *self as u8 + 1
    }

    /// Position of the natural degree on the line of fifths, relative to I.
    pub fn fifths(&self) -> i8 {
        match self {
            Degree::IV => -1,
            Degree::I => 0,
            Degree::V => 1,
            Degree::II => 2,
            Degree::VI => 3,
            Degree::III => 4,
            Degree::VII => 5,
        }
    }

    fn from_fifths(fifths: i8) -> Option<Degree> {
        match fifths {
            -1 => Some(Degree::IV),
            0 => Some(Degree::I),
            1 => Some(Degree::V),
            2 => Some(Degree::II),
            3 => Some(Degree::VI),
            4 => Some(Degree::III),
            5 => Some(Degree::VII),
            _ => None,
        }
    }
}

/// Major or minor key context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Major => write!(f, "major"),
            Mode::Minor => write!(f, "minor"),
        }
    }
}

/// A scale-degree spelling with case: accidental, degree and triad quality.
///
/// Case is tracked here as `minor`, not as a separate lattice point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Numeral {
    pub accidental: Accidental,
    pub degree: Degree,
    pub minor: bool,
}

impl Numeral {
    pub fn new(accidental: Accidental, degree: Degree, minor: bool) -> Self {
        Numeral {
            accidental,
            degree,
            minor,
        }
    }

    /// Upper-case natural numeral.
    pub fn major(degree: Degree) -> Self {
        Numeral::new(Accidental::Natural, degree, false)
    }

    /// Lower-case natural numeral.
    pub fn minor(degree: Degree) -> Self {
        Numeral::new(Accidental::Natural, degree, true)
    }

    /// Lattice coordinate in `[0, 34]`.
    pub fn coordinate(&self) -> usize {
        let position = crate::lattice::TONIC_COORDINATE as i8
            + self.degree.fifths()
            + 7 * self.accidental.offset();
        position as usize
    }

    /// Numeral at a lattice coordinate (taken modulo the lattice size).
    pub fn from_coordinate(coordinate: usize, minor: bool) -> Numeral {
        let fifths = (coordinate % crate::lattice::LATTICE_SIZE) as i8
            - crate::lattice::TONIC_COORDINATE as i8;
        let offset = (fifths + 1).div_euclid(7);
        // Both lookups are total over [0, 34]; fall back to the tonic rather than panic.
        let accidental = Accidental::from_offset(offset).unwrap_or(Accidental::Natural);
        let degree = Degree::from_fifths(fifths - 7 * offset).unwrap_or(Degree::I);
        Numeral::new(accidental, degree, minor)
    }

    /// Key mode implied by the numeral's case when it is used as a local tonic.
    pub fn mode(&self) -> Mode {
        if self.minor {
            Mode::Minor
        } else {
            Mode::Major
        }
    }

    /// Natural first degree, either case.
    pub fn is_tonic(&self) -> bool {
        self.degree == Degree::I && self.accidental == Accidental::Natural
    }

    /// Upper-case spelling, the form the lattice stores.
    pub fn upper_spelling(&self) -> String {
        format!("{}{}", self.accidental.symbol(), self.degree.roman())
    }
}

impl fmt::Display for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roman = self.degree.roman();
        if self.minor {
            write!(f, "{}{}", self.accidental.symbol(), roman.to_ascii_lowercase())
        } else {
            write!(f, "{}{}", self.accidental.symbol(), roman)
        }
    }
}

/// Chord quality tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Form {
    /// Unmarked: the numeral's case and figbass say everything.
    #[default]
    Default,
    /// `M`: major seventh.
    Major,
    /// `d`: major triad with a minor seventh on a resolved applied root.
    Dominant,
    /// `h`: half-diminished.
    HalfDiminished,
    /// `o`: diminished.
    Diminished,
    /// `+`: augmented.
    Augmented,
    /// `p`: power chord (no third).
    Power,
    German,
    French,
    Italian,
    /// `Ct`: common-tone diminished seventh.
    CommonTone,
}

impl Form {
    pub fn symbol(&self) -> &'static str {
        match self {
            Form::Default => "",
            Form::Major => "M",
            Form::Dominant => "d",
            Form::HalfDiminished => "h",
            Form::Diminished => "o",
            Form::Augmented => "+",
            Form::Power => "p",
            Form::German => "Ger",
            Form::French => "Fr",
            Form::Italian => "It",
            Form::CommonTone => "Ct",
        }
    }

    pub fn is_augmented_sixth(&self) -> bool {
        matches!(self, Form::German | Form::French | Form::Italian)
    }
}

/// Inversion / figured-bass tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Figbass {
    /// Root-position triad, rendered as nothing.
    #[default]
    Root,
    Six,
    SixFour,
    Seven,
    SixFive,
    FourThree,
    FourTwo,
}

impl Figbass {
    pub fn symbol(&self) -> &'static str {
        match self {
            Figbass::Root => "",
            Figbass::Six => "6",
            Figbass::SixFour => "64",
            Figbass::Seven => "7",
            Figbass::SixFive => "65",
            Figbass::FourThree => "43",
            Figbass::FourTwo => "42",
        }
    }

    pub fn is_seventh(&self) -> bool {
        matches!(
            self,
            Figbass::Seven | Figbass::SixFive | Figbass::FourThree | Figbass::FourTwo
        )
    }

    /// Figbass for an inversion number of a triad or seventh chord.
    pub fn from_inversion(inversion: u8, seventh: bool) -> Option<Figbass> {
        match (inversion, seventh) {
            (0, false) => Some(Figbass::Root),
            (1, false) => Some(Figbass::Six),
            (2, false) => Some(Figbass::SixFour),
            (0, true) => Some(Figbass::Seven),
            (1, true) => Some(Figbass::SixFive),
            (2, true) => Some(Figbass::FourThree),
            (3, true) => Some(Figbass::FourTwo),
            _ => None,
        }
    }
}

/// One chord annotation, canonical once `applied_to` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChordToken {
    pub root: Numeral,
    pub form: Form,
    pub figbass: Figbass,
    pub extensions: Vec<String>,
    /// Denominators, innermost first: `V/V/ii` stores `[V, ii]`.
    pub applied_to: Vec<Numeral>,
}

impl ChordToken {
    pub fn new(root: Numeral) -> Self {
        ChordToken {
            root,
            form: Form::Default,
            figbass: Figbass::Root,
            extensions: Vec::new(),
            applied_to: Vec::new(),
        }
    }

    pub fn with_form(mut self, form: Form) -> Self {
        self.form = form;
        self
    }

    pub fn with_figbass(mut self, figbass: Figbass) -> Self {
        self.figbass = figbass;
        self
    }

    pub fn applied(mut self, denominators: Vec<Numeral>) -> Self {
        self.applied_to = denominators;
        self
    }

    /// Append an extension unless the figbass or an earlier extension already says it.
    pub fn add_extension(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        if symbol.is_empty()
            || symbol == self.figbass.symbol()
            || self.extensions.contains(&symbol)
        {
            return;
        }
        self.extensions.push(symbol);
    }

    pub fn has_seventh(&self) -> bool {
        self.figbass.is_seventh()
    }

    pub fn is_resolved(&self) -> bool {
        self.applied_to.is_empty()
    }

    /// Check the invariants a well-formed token must satisfy.
    pub fn validate(&self) -> Result<(), ChordError> {
        if self.form == Form::Dominant && (self.root.minor || !self.has_seventh()) {
            return Err(ChordError::malformed(
                self.to_string(),
                "form 'd' needs an upper-case root and a seventh figbass",
            ));
        }
        if self
            .extensions
            .iter()
            .any(|e| e.as_str() == self.figbass.symbol())
        {
            return Err(ChordError::malformed(
                self.to_string(),
                "extension repeats the figbass",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ChordToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.root, self.form.symbol(), self.figbass.symbol())?;
        if !self.extensions.is_empty() {
            write!(f, "({})", self.extensions.join(","))?;
        }
        for denominator in &self.applied_to {
            write!(f, "/{}", denominator)?;
        }
        Ok(())
    }
}
