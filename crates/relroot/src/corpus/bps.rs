//! Functional-harmony tables (`5/5 D7 0`).
//!
//! A record is the row's degree, quality and inversion cells joined by
//! whitespace. Degrees are Arabic numerals with `+`/`-` accidentals and `/`
//! secondaries; the quality cell decides case and form, so denominators take
//! their case from the diatonic triad on that degree.

use winnow::combinator::separated;
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use super::{Fixup, KeyContext, Normalizer, Reading};
use crate::error::ChordError;
use crate::parser::numeral::{accidental_from_run, PResult};
use crate::pipeline::RawRecord;
use crate::rules::{self, AugmentedSixth, ChordClass, RawChord};
use crate::token::{Accidental, ChordToken, Degree, Figbass, Form, Mode, Numeral};

const FIXUPS: &[Fixup] = &[Fixup {
    name: "minor-leading-tone-seventh",
    apply: minor_leading_tone_seventh,
}];

#[derive(Debug, Clone, Copy)]
pub struct Bps;

impl Normalizer for Bps {
    fn name(&self) -> &'static str {
        "bps"
    }

    fn read(&self, record: &RawRecord, context: &mut KeyContext) -> Result<Reading, ChordError> {
        context.follow(record);

        let text = record.raw_chord_text.trim();
        let cells: Vec<&str> = text.split_whitespace().collect();
        let [degree, quality, inversion] = *cells.as_slice() else {
            return Err(ChordError::malformed(
                text,
                "expected degree, quality and inversion cells",
            ));
        };

        let chain = degrees
            .parse(degree)
            .map_err(|e| ChordError::malformed(text, e.to_string()))?;
        let Some((numerator, denominators)) = chain.split_first() else {
            return Err(ChordError::malformed(text, "empty degree cell"));
        };
        let quality = Quality::from_cell(quality)
            .ok_or_else(|| ChordError::malformed(text, format!("unknown quality '{}'", quality)))?;
        let inversion: u8 = inversion
            .parse()
            .map_err(|_| ChordError::malformed(text, format!("unknown inversion '{}'", inversion)))?;

        let mut raw = match quality {
            Quality::AugmentedSixth => {
                let kind = if numerator.degree == Degree::II {
                    AugmentedSixth::French
                } else {
                    AugmentedSixth::German
                };
                RawChord::new(ChordClass::AugmentedSixth(kind))
            }
            Quality::Chord {
                minor,
                form,
                seventh,
            } => {
                let root = numerator.numeral(minor, degree)?;
                let mut raw = RawChord::new(ChordClass::Numeral { root, form });
                raw.figbass = Some(Figbass::from_inversion(inversion, seventh).ok_or_else(|| {
                    ChordError::malformed(text, format!("no inversion {} for this chord", inversion))
                })?);
                raw
            }
        };

        let column = applied_steps(record)?;
        let denominators = if denominators.is_empty() {
            column.as_slice()
        } else {
            denominators
        };

        // Each denominator is the diatonic triad of the key to its right.
        let mut applied = Vec::with_capacity(denominators.len());
        let mut mode = context.mode;
        for den in denominators.iter().rev() {
            let numeral = den.numeral(den.diatonic_minor(mode), degree)?;
            mode = numeral.mode();
            applied.push(numeral);
        }
        applied.reverse();
        raw.applied_to = applied;

        Ok(Reading::Chord(rules::build(raw)))
    }

    fn fixups(&self) -> &'static [Fixup] {
        FIXUPS
    }
}

/// One degree as written: accidental run and scale-step number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step<'a> {
    run: &'a str,
    degree: Degree,
}

impl Step<'_> {
    fn accidental(&self, cell: &str) -> Result<Accidental, ChordError> {
        accidental_from_run(&self.run.replace('+', "#"), cell)
    }

    fn numeral(&self, minor: bool, cell: &str) -> Result<Numeral, ChordError> {
        Ok(Numeral::new(self.accidental(cell)?, self.degree, minor))
    }

    /// Case of the triad a denominator names. Altered degrees read as
    /// borrowed chords: flat ones major, sharp ones minor.
    fn diatonic_minor(&self, mode: Mode) -> bool {
        if self.run.contains('-') {
            return false;
        }
        if self.run.contains('+') {
            return true;
        }
        match mode {
            Mode::Major => !matches!(self.degree, Degree::I | Degree::IV | Degree::V),
            Mode::Minor => !matches!(
                self.degree,
                Degree::III | Degree::V | Degree::VI | Degree::VII
            ),
        }
    }
}

fn step<'a>(input: &mut &'a str) -> PResult<Step<'a>> {
    let run = take_while(0.., ['+', '-']).parse_next(input)?;
    let number = one_of('1'..='7').parse_next(input)?;
    let degree = Degree::from_number(number as u8 - b'0').unwrap_or(Degree::I);
    Ok(Step { run, degree })
}

fn degrees<'a>(input: &mut &'a str) -> PResult<Vec<Step<'a>>> {
    separated(1.., step, '/').parse_next(input)
}

/// The applied-to column, written in the same step notation as the degree
/// cell (`5`, `5/5`).
fn applied_steps(record: &RawRecord) -> Result<Vec<Step<'_>>, ChordError> {
    let Some(text) = record
        .applied_to
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    else {
        return Ok(Vec::new());
    };
    degrees
        .parse(text)
        .map_err(|e| ChordError::malformed(text, e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quality {
    Chord { minor: bool, form: Form, seventh: bool },
    AugmentedSixth,
}

impl Quality {
    fn from_cell(cell: &str) -> Option<Quality> {
        let chord = |minor, form, seventh| Quality::Chord {
            minor,
            form,
            seventh,
        };
        let quality = match cell {
            "M" => chord(false, Form::Default, false),
            "m" => chord(true, Form::Default, false),
            "a" => chord(false, Form::Augmented, false),
            "d" => chord(true, Form::Diminished, false),
            "M7" => chord(false, Form::Major, true),
            "m7" => chord(true, Form::Default, true),
            "D7" => chord(false, Form::Default, true),
            "d7" => chord(true, Form::Diminished, true),
            "h7" => chord(true, Form::HalfDiminished, true),
            "a6" => Quality::AugmentedSixth,
            _ => return None,
        };
        Some(quality)
    }
}

/// The tables mark fully diminished leading-tone sevenths in minor keys as
/// half-diminished.
fn minor_leading_tone_seventh(token: &mut ChordToken, context: &KeyContext) -> bool {
    let mode = token
        .applied_to
        .first()
        .map(Numeral::mode)
        .unwrap_or(context.mode);
    let fires = mode == Mode::Minor
        && token.root == Numeral::minor(Degree::VII)
        && token.form == Form::HalfDiminished
        && token.has_seventh();
    if fires {
        token.form = Form::Diminished;
    }
    fires
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_in(mode: Mode, text: &str) -> Result<Reading, ChordError> {
        let record = RawRecord::new("bps_01", mode, text);
        Bps.read(&record, &mut KeyContext::new(None, mode))
    }

    fn chord_in(mode: Mode, text: &str) -> String {
        match read_in(mode, text) {
            Ok(Reading::Chord(token)) => token.to_string(),
            other => panic!("{} read as {:?}", text, other),
        }
    }

    fn chord(text: &str) -> String {
        chord_in(Mode::Major, text)
    }

    #[test]
    fn test_qualities() {
        assert_eq!(chord("5 D7 0"), "V7");
        assert_eq!(chord("2 m 1"), "ii6");
        assert_eq!(chord("1 M 2"), "I64");
        assert_eq!(chord("7 d 0"), "viio");
        assert_eq!(chord("7 h7 1"), "viih65");
        assert_eq!(chord("1 M7 3"), "IM42");
        assert_eq!(chord("3 a 0"), "III+");
        assert_eq!(chord("-6 M 0"), "-VI");
        assert_eq!(chord("+4 d7 0"), "#ivo7");
    }

    #[test]
    fn test_augmented_sixths() {
        assert_eq!(chord("2 a6 2"), "IIFr43");
        assert_eq!(chord("+4 a6 1"), "#ivGer65");
    }

    #[test]
    fn test_secondary_case_from_key() {
        assert_eq!(chord("5/5 D7 0"), "V7/V");
        assert_eq!(chord("7/5 d 0"), "viio/V");
        assert_eq!(chord("5/2 M 0"), "V/ii");
        assert_eq!(chord("5/-6 M 0"), "V/-VI");
        assert_eq!(chord_in(Mode::Minor, "5/4 M 0"), "V/iv");
        assert_eq!(chord_in(Mode::Minor, "5/3 M 0"), "V/III");
        // The inner 5 is read in the key of ii.
        assert_eq!(chord("5/5/2 M 0"), "V/V/ii");
    }

    #[test]
    fn test_applied_from_column() {
        let record = RawRecord::new("bps_01", Mode::Major, "5 D7 0").with_applied_to("5");
        let Ok(Reading::Chord(token)) = Bps.read(&record, &mut KeyContext::default()) else {
            panic!("expected a chord");
        };
        assert_eq!(token.to_string(), "V7/V");

        // An inline secondary wins over the column.
        let record = RawRecord::new("bps_01", Mode::Major, "5/2 M 0").with_applied_to("5");
        let Ok(Reading::Chord(token)) = Bps.read(&record, &mut KeyContext::default()) else {
            panic!("expected a chord");
        };
        assert_eq!(token.to_string(), "V/ii");

        let record = RawRecord::new("bps_01", Mode::Major, "5 D7 0").with_applied_to("V");
        assert!(matches!(
            Bps.read(&record, &mut KeyContext::default()),
            Err(ChordError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_rows() {
        assert!(matches!(read_in(Mode::Major, "5 D7"), Err(ChordError::MalformedToken { .. })));
        assert!(matches!(read_in(Mode::Major, "5 X 0"), Err(ChordError::MalformedToken { .. })));
        assert!(matches!(read_in(Mode::Major, "5 M 3"), Err(ChordError::MalformedToken { .. })));
        assert!(matches!(read_in(Mode::Major, "8 M 0"), Err(ChordError::MalformedToken { .. })));
        assert!(matches!(
            read_in(Mode::Major, "+-5 M 0"),
            Err(ChordError::UnknownSpelling(_))
        ));
    }

    #[test]
    fn test_minor_leading_tone_fixup() {
        let mut token: ChordToken = "viih7".parse().unwrap();
        assert!(minor_leading_tone_seventh(
            &mut token,
            &KeyContext::new(None, Mode::Minor)
        ));
        assert_eq!(token.form, Form::Diminished);

        let mut token: ChordToken = "viih7".parse().unwrap();
        assert!(!minor_leading_tone_seventh(&mut token, &KeyContext::default()));

        // Applied to a major key, the half-diminished spelling is right.
        let mut token: ChordToken = "viih7/III".parse().unwrap();
        assert!(!minor_leading_tone_seventh(
            &mut token,
            &KeyContext::new(None, Mode::Minor)
        ));
    }
}
