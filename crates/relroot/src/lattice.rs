//! Roman-numeral lattice.
//!
//! The 35 degree spellings (seven degrees times five accidental levels),
//! stored upper-case in line-of-fifths order. Adding coordinates modulo 35
//! adds the intervals they spell, which is what applied-chord transposition
//! needs. The table is immutable and freely shared between threads.

use crate::error::ChordError;

pub const LATTICE_SIZE: usize = 35;

/// Coordinate of `I`, the additive identity.
pub const TONIC_COORDINATE: usize = 15;

pub static LATTICE: [&str; LATTICE_SIZE] = [
    "--IV", "--I", "--V", "--II", "--VI", "--III", "--VII",
    "-IV", "-I", "-V", "-II", "-VI", "-III", "-VII",
    "IV", "I", "V", "II", "VI", "III", "VII",
    "#IV", "#I", "#V", "#II", "#VI", "#III", "#VII",
    "##IV", "##I", "##V", "##II", "##VI", "##III", "##VII",
];

/// Coordinate of a spelling. Case is ignored.
pub fn index_of(spelling: &str) -> Result<usize, ChordError> {
    let upper = spelling.to_ascii_uppercase();
    LATTICE
        .iter()
        .position(|entry| *entry == upper)
        .ok_or_else(|| ChordError::UnknownSpelling(spelling.to_string()))
}

/// Upper-case spelling at a coordinate, taken modulo the lattice size.
pub fn spelling_at(coordinate: usize) -> &'static str {
    LATTICE[coordinate % LATTICE_SIZE]
}

/// Add two coordinates as intervals above the tonic.
pub fn transpose(coordinate: usize, by: usize) -> usize {
    (coordinate + LATTICE_SIZE - TONIC_COORDINATE + by) % LATTICE_SIZE
}
