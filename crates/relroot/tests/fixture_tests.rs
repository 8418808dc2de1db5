//! Fixture-based tests for corpus normalization.
//!
//! Each `<corpus>_<name>.tsv` file in tests/fixtures/ holds raw records, one
//! per line (piece, mode, raw text, applied-to). The matching `.expected`
//! file lists each piece's canonical chords, space separated.

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use relroot::{normalize_corpus, CorpusKind, Mode, Options, RawRecord, Vocabulary};

fn fixture_path(name: &str, extension: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(format!("{}.{}", name, extension))
}

fn read_records(name: &str) -> Vec<RawRecord> {
    let path = fixture_path(name, "tsv");
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", name, e));

    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|line| {
            let fields: Vec<&str> = line.split('\t').collect();
            assert!(fields.len() >= 3, "Fixture {} has a short line: {:?}", name, line);
            let mode = match fields[1] {
                "major" => Mode::Major,
                "minor" => Mode::Minor,
                other => panic!("Fixture {} has unknown mode {}", name, other),
            };
            let mut record = RawRecord::new(fields[0], mode, fields[2]);
            if let Some(applied) = fields.get(3).filter(|a| !a.is_empty()) {
                record = record.with_applied_to(*applied);
            }
            record
        })
        .collect()
}

fn read_expected(name: &str) -> Vec<(String, Vec<String>)> {
    let path = fixture_path(name, "expected");
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read expected output {}: {}", name, e));

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (piece, chords) = line.split_once('\t').unwrap_or((line, ""));
            (
                piece.to_string(),
                chords.split_whitespace().map(str::to_string).collect(),
            )
        })
        .collect()
}

fn test_fixture(name: &str) {
    let corpus: CorpusKind = name
        .split('_')
        .next()
        .and_then(|prefix| prefix.parse().ok())
        .unwrap_or_else(|| panic!("Fixture {} does not start with a corpus name", name));

    let results = normalize_corpus(corpus.normalizer(), read_records(name), &Options::default());
    let actual: Vec<(String, Vec<String>)> = results
        .iter()
        .map(|r| (r.value.piece_id.clone(), r.value.chords.clone()))
        .collect();

    assert_eq!(actual, read_expected(name), "Fixture {} output differs", name);

    let vocabulary = Vocabulary::from_pieces(results.iter().map(|r| &r.value));
    let dropped: usize = results.iter().map(|r| r.dropped()).sum();
    println!(
        "Fixture {}: {} pieces, {} distinct chords, {} dropped",
        name,
        results.len(),
        vocabulary.len(),
        dropped
    );
}

#[test]
fn test_fixture_dcml_sonata() {
    test_fixture("dcml_sonata");
}

#[test]
fn test_fixture_bps_functional() {
    test_fixture("bps_functional");
}

#[test]
fn test_fixture_humdrum_chorale() {
    test_fixture("humdrum_chorale");
}

#[test]
fn test_fixture_rock_songs() {
    test_fixture("rock_songs");
}

#[test]
fn test_sequential_matches_parallel() {
    for name in ["dcml_sonata", "bps_functional"] {
        let corpus: CorpusKind = name.split('_').next().unwrap().parse().unwrap();
        let parallel = normalize_corpus(corpus.normalizer(), read_records(name), &Options::default());
        let sequential = normalize_corpus(
            corpus.normalizer(),
            read_records(name),
            &Options {
                parallel: false,
                ..Options::default()
            },
        );
        assert_eq!(parallel, sequential);
    }
}

#[test]
fn test_dropped_records_are_reported() {
    let results = normalize_corpus(
        CorpusKind::Dcml.normalizer(),
        read_records("dcml_sonata"),
        &Options::default(),
    );
    let warnings: Vec<_> = results.iter().flat_map(|r| r.warnings()).collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].text.as_deref(), Some("@none"));
}

#[test]
fn test_output_reparses() {
    for name in ["dcml_sonata", "bps_functional", "humdrum_chorale", "rock_songs"] {
        for (_, chords) in read_expected(name) {
            for chord in chords {
                let token: relroot::ChordToken = chord
                    .parse()
                    .unwrap_or_else(|e| panic!("{} in {} does not reparse: {}", chord, name, e));
                assert!(token.is_resolved());
                assert_eq!(token.to_string(), chord);
            }
        }
    }
}

/// Test that all fixtures in the directory are covered by tests
#[test]
fn test_all_fixtures_have_tests() {
    let fixtures_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures");

    let fixture_names: Vec<_> = fs::read_dir(&fixtures_dir)
        .expect("Failed to read fixtures directory")
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if path.extension()? == "tsv" {
                path.file_stem()?.to_str().map(|s| s.to_string())
            } else {
                None
            }
        })
        .collect();

    let tested = [
        "dcml_sonata",
        "bps_functional",
        "humdrum_chorale",
        "rock_songs",
    ];

    for name in &fixture_names {
        assert!(
            tested.contains(&name.as_str()),
            "Fixture {} exists but has no test",
            name
        );
        assert!(
            fixture_path(name, "expected").exists(),
            "Fixture {} has no expected output",
            name
        );
    }
}
