//! End-to-end tests for the `relroot` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A command isolated from the caller's config files and environment.
fn relroot(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("relroot").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("RELROOT_CONFIG")
        .env_remove("RELROOT_OUTPUT_DIR")
        .env_remove("RELROOT_MERGE_CADENTIAL")
        .env_remove("RELROOT_PARALLEL")
        .env_remove("RELROOT_LOG_LEVEL");
    cmd
}

const SONATA: &str = r#"{"piece_id":"p1","local_key_mode":"major","raw_chord_text":"I"}
{"piece_id":"p1","local_key_mode":"major","raw_chord_text":"viio/V"}
{"piece_id":"p1","local_key_mode":"major","raw_chord_text":"I64"}
{"piece_id":"p1","local_key_mode":"major","raw_chord_text":"V7"}

{"piece_id":"p1","local_key_mode":"major","raw_chord_text":"I"}
"#;

#[test]
fn resolves_secondary_dominant_seventh() {
    let home = TempDir::new().unwrap();
    relroot(&home)
        .args(["resolve", "V", "ii", "--seventh"])
        .assert()
        .success()
        .stdout("VId7\n");
}

#[test]
fn resolves_leading_tone_of_dominant() {
    let home = TempDir::new().unwrap();
    relroot(&home)
        .args(["resolve", "vii", "V"])
        .assert()
        .success()
        .stdout("#iv\n");
}

#[test]
fn resolves_chain_innermost_first() {
    let home = TempDir::new().unwrap();
    // V/V/ii
    relroot(&home)
        .args(["resolve", "V", "V", "ii"])
        .assert()
        .success()
        .stdout("III\n");
}

#[test]
fn rejects_unknown_spelling() {
    let home = TempDir::new().unwrap();
    relroot(&home)
        .args(["resolve", "V", "bbbVI"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bbbVI"));
}

#[test]
fn resolve_requires_a_denominator() {
    let home = TempDir::new().unwrap();
    relroot(&home).args(["resolve", "V"]).assert().failure();
}

#[test]
fn prints_lattice() {
    let home = TempDir::new().unwrap();
    relroot(&home)
        .arg("lattice")
        .assert()
        .success()
        .stdout(predicate::str::contains("15  I\n"))
        .stdout(predicate::str::contains(" 0  --IV\n"))
        .stdout(predicate::str::contains("34  ##VII\n"));
}

#[test]
fn normalizes_to_stdout() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("sonata.jsonl");
    fs::write(&input, SONATA).unwrap();

    relroot(&home)
        .args(["normalize", "--corpus", "dcml"])
        .arg(&input)
        .assert()
        .success()
        .stdout(r##"{"piece_id":"p1","chords":["I","#ivo","V7(64)","I"]}"##.to_string() + "\n");
}

#[test]
fn normalizes_from_stdin_without_merge() {
    let home = TempDir::new().unwrap();
    relroot(&home)
        .args(["normalize", "-c", "dcml", "--no-merge", "--sequential", "-"])
        .write_stdin(SONATA)
        .assert()
        .success()
        .stdout(predicate::str::contains(r##"["I","#ivo","I64","V7","I"]"##));
}

#[test]
fn writes_output_and_vocabulary_files() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("sonata.jsonl");
    fs::write(&input, SONATA).unwrap();
    let output = home.path().join("out/pieces.jsonl");
    let vocab = home.path().join("out/vocab.json");

    relroot(&home)
        .args(["normalize", "--corpus", "dcml"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--vocab")
        .arg(&vocab)
        .assert()
        .success()
        .stdout("");

    let pieces = fs::read_to_string(&output).unwrap();
    assert_eq!(pieces.lines().count(), 1);
    assert!(pieces.contains(r#""V7(64)""#));

    let chords: Vec<String> = serde_json::from_str(&fs::read_to_string(&vocab).unwrap()).unwrap();
    assert_eq!(chords, vec!["#ivo", "I", "V7(64)"]);
}

#[test]
fn reports_bad_record_line() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("broken.jsonl");
    fs::write(
        &input,
        "{\"piece_id\":\"p1\",\"local_key_mode\":\"major\",\"raw_chord_text\":\"I\"}\nnot json\n",
    )
    .unwrap();

    relroot(&home)
        .args(["normalize", "--corpus", "rock"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.jsonl:2"));
}

#[test]
fn rejects_unknown_corpus() {
    let home = TempDir::new().unwrap();
    relroot(&home)
        .args(["normalize", "--corpus", "jazz", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("jazz"));
}

#[test]
fn accepts_corpus_name_in_any_case() {
    let home = TempDir::new().unwrap();
    relroot(&home)
        .args(["normalize", "--corpus", "DCML", "--no-merge", "-"])
        .write_stdin(SONATA)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""I64","V7""#));
}

#[test]
fn shows_config_from_cli_path() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    fs::write(&config, "[normalize]\nmerge_cadential = false\n").unwrap();

    relroot(&home)
        .arg("config")
        .arg("--config")
        .arg(&config)
        .arg("--sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("merge_cadential = false"))
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn config_file_disables_merge() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join("relroot.toml"),
        "[normalize]\nmerge_cadential = false\n",
    )
    .unwrap();

    relroot(&home)
        .args(["normalize", "--corpus", "dcml", "-"])
        .write_stdin(SONATA)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""I64","V7""#));
}
