//! Subcommand implementations.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relroot::lattice::{spelling_at, LATTICE_SIZE};
use relroot::{
    normalize_corpus, resolve_chain, ChordToken, CorpusKind, Figbass, Numeral, Options, RawRecord,
    Vocabulary,
};
use rootconf::{ConfigSources, RelrootConfig};
use tracing::info;

pub struct NormalizeArgs {
    pub corpus: CorpusKind,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub vocab: Option<PathBuf>,
    pub no_merge: bool,
    pub sequential: bool,
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// One JSON record per line; blank lines are skipped.
fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    for (number, line) in open_input(path)?.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: RawRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid record", path.display(), number + 1))?;
        records.push(record);
    }
    Ok(records)
}

pub fn normalize(config: &RelrootConfig, args: &NormalizeArgs) -> Result<()> {
    let records = read_records(&args.input)?;
    let options = Options {
        merge_cadential: config.normalize.merge_cadential && !args.no_merge,
        parallel: config.normalize.parallel && !args.sequential,
    };
    info!(
        corpus = %args.corpus,
        records = records.len(),
        merge_cadential = options.merge_cadential,
        parallel = options.parallel,
        "normalizing"
    );

    let results = normalize_corpus(args.corpus.normalizer(), records, &options);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(create_output(&config.output_path(path))?),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for result in &results {
        serde_json::to_writer(&mut out, &result.value).context("Failed to write piece")?;
        writeln!(out)?;
    }
    out.flush()?;

    if let Some(path) = &args.vocab {
        let path = config.output_path(path);
        let vocabulary = Vocabulary::from_pieces(results.iter().map(|r| &r.value));
        let mut writer = create_output(&path)?;
        serde_json::to_writer_pretty(&mut writer, &vocabulary)
            .context("Failed to write vocabulary")?;
        writer.flush()?;
        info!(path = %path.display(), chords = vocabulary.len(), "wrote vocabulary");
    }

    Ok(())
}

pub fn resolve(num: &str, denominators: &[String], seventh: bool) -> Result<()> {
    let numerator: Numeral = num.parse()?;
    let chain = denominators
        .iter()
        .map(|den| den.parse::<Numeral>())
        .collect::<Result<Vec<_>, _>>()?;

    let resolution = resolve_chain(&numerator, &chain, seventh);
    let figbass = if seventh { Figbass::Seven } else { Figbass::Root };
    let token = ChordToken::new(resolution.root)
        .with_form(resolution.form())
        .with_figbass(figbass);
    println!("{}", token);
    Ok(())
}

pub fn lattice() -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for coordinate in 0..LATTICE_SIZE {
        writeln!(out, "{:>2}  {}", coordinate, spelling_at(coordinate))?;
    }
    Ok(())
}

pub fn config(config: &RelrootConfig, sources: &ConfigSources, show_sources: bool) -> Result<()> {
    if show_sources {
        for file in &sources.files {
            println!("# file: {}", file.display());
        }
        for var in &sources.env_overrides {
            println!("# env: {}", var);
        }
    }
    print!("{}", config.to_toml());
    Ok(())
}
