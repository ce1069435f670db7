use anyhow::{bail, Context, Result};
use lexmatch::TextualEntry;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loads `text;origin` records from a file, or from every `*.csv` file below
/// a directory in path order.
///
/// Records with fewer than two columns or an empty text are skipped. Columns
/// past the second are ignored. Fails on a malformed file or if nothing could
/// be read.
pub fn load_delimited(path: &Path) -> Result<Vec<TextualEntry>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && p.extension().and_then(|s| s.to_str()) == Some("csv") {
                files.push(p.to_path_buf());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        bail!("corpus path {} does not exist", path.display());
    }

    let mut entries = Vec::new();
    for file in &files {
        let contents = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
        let before = entries.len();
        entries.extend(parse_delimited(&contents).with_context(|| format!("parsing {}", file.display()))?);
        tracing::debug!(file = %file.display(), records = entries.len() - before, "loaded corpus file");
    }
    if entries.is_empty() {
        bail!("no `text;origin` records found in {}", path.display());
    }
    Ok(entries)
}

/// Parses `;`-delimited records without a header. Fields may be quoted, so a
/// text can contain `;` or line breaks.
pub fn parse_delimited(contents: &[u8]) -> Result<Vec<TextualEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(contents);

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.context("malformed `text;origin` record")?;
        let (Some(text), Some(origin)) = (record.get(0), record.get(1)) else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        entries.push(TextualEntry::with_origin(text, origin));
    }
    Ok(entries)
}
