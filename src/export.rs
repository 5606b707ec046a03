use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::parser::record::{OutputRow, HEADERS};

/// `data/ggzy-YYYYMMDD.tsv` for today.
pub fn default_path() -> PathBuf {
    let date = chrono::Local::now().format("%Y%m%d");
    PathBuf::from(format!("data/ggzy-{}.tsv", date))
}

/// Header line plus one tab-separated line per row.
pub fn write_tsv<W: Write>(writer: W, rows: &[OutputRow]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);
    wtr.write_record(HEADERS)?;
    for row in rows {
        wtr.write_record(row.columns())?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_file(path: &Path, rows: &[OutputRow]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_tsv(file, rows)
}
