// src/output/mod.rs

pub mod arrow;

use ::arrow::csv::WriterBuilder;
use anyhow::{Context, Result};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::table::LongTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Parquet,
    Csv,
    /// One JSON object per line.
    Json,
}

impl OutputFormat {
    /// Guess from a file extension; unknown extensions give `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "parquet" | "pq" => Some(OutputFormat::Parquet),
            "csv" => Some(OutputFormat::Csv),
            "json" | "jsonl" | "ndjson" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

pub fn write_csv<W: Write>(table: &LongTable, out: W) -> Result<()> {
    let batch = arrow::to_record_batch(table)?;
    let mut writer = WriterBuilder::new().with_header(true).build(out);
    writer.write(&batch).context("writing CSV batch")?;
    Ok(())
}

pub fn write_json<W: Write>(table: &LongTable, mut out: W) -> Result<()> {
    for rec in table {
        serde_json::to_writer(&mut out, rec).context("serializing record")?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_parquet(table: &LongTable, file: File) -> Result<()> {
    let batch = arrow::to_record_batch(table)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Write `table` to `path`, via a temp file renamed into place.
pub fn write_table(table: &LongTable, path: &Path, format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    let temp_path = path.with_extension("tmp");
    let file = File::create(&temp_path)
        .with_context(|| format!("creating {}", temp_path.display()))?;

    match format {
        OutputFormat::Parquet => write_parquet(table, file)?,
        OutputFormat::Csv => write_csv(table, BufWriter::new(file))?,
        OutputFormat::Json => write_json(table, BufWriter::new(file))?,
    }

    fs::rename(&temp_path, path)
        .with_context(|| format!("moving {} to {}", temp_path.display(), path.display()))?;
    info!(path = %path.display(), rows = table.len(), ?format, "wrote table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Variable;
    use crate::table::LongRecord;
    use parquet::file::reader::{FileReader, SerializedFileReader};
    use tempfile::TempDir;

    fn table() -> LongTable {
        LongTable::new(vec![
            LongRecord {
                country_code: "AFG".into(),
                country_name: "Afghanistan".into(),
                year: 2020,
                indicator: "cc".into(),
                variable: Variable::Estimate,
                value: Some(-1.49),
            },
            LongRecord {
                country_code: "ALB".into(),
                country_name: "Albania".into(),
                year: 2021,
                indicator: "va".into(),
                variable: Variable::PctRank,
                value: None,
            },
        ])
    }

    #[test]
    fn csv_has_header_and_empty_nulls() -> Result<()> {
        let mut buf = Vec::new();
        write_csv(&table(), &mut buf)?;
        let text = String::from_utf8(buf)?;
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "countrycode,countryname,year,indicator,variable,value");
        assert_eq!(lines[1], "AFG,Afghanistan,2020,cc,estimate,-1.49");
        assert_eq!(lines[2], "ALB,Albania,2021,va,pctrank,");
        Ok(())
    }

    #[test]
    fn json_lines_use_table_column_names() -> Result<()> {
        let mut buf = Vec::new();
        write_json(&table(), &mut buf)?;
        let text = String::from_utf8(buf)?;
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap())?;
        assert_eq!(first["countrycode"], "AFG");
        assert_eq!(first["variable"], "estimate");
        assert_eq!(text.lines().count(), 2);
        Ok(())
    }

    #[test]
    fn parquet_round_trips_row_count() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("out/wgi.parquet");
        write_table(&table(), &path, OutputFormat::Parquet)?;
        let reader = SerializedFileReader::new(File::open(&path)?)?;
        assert_eq!(reader.metadata().file_metadata().num_rows(), 2);
        assert!(!path.with_extension("tmp").exists());
        Ok(())
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a.PARQUET")), Some(OutputFormat::Parquet));
        assert_eq!(OutputFormat::from_path(Path::new("a.ndjson")), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_path(Path::new("a.xlsx")), None);
    }
}
