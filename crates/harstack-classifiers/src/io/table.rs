//! Delimited observation-table reader.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::data_handling::ObservationTable;

/// Configuration for reading delimited observation tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Field delimiter. When `None`, `.tsv` files use a tab and everything
    /// else a comma.
    pub delimiter: Option<char>,
    /// Cell values (after trimming) that are read as missing.
    pub na_strings: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            na_strings: vec!["".to_string(), "NA".to_string()],
        }
    }
}

impl LoaderConfig {
    fn delimiter_for(&self, path: &Path) -> Result<u8> {
        if let Some(d) = self.delimiter {
            if !d.is_ascii() {
                return Err(anyhow!("Delimiter {:?} is not a single-byte ASCII character", d));
            }
            return Ok(d as u8);
        }
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());
        Ok(match ext.as_deref() {
            Some("tsv") => b'\t',
            _ => b',',
        })
    }

    fn is_missing(&self, value: &str) -> bool {
        self.na_strings.iter().any(|na| na == value)
    }
}

/// Read a delimited table with the default loader configuration.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<ObservationTable> {
    read_table_with_config(path, &LoaderConfig::default())
}

/// Read a delimited table with a header row into an [`ObservationTable`].
pub fn read_table_with_config<P: AsRef<Path>>(
    path: P,
    config: &LoaderConfig,
) -> Result<ObservationTable> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter_for(path)?)
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open table: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();
    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    if headers.is_empty() {
        return Err(anyhow!("Table {} has an empty header", path.display()));
    }

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to read row {} of {}", row_idx + 1, path.display())
        })?;
        rows.push(parse_record(&record, headers.len(), row_idx, config)?);
    }

    let table = ObservationTable::new(headers, rows);
    log::debug!(
        "Loaded {} rows x {} columns from {} ({} missing cells)",
        table.nrows(),
        table.ncols(),
        path.display(),
        table.count_missing()
    );
    Ok(table)
}

fn parse_record(
    record: &StringRecord,
    width: usize,
    row_idx: usize,
    config: &LoaderConfig,
) -> Result<Vec<Option<String>>> {
    if record.len() != width {
        return Err(anyhow!(
            "Row {} has {} fields but the header has {}",
            row_idx + 1,
            record.len(),
            width
        ));
    }
    Ok(record
        .iter()
        .map(|value| {
            let trimmed = value.trim();
            if config.is_missing(trimmed) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn empty_and_na_cells_are_missing() {
        let (_dir, path) = write_temp("t.csv", "a,b,c\n1,,NA\n\"2\", 3 ,x\n");
        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows[0], vec![Some("1".to_string()), None, None]);
        assert_eq!(
            table.rows[1],
            vec![
                Some("2".to_string()),
                Some("3".to_string()),
                Some("x".to_string())
            ]
        );
        assert_eq!(table.count_missing(), 2);
    }

    #[test]
    fn tsv_extension_selects_tab_delimiter() {
        let (_dir, path) = write_temp("t.tsv", "a\tb\n1\t2\n");
        let table = read_table(&path).unwrap();
        assert_eq!(table.ncols(), 2);
        assert_eq!(table.rows[0][1].as_deref(), Some("2"));
    }

    #[test]
    fn custom_na_strings() {
        let (_dir, path) = write_temp("t.csv", "a,b\n#DIV/0!,1\n");
        let config = LoaderConfig {
            na_strings: vec!["#DIV/0!".to_string()],
            ..LoaderConfig::default()
        };
        let table = read_table_with_config(&path, &config).unwrap();
        assert_eq!(table.rows[0][0], None);
    }

    #[test]
    fn explicit_delimiter_must_be_ascii() {
        let (_dir, path) = write_temp("t.csv", "a;b\n1;2\n");
        let semicolon = LoaderConfig {
            delimiter: Some(';'),
            ..LoaderConfig::default()
        };
        assert_eq!(read_table_with_config(&path, &semicolon).unwrap().ncols(), 2);

        let wide = LoaderConfig {
            delimiter: Some('§'),
            ..LoaderConfig::default()
        };
        let err = read_table_with_config(&path, &wide).unwrap_err();
        assert!(format!("{:#}", err).contains("not a single-byte ASCII character"));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let (_dir, path) = write_temp("t.csv", "a,b\n1,2,3\n");
        let err = read_table(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Row 1 has 3 fields"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_table("/nonexistent/table.csv").is_err());
    }
}
