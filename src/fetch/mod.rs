use std::io::{Cursor, Read};

use chrono::NaiveDate;
use csv::StringRecord;
use reqwest::blocking::Client;
use tracing::info;
use url::Url;
use zip::ZipArchive;

use crate::config::CountryConfig;
use crate::error::{FetchError, PipelineError, SchemaError};

/// Columns projected out of the source feed; everything else is dropped
/// without being parsed.
pub const SOURCE_COLUMNS: [&str; 3] = ["fecha", "total", "positivos"];

/// One row of the source feed: one lab submission for one calendar date.
/// The same date can appear many times, once per submitting lab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub date: NaiveDate,
    /// Determinations performed that day. Negative in the occasional
    /// malformed submission.
    pub total: i64,
    pub positives: i64,
}

/// Download the configured ZIP feed and parse its CSV entry into raw
/// records. One attempt; any failure aborts the run.
pub fn read(client: &Client, config: &CountryConfig) -> Result<Vec<RawRecord>, PipelineError> {
    let archive = download(client, config.source_url)?;
    let csv_bytes = unpack_csv(&archive, config.source_url)?;
    let records = parse_records(&csv_bytes)?;
    info!(rows = records.len(), "parsed source feed");
    Ok(records)
}

fn download(client: &Client, url_str: &str) -> Result<Vec<u8>, FetchError> {
    let url = Url::parse(url_str).map_err(|source| FetchError::Url {
        url: url_str.to_string(),
        source,
    })?;
    let bytes = client
        .get(url.as_str())
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.bytes())
        .map_err(|source| FetchError::Http {
            url: url_str.to_string(),
            source,
        })?;
    info!(url = url_str, bytes = bytes.len(), "downloaded feed");
    Ok(bytes.to_vec())
}

/// Extract the first `.csv` entry of the archive into memory.
fn unpack_csv(bytes: &[u8], url: &str) -> Result<Vec<u8>, FetchError> {
    let archive_err = |source| FetchError::Archive {
        url: url.to_string(),
        source,
    };

    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(archive_err)?;
    let entry = archive
        .file_names()
        .find(|name| name.to_ascii_lowercase().ends_with(".csv"))
        .map(str::to_string)
        .ok_or_else(|| FetchError::NoCsvEntry {
            url: url.to_string(),
        })?;

    let mut file = archive.by_name(&entry).map_err(archive_err)?;
    let mut out = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut out)
        .map_err(|e| archive_err(zip::result::ZipError::Io(e)))?;
    Ok(out)
}

/// Parse the feed CSV, keeping only the projected columns. Column order in
/// the feed does not matter; absence of a projected column is a schema
/// fault.
fn parse_records(csv_bytes: &[u8]) -> Result<Vec<RawRecord>, SchemaError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_bytes);

    let headers = reader.headers()?.clone();
    let position = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or(SchemaError::MissingColumn(name))
    };
    let [date_idx, total_idx, positives_idx] = SOURCE_COLUMNS.map(position);
    let (date_idx, total_idx, positives_idx) = (date_idx?, total_idx?, positives_idx?);

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // 1-based file line, counting the header.
        let line = i + 2;
        rows.push(RawRecord {
            date: date_cell(&record, line, date_idx)?,
            total: count_cell(&record, line, total_idx, "total")?,
            positives: count_cell(&record, line, positives_idx, "positivos")?,
        });
    }
    Ok(rows)
}

fn date_cell(record: &StringRecord, line: usize, idx: usize) -> Result<NaiveDate, SchemaError> {
    let raw = record.get(idx).unwrap_or("");
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| SchemaError::Cell {
        row: line,
        column: "fecha",
        value: raw.to_string(),
    })
}

fn count_cell(
    record: &StringRecord,
    line: usize,
    idx: usize,
    column: &'static str,
) -> Result<i64, SchemaError> {
    let raw = record.get(idx).unwrap_or("");
    raw.parse::<i64>().map_err(|_| SchemaError::Cell {
        row: line,
        column,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{ExtendedFileOptions, FileOptions};
    use zip::CompressionMethod;

    fn zip_with_entry(name: &str, body: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = FileOptions::<ExtendedFileOptions>::default()
                .compression_method(CompressionMethod::Deflated);
            writer.start_file(name, options).unwrap();
            writer.write_all(body).unwrap();
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn unpacks_csv_entry_from_archive() {
        let archive = zip_with_entry(
            "Covid19Determinaciones.csv",
            b"fecha,total,positivos\n2020-05-01,10,1\n",
        );
        let bytes = unpack_csv(&archive, "http://example/feed.zip").unwrap();
        assert!(bytes.starts_with(b"fecha,total,positivos"));
    }

    #[test]
    fn archive_without_csv_entry_is_a_fetch_error() {
        let archive = zip_with_entry("readme.txt", b"no data here");
        let err = unpack_csv(&archive, "http://example/feed.zip").unwrap_err();
        assert!(matches!(err, FetchError::NoCsvEntry { .. }));
    }

    #[test]
    fn parses_projected_columns_and_drops_the_rest() {
        let csv = "origen,fecha,determinacion,total,positivos\n\
                   lab-a,2020-05-01,PCR,100,7\n\
                   lab-b,2020-05-01,PCR,40,3\n";
        let rows = parse_records(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            RawRecord {
                date: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
                total: 100,
                positives: 7,
            }
        );
        assert_eq!(rows[1].total, 40);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let csv = "fecha,total\n2020-05-01,100\n";
        let err = parse_records(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn("positivos")));
    }

    #[test]
    fn unparseable_cell_names_line_and_column() {
        let csv = "fecha,total,positivos\n2020-05-01,cien,7\n";
        match parse_records(csv.as_bytes()).unwrap_err() {
            SchemaError::Cell { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "total");
                assert_eq!(value, "cien");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_totals_survive_parsing() {
        let csv = "fecha,total,positivos\n2020-01-04,-200,0\n";
        let rows = parse_records(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].total, -200);
    }
}
