//! Robust raw interval ingestion.
//!
//! The feeds have shipped both `;` and `,` delimited files over time, with
//! the occasional ragged row. The reader tries delimiters in order and
//! rejects any parse that collapses the file into a single column, then
//! resolves the header row through the source's alias schema.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use curtail_core::{CurtailError, CurtailResult, RawSample};
use tracing::debug;

use crate::schema::{ResolvedColumns, SourceSchema};

const DELIMITERS: &[u8] = b";,";

/// Read one raw monthly file into [`RawSample`]s.
///
/// Fatal when a required column resolves through no alias; ragged rows are
/// tolerated (short cells become missing fields).
pub fn read_raw_samples(path: &Path, schema: &SourceSchema) -> CurtailResult<Vec<RawSample>> {
    let mut content = Vec::new();
    File::open(path)
        .and_then(|mut file| file.read_to_end(&mut content))
        .with_context(|| format!("reading raw interval file '{}'", path.display()))
        .map_err(CurtailError::from)?;
    read_raw_samples_from_bytes(&content, schema)
}

/// Same as [`read_raw_samples`], over an in-memory buffer.
pub fn read_raw_samples_from_bytes(
    content: &[u8],
    schema: &SourceSchema,
) -> CurtailResult<Vec<RawSample>> {
    let (headers, records) = parse_records(content)?;
    let cols = schema.resolve(&headers)?;
    Ok(records
        .iter()
        .map(|record| to_sample(record, &cols))
        .collect())
}

fn parse_records(content: &[u8]) -> CurtailResult<(Vec<String>, Vec<csv::StringRecord>)> {
    for &delimiter in DELIMITERS {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(content);
        let headers: Vec<String> = match reader.headers() {
            Ok(headers) => headers.iter().map(|h| h.to_string()).collect(),
            Err(_) => continue,
        };
        // A single resulting column means we picked the wrong delimiter.
        if headers.len() <= 1 {
            continue;
        }
        let records: Vec<csv::StringRecord> =
            reader.records().filter_map(|result| result.ok()).collect();
        debug!(
            "parsed raw interval file with '{}' delimiter ({} rows)",
            delimiter as char,
            records.len()
        );
        return Ok((headers, records));
    }
    Err(CurtailError::Parse(
        "unable to parse raw file with ';' or ',' delimiters".to_string(),
    ))
}

fn cell(record: &csv::StringRecord, index: usize) -> Option<String> {
    record.get(index).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn to_sample(record: &csv::StringRecord, cols: &ResolvedColumns) -> RawSample {
    RawSample {
        timestamp: cell(record, cols.timestamp),
        entity: cell(record, cols.entity),
        restriction: cols.restriction.and_then(|i| cell(record, i)),
        generation: cell(record, cols.generation),
        reference: cell(record, cols.reference),
        availability: cols.availability.and_then(|i| cell(record, i)),
        limited: cols.limited.and_then(|i| cell(record, i)),
    }
}
