use crate::error::{MapError, Result};
use crate::types::{CsvRow, RawRow};
use crate::util::parse_count_safe;
use csv::ReaderBuilder;
use std::io::Read;
use tracing::debug;

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "Country_Region",
    "Province_State",
    "Admin2",
    "Confirmed",
    "Deaths",
    "Recovered",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

pub fn load_rows_from_str(resource: &str, text: &str) -> Result<(Vec<RawRow>, LoadReport)> {
    let text = text.trim_start_matches('\u{feff}');
    load_rows(resource, text.as_bytes())
}

pub fn load_rows<R: Read>(resource: &str, reader: R) -> Result<(Vec<RawRow>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers().map_err(|e| MapError::parse(resource, e))?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(MapError::parse(resource, format!("missing column '{}'", column)));
        }
    }

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut rows: Vec<RawRow> = Vec::new();

    for result in rdr.deserialize::<CsvRow>() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(resource, error = %e, "skipping undecodable row");
                parse_errors += 1;
                continue;
            }
        };

        let country = match row.country_region.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => { parse_errors += 1; continue; }
        };
        let confirmed = match parse_count_safe(row.confirmed.as_deref()) { Some(v) => v, None => { parse_errors += 1; continue; } };
        let deaths = match parse_count_safe(row.deaths.as_deref()) { Some(v) => v, None => { parse_errors += 1; continue; } };
        let recovered = match parse_count_safe(row.recovered.as_deref()) { Some(v) => v, None => { parse_errors += 1; continue; } };

        let state = row.province_state.unwrap_or_default().trim().to_string();
        let county = row.admin2.unwrap_or_default().trim().to_string();

        rows.push(RawRow {
            country,
            state,
            county,
            confirmed,
            deaths,
            recovered,
        });
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: rows.len(),
        parse_errors,
    };
    Ok((rows, report))
}
