use crate::error::EngineError;
use crate::types::{ProductionRecord, RawProductionRow, RawTradeRow};
use crate::util::{non_blank, parse_f64_safe, parse_i32_safe};
use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;

pub const PRODUCTION_REQUIRED_COLUMNS: [&str; 4] = ["category", "year", "manufacture", "consumption"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
}

pub fn load_trade_rows(path: &Path) -> Result<(Vec<RawTradeRow>, LoadReport), EngineError> {
    read_trade_rows(File::open(path)?)
}

/// Read a trade export. Rows the CSV layer cannot decode at all are counted
/// and skipped; cell-level problems are left for the normalizer.
pub fn read_trade_rows<R: Read>(reader: R) -> Result<(Vec<RawTradeRow>, LoadReport), EngineError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut report = LoadReport::default();
    let mut rows = Vec::new();

    for result in rdr.deserialize::<RawTradeRow>() {
        report.total_rows += 1;
        match result {
            Ok(r) => rows.push(r),
            Err(e) => {
                warn!(error = %e, "undecodable trade row");
                report.parse_errors += 1;
            }
        }
    }
    Ok((rows, report))
}

pub fn load_production(path: &Path) -> Result<(Vec<ProductionRecord>, LoadReport), EngineError> {
    read_production(File::open(path)?)
}

/// Read a production/consumption table.
///
/// A missing required column rejects the whole input before any row is read.
/// Rows without a category or year are skipped and counted; missing or
/// non-numeric manufacture/consumption cells become 0.
pub fn read_production<R: Read>(reader: R) -> Result<(Vec<ProductionRecord>, LoadReport), EngineError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = PRODUCTION_REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::MissingColumns(missing));
    }

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for result in rdr.deserialize::<RawProductionRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "undecodable production row");
                report.parse_errors += 1;
                continue;
            }
        };
        let (Some(category), Some(year)) = (
            non_blank(row.category.as_deref()),
            parse_i32_safe(row.year.as_deref()),
        ) else {
            report.parse_errors += 1;
            continue;
        };
        records.push(ProductionRecord {
            category,
            year,
            manufacture: parse_f64_safe(row.manufacture.as_deref()).unwrap_or(0.0),
            consumption: parse_f64_safe(row.consumption.as_deref()).unwrap_or(0.0),
            code: non_blank(row.code.as_deref()),
        });
    }
    if report.parse_errors > 0 {
        warn!(rows = report.parse_errors, "skipped production rows without category or year");
    }
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manufacture_column_is_fatal() {
        let csv = "category,year,consumption\nTVs,2023,10\n";
        match read_production(csv.as_bytes()) {
            Err(EngineError::MissingColumns(cols)) => assert_eq!(cols, vec!["manufacture".to_string()]),
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn reads_production_with_optional_code() {
        let csv = "category,year,manufacture,consumption,code\n\
                   TVs,2022,1.5,2.0,8528\n\
                   TVs,2023,,2.5,\n\
                   ,2023,1,1,\n";
        let (records, report) = read_production(csv.as_bytes()).unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.parse_errors, 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].code.as_deref(), Some("8528"));
        assert_eq!(records[1].manufacture, 0.0);
        assert_eq!(records[1].code, None);
    }

    #[test]
    fn out_of_range_years_are_skipped() {
        let csv = "category,year,manufacture,consumption\n\
                   TVs,1e20,1,1\n\
                   TVs,-1e20,1,1\n\
                   TVs,2023.0,1,1\n";
        let (records, report) = read_production(csv.as_bytes()).unwrap();
        assert_eq!(report.parse_errors, 2);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year, 2023);
    }

    #[test]
    fn padded_headers_still_bind_values() {
        let csv = "category, year , manufacture,consumption \nTVs,2023,12.5,20\n";
        let (records, report) = read_production(csv.as_bytes()).unwrap();
        assert_eq!(report.parse_errors, 0);
        assert_eq!(records[0].manufacture, 12.5);
        assert_eq!(records[0].consumption, 20.0);
    }

    #[test]
    fn reads_trade_rows_without_optional_columns() {
        let csv = "refYear,reporterDesc,primaryValue\n2023,China,100\n2023,Germany,abc\n";
        let (rows, report) = read_trade_rows(csv.as_bytes()).unwrap();
        assert_eq!(report.total_rows, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].primary_value.as_deref(), Some("abc"));
        assert_eq!(rows[0].qty, None);
        assert_eq!(rows[0].is_friendly, None);
    }
}
