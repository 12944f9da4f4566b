//! Record normalizer: typed fields plus the friendly and reference-country
//! partitions every aggregation works from.

use crate::friendly::CountryClassifier;
use crate::settings::ReferenceCountry;
use crate::types::{NormalizedRecord, RawTradeRow, ReferenceMatch, TradeRecord};
use crate::util::{non_blank, parse_f64_safe, parse_flag, parse_i32_safe};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Quantity value meaning "not reported" in the source export.
pub const QTY_NOT_REPORTED: f64 = -1.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizeReport {
    pub total_rows: usize,
    /// Rows without a usable year; they cannot be assigned to any slice.
    pub rejected_rows: usize,
    /// Values that were missing, non-numeric or negative and became 0.
    pub coerced_values: usize,
    pub missing_quantity: usize,
    pub sentinel_quantity: usize,
    /// Rows whose friendliness came from the fallback classifier.
    pub classified_by_fallback: usize,
    pub reference_by_code: usize,
    pub reference_by_name: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedBatch {
    pub records: Vec<NormalizedRecord>,
    pub report: NormalizeReport,
}

impl NormalizedBatch {
    pub fn years(&self) -> BTreeSet<i32> {
        self.records.iter().map(|r| r.record.year).collect()
    }

    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &NormalizedRecord> + '_ {
        self.records.iter().filter(move |r| r.record.year == year)
    }
}

/// Coerce raw export rows and annotate them.
///
/// Malformed cells degrade to defaults (value → 0, quantity → undefined);
/// only rows without a year are dropped, and they are counted.
pub fn normalize(
    rows: &[RawTradeRow],
    reference: &ReferenceCountry,
    classifier: &dyn CountryClassifier,
) -> NormalizedBatch {
    let mut report = NormalizeReport {
        total_rows: rows.len(),
        ..Default::default()
    };
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(year) = parse_i32_safe(row.ref_year.as_deref()) else {
            report.rejected_rows += 1;
            continue;
        };

        let reporter_name = non_blank(row.reporter_desc.as_deref()).unwrap_or_default();
        let is_friendly = match parse_flag(row.is_friendly.as_deref()) {
            Some(flag) => flag,
            None => {
                report.classified_by_fallback += 1;
                classifier.is_friendly(&reporter_name)
            }
        };

        let value = match parse_f64_safe(row.primary_value.as_deref()) {
            Some(v) if v >= 0.0 => v,
            _ => {
                report.coerced_values += 1;
                0.0
            }
        };

        let quantity = parse_f64_safe(row.qty.as_deref());
        match quantity {
            None => report.missing_quantity += 1,
            Some(q) if q == QTY_NOT_REPORTED => report.sentinel_quantity += 1,
            _ => {}
        }

        records.push(TradeRecord {
            year,
            reporter_name,
            reporter_code: non_blank(row.reporter_iso.as_deref()),
            partner_name: non_blank(row.partner_desc.as_deref()).unwrap_or_default(),
            is_friendly,
            value,
            quantity,
            quantity_unit: non_blank(row.qty_unit_code.as_deref()).unwrap_or_default(),
        });
    }

    if report.rejected_rows > 0 {
        warn!(rows = report.rejected_rows, "skipped trade rows without a valid year");
    }

    let mut batch = annotate(records, reference);
    batch.report.total_rows = report.total_rows;
    batch.report.rejected_rows = report.rejected_rows;
    batch.report.coerced_values += report.coerced_values;
    batch.report.missing_quantity = report.missing_quantity;
    batch.report.sentinel_quantity = report.sentinel_quantity;
    batch.report.classified_by_fallback = report.classified_by_fallback;
    batch
}

/// Annotate already-typed records with their reference-country membership.
///
/// Values that are negative or not finite are reset to 0 here as well, so
/// typed callers get the same guarantees as CSV input.
pub fn annotate(records: Vec<TradeRecord>, reference: &ReferenceCountry) -> NormalizedBatch {
    let mut report = NormalizeReport {
        total_rows: records.len(),
        ..Default::default()
    };

    let records: Vec<NormalizedRecord> = records
        .into_iter()
        .map(|mut record| {
            if !record.value.is_finite() || record.value < 0.0 {
                report.coerced_values += 1;
                record.value = 0.0;
            }
            let (is_reference_country, matched_by) = match_reference(&record, reference);
            match matched_by {
                ReferenceMatch::Code => report.reference_by_code += 1,
                ReferenceMatch::NameFallback => report.reference_by_name += 1,
            }
            NormalizedRecord {
                record,
                is_reference_country,
                matched_by,
            }
        })
        .collect();

    if report.reference_by_name > 0 {
        let msg = format!(
            "{} of {} rows had no reporter code; reference country matched by name token '{}'",
            report.reference_by_name,
            records.len(),
            reference.name_token
        );
        warn!("{}", msg);
        report.warnings.push(msg);
    }
    debug!(
        rows = records.len(),
        by_code = report.reference_by_code,
        by_name = report.reference_by_name,
        "annotated trade records"
    );

    NormalizedBatch { records, report }
}

/// Code match when both sides carry an ISO code, name-token substring otherwise.
fn match_reference(record: &TradeRecord, reference: &ReferenceCountry) -> (bool, ReferenceMatch) {
    let wanted = reference.code.as_deref().map(str::trim).filter(|c| !c.is_empty());
    if let (Some(wanted), Some(have)) = (wanted, record.reporter_code.as_deref()) {
        return (have.trim().eq_ignore_ascii_case(wanted), ReferenceMatch::Code);
    }
    let token = reference.name_token.trim();
    let hit = !token.is_empty() && record.reporter_name.contains(token);
    (hit, ReferenceMatch::NameFallback)
}
