//! Import metrics aggregator: one year's records → one snapshot.

use crate::normalize::{NormalizedBatch, QTY_NOT_REPORTED};
use crate::types::{ImportMetricsSnapshot, NormalizedRecord};
use crate::util::{ratio_or_none, ratio_or_zero};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Default)]
struct PriceAcc {
    value: f64,
    quantity: f64,
}

impl PriceAcc {
    fn unit_price(&self) -> Option<f64> {
        ratio_or_none(self.value, self.quantity)
    }
}

fn valid_quantity(q: Option<f64>) -> Option<f64> {
    q.filter(|q| *q > 0.0 && *q != QTY_NOT_REPORTED)
}

/// Reduce one year's records into a snapshot.
///
/// `rows` must already be restricted to `year`; nothing is filtered here.
/// Zero totals give zero shares, and prices without a positive quantity
/// base stay undefined.
pub fn calc_import_metrics<'a, I>(year: i32, rows: I) -> ImportMetricsSnapshot
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut record_count = 0usize;
    let mut import_total = 0.0;
    let mut import_friendly = 0.0;
    let mut import_unfriendly = 0.0;
    let mut import_reference = 0.0;
    let mut reference_price = PriceAcc::default();
    let mut others_price = PriceAcc::default();
    let mut excluded_countries = BTreeSet::new();

    for row in rows {
        let r = &row.record;
        debug_assert_eq!(r.year, year, "aggregator received a record from another year");
        record_count += 1;

        import_total += r.value;
        if r.is_friendly {
            import_friendly += r.value;
        } else {
            import_unfriendly += r.value;
        }
        if row.is_reference_country {
            import_reference += r.value;
        }

        if r.quantity == Some(QTY_NOT_REPORTED) && !r.partner_name.is_empty() {
            excluded_countries.insert(r.partner_name.clone());
        }
        if let Some(q) = valid_quantity(r.quantity) {
            let acc = if row.is_reference_country {
                &mut reference_price
            } else {
                &mut others_price
            };
            acc.value += r.value;
            acc.quantity += q;
        }
    }

    let price_reference_country = reference_price.unit_price();
    let price_others = others_price.unit_price();
    let price_ratio = match (price_reference_country, price_others) {
        (Some(reference), Some(others)) if reference != 0.0 && others != 0.0 => Some(reference / others),
        _ => None,
    };

    debug!(
        year,
        records = record_count,
        import_total,
        excluded = excluded_countries.len(),
        "computed import snapshot"
    );

    ImportMetricsSnapshot {
        year,
        record_count,
        import_total,
        import_friendly,
        import_unfriendly,
        import_from_reference_country: import_reference,
        share_friendly: ratio_or_zero(import_friendly, import_total),
        share_unfriendly: ratio_or_zero(import_unfriendly, import_total),
        share_reference_country: ratio_or_zero(import_reference, import_total),
        price_reference_country,
        price_others,
        price_ratio,
        excluded_countries,
    }
}

/// Snapshots for each requested year, computed in parallel.
///
/// A year with no records still yields a (zero) snapshot so the trend
/// series keeps its shape.
pub fn snapshots_by_year(batch: &NormalizedBatch, years: &[i32]) -> BTreeMap<i32, ImportMetricsSnapshot> {
    let wanted: BTreeSet<i32> = years.iter().copied().collect();
    wanted
        .into_par_iter()
        .map(|year| (year, calc_import_metrics(year, batch.for_year(year))))
        .collect()
}
