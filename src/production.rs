//! Production/consumption metrics joined against the yearly import snapshots.

use crate::error::EngineError;
use crate::settings::UnitSettings;
use crate::types::{ImportMetricsSnapshot, ProductionMetrics, ProductionRecord, ProductionSummary};
use crate::util::{growth, ratio_or_none, ratio_or_zero};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductionReport {
    pub by_category: BTreeMap<String, BTreeMap<i32, ProductionMetrics>>,
}

impl ProductionReport {
    pub fn is_empty(&self) -> bool {
        self.by_category.is_empty()
    }

    /// All rows, category then year ascending.
    pub fn rows(&self) -> impl Iterator<Item = &ProductionMetrics> {
        self.by_category.values().flat_map(|years| years.values())
    }

    /// Latest year per category.
    pub fn summary(&self) -> BTreeMap<String, ProductionSummary> {
        self.by_category
            .iter()
            .filter_map(|(category, years)| {
                let (&latest_year, m) = years.iter().next_back()?;
                Some((
                    category.clone(),
                    ProductionSummary {
                        latest_year,
                        self_sufficiency: m.self_sufficiency,
                        production_share: m.production_share,
                        import_dependency: m.import_dependency,
                        growth_rate: m.growth_rate,
                        competitiveness_index: m.competitiveness_index,
                        self_sufficiency_index: m.self_sufficiency_index,
                    },
                ))
            })
            .collect()
    }
}

/// Values of one (category, year) after rescaling and the import join.
#[derive(Debug, Clone, Copy)]
struct Joined {
    manufacture: f64,
    consumption: f64,
    import_value: f64,
}

/// Factor converting production values into the import dataset's unit.
///
/// Fails when the two datasets are declared in different currencies; only the
/// scale is reconciled.
pub fn rescale_factor(units: &UnitSettings) -> Result<f64, EngineError> {
    if !units
        .import
        .currency
        .trim()
        .eq_ignore_ascii_case(units.production.currency.trim())
    {
        return Err(EngineError::CurrencyMismatch {
            import: units.import.currency.clone(),
            production: units.production.currency.clone(),
        });
    }
    Ok(units.production.scale.multiplier() / units.import.scale.multiplier())
}

/// HS codes are hierarchical: `8528` covers `852872`.
fn code_matches(row_code: Option<&str>, commodity_code: Option<&str>) -> bool {
    match (row_code.map(str::trim), commodity_code.map(str::trim)) {
        (Some(row), Some(query)) if !row.is_empty() && !query.is_empty() => {
            row.starts_with(query) || query.starts_with(row)
        }
        _ => true,
    }
}

pub fn calculate_production_metrics(
    records: &[ProductionRecord],
    snapshots: &BTreeMap<i32, ImportMetricsSnapshot>,
    commodity_code: Option<&str>,
    units: &UnitSettings,
) -> Result<ProductionReport, EngineError> {
    let factor = rescale_factor(units)?;

    let mut grouped: BTreeMap<&str, BTreeMap<i32, &ProductionRecord>> = BTreeMap::new();
    for r in records {
        match grouped.entry(r.category.as_str()).or_default().entry(r.year) {
            Entry::Vacant(slot) => {
                slot.insert(r);
            }
            Entry::Occupied(_) => {
                return Err(EngineError::DuplicateProductionRow {
                    category: r.category.clone(),
                    year: r.year,
                });
            }
        }
    }

    let by_category = grouped
        .into_par_iter()
        .map(|(category, rows)| {
            let metrics = category_metrics(category, &rows, snapshots, commodity_code, factor);
            (category.to_string(), metrics)
        })
        .collect();

    Ok(ProductionReport { by_category })
}

fn category_metrics(
    category: &str,
    rows: &BTreeMap<i32, &ProductionRecord>,
    snapshots: &BTreeMap<i32, ImportMetricsSnapshot>,
    commodity_code: Option<&str>,
    factor: f64,
) -> BTreeMap<i32, ProductionMetrics> {
    // First pass: raw values per year, so growth can look back without
    // depending on derived metrics.
    let joined: BTreeMap<i32, Joined> = rows
        .iter()
        .map(|(&year, r)| {
            let import_value = if code_matches(r.code.as_deref(), commodity_code) {
                snapshots.get(&year).map(|s| s.import_total).unwrap_or(0.0)
            } else {
                0.0
            };
            let j = Joined {
                manufacture: r.manufacture * factor,
                consumption: r.consumption * factor,
                import_value,
            };
            (year, j)
        })
        .collect();

    let metrics: BTreeMap<i32, ProductionMetrics> = rows
        .iter()
        .map(|(&year, r)| {
            let cur = joined[&year];
            let prev = year.checked_sub(1).and_then(|y| joined.get(&y));
            let total_supply = cur.manufacture + cur.import_value;
            let m = ProductionMetrics {
                category: category.to_string(),
                year,
                manufacture: r.manufacture,
                consumption: r.consumption,
                import_value: cur.import_value,
                self_sufficiency: ratio_or_zero(cur.manufacture, cur.consumption),
                balance: cur.manufacture - cur.consumption,
                total_supply,
                import_dependency: ratio_or_zero(cur.import_value, total_supply),
                production_share: ratio_or_zero(cur.manufacture, total_supply),
                growth_rate: prev.and_then(|p| growth(cur.manufacture, p.manufacture)),
                consumption_growth_rate: prev.and_then(|p| growth(cur.consumption, p.consumption)),
                import_growth_rate: prev.and_then(|p| growth(cur.import_value, p.import_value)),
                competitiveness_index: ratio_or_none(cur.manufacture, cur.import_value),
                self_sufficiency_index: ratio_or_zero(cur.manufacture, cur.consumption).min(1.0),
            };
            (year, m)
        })
        .collect();

    debug!(category, years = metrics.len(), "computed production metrics");
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{UnitDeclaration, UnitScale};
    use std::collections::BTreeSet;

    fn units(production: UnitScale) -> UnitSettings {
        UnitSettings {
            import: UnitDeclaration {
                currency: "USD".to_string(),
                scale: UnitScale::Units,
            },
            production: UnitDeclaration {
                currency: "USD".to_string(),
                scale: production,
            },
        }
    }

    fn snap(year: i32, total: f64) -> (i32, ImportMetricsSnapshot) {
        (
            year,
            ImportMetricsSnapshot {
                year,
                record_count: 1,
                import_total: total,
                import_friendly: total,
                import_unfriendly: 0.0,
                import_from_reference_country: 0.0,
                share_friendly: 1.0,
                share_unfriendly: 0.0,
                share_reference_country: 0.0,
                price_reference_country: None,
                price_others: None,
                price_ratio: None,
                excluded_countries: BTreeSet::new(),
            },
        )
    }

    fn prod(category: &str, year: i32, manufacture: f64, consumption: f64) -> ProductionRecord {
        ProductionRecord {
            category: category.to_string(),
            year,
            manufacture,
            consumption,
            code: None,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn self_sufficiency_scenario_in_millions() {
        let snapshots: BTreeMap<_, _> = [snap(2023, 500_000.0)].into_iter().collect();
        let records = vec![prod("TVs", 2023, 1.0, 1.5)];
        let report =
            calculate_production_metrics(&records, &snapshots, None, &units(UnitScale::Millions)).unwrap();
        let m = &report.by_category["TVs"][&2023];
        assert!(close(m.self_sufficiency, 1.0 / 1.5));
        assert!(close(m.total_supply, 1_500_000.0));
        assert!(close(m.import_dependency, 1.0 / 3.0));
        assert!(close(m.production_share, 2.0 / 3.0));
        assert!(close(m.competitiveness_index.unwrap(), 2.0));
        assert!(close(m.balance, -500_000.0));
        assert!(close(m.self_sufficiency_index, 1.0 / 1.5));
        assert_eq!(m.manufacture, 1.0);
    }

    #[test]
    fn first_year_has_undefined_growth() {
        let snapshots: BTreeMap<_, _> = [snap(2022, 100.0), snap(2023, 150.0)].into_iter().collect();
        let records = vec![prod("A", 2023, 20.0, 10.0), prod("A", 2022, 10.0, 20.0)];
        let report =
            calculate_production_metrics(&records, &snapshots, None, &units(UnitScale::Units)).unwrap();
        let first = &report.by_category["A"][&2022];
        assert_eq!(first.growth_rate, None);
        assert_eq!(first.consumption_growth_rate, None);
        assert_eq!(first.import_growth_rate, None);

        let second = &report.by_category["A"][&2023];
        assert!(close(second.growth_rate.unwrap(), 1.0));
        assert!(close(second.consumption_growth_rate.unwrap(), -0.5));
        assert!(close(second.import_growth_rate.unwrap(), 0.5));
        assert_eq!(second.self_sufficiency_index, 1.0);
        assert!(close(second.self_sufficiency, 2.0));
    }

    #[test]
    fn gap_year_is_not_a_prior_year() {
        let snapshots: BTreeMap<_, _> = [snap(2021, 100.0), snap(2023, 100.0)].into_iter().collect();
        let records = vec![prod("A", 2021, 10.0, 10.0), prod("A", 2023, 20.0, 10.0)];
        let report =
            calculate_production_metrics(&records, &snapshots, None, &units(UnitScale::Units)).unwrap();
        assert_eq!(report.by_category["A"][&2023].growth_rate, None);
    }

    #[test]
    fn earliest_representable_year_has_no_prior() {
        let snapshots = BTreeMap::new();
        let records = vec![prod("A", i32::MIN, 5.0, 5.0)];
        let report =
            calculate_production_metrics(&records, &snapshots, None, &units(UnitScale::Units)).unwrap();
        assert_eq!(report.by_category["A"][&i32::MIN].growth_rate, None);
    }

    #[test]
    fn zero_prior_value_gives_undefined_growth() {
        let snapshots = BTreeMap::new();
        let records = vec![prod("A", 2022, 0.0, 0.0), prod("A", 2023, 5.0, 5.0)];
        let report =
            calculate_production_metrics(&records, &snapshots, None, &units(UnitScale::Units)).unwrap();
        let m = &report.by_category["A"][&2023];
        assert_eq!(m.growth_rate, None);
        assert_eq!(m.consumption_growth_rate, None);
        assert_eq!(m.import_growth_rate, None);
    }

    #[test]
    fn missing_import_year_gives_zero_import_and_undefined_competitiveness() {
        let snapshots = BTreeMap::new();
        let records = vec![prod("A", 2023, 5.0, 0.0)];
        let report =
            calculate_production_metrics(&records, &snapshots, None, &units(UnitScale::Units)).unwrap();
        let m = &report.by_category["A"][&2023];
        assert_eq!(m.import_value, 0.0);
        assert_eq!(m.competitiveness_index, None);
        assert_eq!(m.self_sufficiency, 0.0);
        assert_eq!(m.self_sufficiency_index, 0.0);
        assert_eq!(m.import_dependency, 0.0);
        assert_eq!(m.production_share, 1.0);
    }

    #[test]
    fn mismatched_code_is_not_joined() {
        let snapshots: BTreeMap<_, _> = [snap(2023, 100.0)].into_iter().collect();
        let mut other = prod("Other", 2023, 5.0, 5.0);
        other.code = Some("8703".to_string());
        let mut sub = prod("Sub", 2023, 5.0, 5.0);
        sub.code = Some("852872".to_string());
        let report = calculate_production_metrics(
            &[other, sub],
            &snapshots,
            Some("8528"),
            &units(UnitScale::Units),
        )
        .unwrap();
        assert_eq!(report.by_category["Other"][&2023].import_value, 0.0);
        assert_eq!(report.by_category["Sub"][&2023].import_value, 100.0);
    }

    #[test]
    fn currency_mismatch_fails_fast() {
        let mut u = units(UnitScale::Millions);
        u.production.currency = "RUB".to_string();
        let err = calculate_production_metrics(&[prod("A", 2023, 1.0, 1.0)], &BTreeMap::new(), None, &u)
            .unwrap_err();
        assert!(matches!(err, EngineError::CurrencyMismatch { .. }));
    }

    #[test]
    fn duplicate_rows_are_rejected() {
        let records = vec![prod("A", 2023, 1.0, 1.0), prod("A", 2023, 2.0, 2.0)];
        let err = calculate_production_metrics(&records, &BTreeMap::new(), None, &units(UnitScale::Units))
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateProductionRow { year: 2023, .. }));
    }

    #[test]
    fn summary_keeps_latest_year_per_category() {
        let records = vec![
            prod("A", 2021, 1.0, 2.0),
            prod("A", 2022, 3.0, 2.0),
            prod("B", 2020, 1.0, 4.0),
        ];
        let report =
            calculate_production_metrics(&records, &BTreeMap::new(), None, &units(UnitScale::Units)).unwrap();
        let summary = report.summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary["A"].latest_year, 2022);
        assert_eq!(summary["A"].self_sufficiency_index, 1.0);
        assert_eq!(summary["B"].latest_year, 2020);
        assert!(close(summary["B"].self_sufficiency, 0.25));
        assert_eq!(report.rows().count(), 3);
    }

    #[test]
    fn scale_factor_between_declared_units() {
        assert_eq!(rescale_factor(&units(UnitScale::Millions)).unwrap(), 1_000_000.0);
        let mut u = units(UnitScale::Units);
        u.import.scale = UnitScale::Thousands;
        assert_eq!(rescale_factor(&u).unwrap(), 0.001);
    }
}
