use std::fs;
use trade_metrics::friendly::StaticCountryList;
use trade_metrics::types::{TrackedMetric, TrendLabel, UnitScale};
use trade_metrics::{analyze_imports, analyze_production, build_report, loader, output, render_summary};
use trade_metrics::{EngineError, Settings};

const RECORDS: &str = "\
refYear,reporterDesc,reporterISO,partnerDesc,isFriendly,primaryValue,qty,qtyUnitCode
2021,China,CHN,Russian Federation,1,40,4,8
2021,Germany,DEU,Russian Federation,0,60,6,8
2022,China,CHN,Russian Federation,1,50,5,8
2022,Germany,DEU,Russian Federation,0,60,-1,8
2023,China,CHN,Russian Federation,1,61,10,8
2023,Germany,DEU,Russian Federation,0,60,6,8
,Germany,DEU,Russian Federation,0,999,1,8
";

const PRODUCTION: &str = "\
category,year,manufacture,consumption,code
TVs,2022,220,330,8528
TVs,2023,242,363,8528
Cars,2023,50,10,8703
";

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn settings() -> Settings {
    let mut s = Settings::default();
    s.units.production.scale = UnitScale::Units;
    s
}

#[test]
fn end_to_end_from_csv_files() {
    let dir = tempfile::tempdir().unwrap();
    let records_path = dir.path().join("records.csv");
    let production_path = dir.path().join("production.csv");
    fs::write(&records_path, RECORDS).unwrap();
    fs::write(&production_path, PRODUCTION).unwrap();

    let settings = settings();
    let (rows, load) = loader::load_trade_rows(&records_path).unwrap();
    assert_eq!(load.total_rows, 7);

    let imports = analyze_imports(&rows, &[2021, 2022, 2023], &settings, &StaticCountryList).unwrap();
    assert_eq!(imports.diagnostics.rejected_rows, 1);
    assert!(imports.diagnostics.warnings.is_empty());

    let s2022 = &imports.snapshots[&2022];
    assert!(close(s2022.import_total, 110.0));
    assert_eq!(s2022.price_others, None);
    assert_eq!(s2022.price_ratio, None);
    assert!(s2022.excluded_countries.contains("Russian Federation"));

    let latest = imports.latest().unwrap();
    assert_eq!(latest.year, 2023);
    assert!(close(latest.price_reference_country.unwrap(), 6.1));
    assert!(close(latest.price_others.unwrap(), 10.0));
    assert!(close(latest.price_ratio.unwrap(), 0.61));

    let total = &imports.trends.trends[&TrackedMetric::ImportTotal];
    assert!(close(total.delta_absolute, 21.0));
    assert!(close(total.delta_percent.unwrap(), 0.21));
    assert!(close(total.cagr.unwrap(), 0.1));
    assert_eq!(total.label, TrendLabel::Positive);

    assert_eq!(imports.flags.import_total_trend, TrendLabel::Positive);
    assert_eq!(imports.flags.share_unfriendly_trend, TrendLabel::Negative);
    assert_eq!(imports.flags.reference_country_share_trend, TrendLabel::Positive);
    assert!(imports.flags.dumping_flag);

    let (production_rows, _) = loader::load_production(&production_path).unwrap();
    let production = analyze_production(&production_rows, &imports, Some("8528"), &settings).unwrap();
    let tvs = &production.by_category["TVs"][&2023];
    assert!(close(tvs.import_value, 121.0));
    assert!(close(tvs.total_supply, 363.0));
    assert!(close(tvs.self_sufficiency, 242.0 / 363.0));
    assert!(close(tvs.import_dependency, 121.0 / 363.0));
    assert!(close(tvs.production_share, 242.0 / 363.0));
    assert!(close(tvs.competitiveness_index.unwrap(), 2.0));
    assert!(close(tvs.growth_rate.unwrap(), 0.1));
    assert!(close(tvs.import_growth_rate.unwrap(), 0.1));

    let cars = &production.by_category["Cars"][&2023];
    assert_eq!(cars.import_value, 0.0);
    assert_eq!(cars.competitiveness_index, None);
    assert_eq!(cars.growth_rate, None);

    let report = build_report(Some("8528"), imports, Some(production));
    let summary = report.production_summary.as_ref().unwrap();
    assert_eq!(summary["TVs"].latest_year, 2023);

    let json_path = dir.path().join("analysis.json");
    output::write_json(&json_path, &report).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert!(json["imports"]["snapshots"]["2022"]["price_ratio"].is_null());
    assert_eq!(json["imports"]["flags"]["dumping_flag"], serde_json::Value::Bool(true));
    assert_eq!(json["imports"]["trends"]["trends"]["import_total"]["label"], "Positive");
    assert!(json["production"]["by_category"]["Cars"]["2023"]["competitiveness_index"].is_null());
    assert_eq!(json["production"]["by_category"]["Cars"]["2023"]["import_dependency"], 0.0);

    let text = render_summary(&report);
    assert!(text.contains("[imports 2022]\n"));
    assert!(text.contains("price_ratio: 0.6100\n"));
    assert!(text.contains("dumping_flag: true\n"));
    assert!(text.contains("[production TVs 2022]\nmanufacture: 220.0000\n"));
    assert!(text.contains("growth_rate: undefined\n"));
    assert_eq!(text, render_summary(&report));
}

#[test]
fn missing_manufacture_column_stops_production_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("production.csv");
    fs::write(&path, "category,year,consumption\nTVs,2023,363\n").unwrap();
    let err = loader::load_production(&path).unwrap_err();
    assert!(matches!(err, EngineError::MissingColumns(ref cols) if cols.len() == 1 && cols[0] == "manufacture"));
}

#[test]
fn name_fallback_without_codes_is_flagged() {
    let csv = "refYear,reporterDesc,isFriendly,primaryValue\n2022,China,1,10\n2023,China,1,20\n2023,Poland,,5\n";
    let (rows, _) = loader::read_trade_rows(csv.as_bytes()).unwrap();
    let imports = analyze_imports(&rows, &[2022, 2023], &settings(), &StaticCountryList).unwrap();
    assert_eq!(imports.diagnostics.reference_by_name, 3);
    assert_eq!(imports.diagnostics.classified_by_fallback, 1);
    assert_eq!(imports.diagnostics.warnings.len(), 1);

    let s = &imports.snapshots[&2023];
    assert!(close(s.import_from_reference_country, 20.0));
    assert!(close(s.import_unfriendly, 5.0));
    let text = render_summary(&build_report(None, imports, None));
    assert!(text.contains("[diagnostics]\nwarning_1: "));
}

#[test]
fn single_year_cannot_be_trended() {
    let (rows, _) = loader::read_trade_rows("refYear,reporterDesc,primaryValue\n2023,China,1\n".as_bytes()).unwrap();
    let err = analyze_imports(&rows, &[2023], &settings(), &StaticCountryList).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientHistory(1)));
}
