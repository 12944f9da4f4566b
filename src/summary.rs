// Plain-text rendering of an analysis for the recommendation generator.
//
// Output is `[section]` headers followed by `name: value` lines. Numbers use
// a fixed four-decimal format with no grouping, undefined values print as
// `undefined`, and every collection is iterated in key order, so identical
// inputs always render identically.
use crate::pipeline::AnalysisReport;
use std::fmt::Write;

const UNDEFINED: &str = "undefined";

fn num(v: f64) -> String {
    let s = format!("{:.4}", v);
    if s == "-0.0000" {
        "0.0000".to_string()
    } else {
        s
    }
}

fn opt(v: Option<f64>) -> String {
    v.map(num).unwrap_or_else(|| UNDEFINED.to_string())
}

pub fn render_summary(report: &AnalysisReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut out, report);
    out
}

fn write_summary(out: &mut String, report: &AnalysisReport) -> std::fmt::Result {
    let imports = &report.imports;

    writeln!(out, "[query]")?;
    writeln!(out, "commodity_code: {}", report.commodity_code.as_deref().unwrap_or(UNDEFINED))?;
    let years: Vec<String> = imports.trends.years.iter().map(|y| y.to_string()).collect();
    writeln!(out, "years: {}", years.join(", "))?;

    for (year, s) in &imports.snapshots {
        writeln!(out)?;
        writeln!(out, "[imports {}]", year)?;
        writeln!(out, "record_count: {}", s.record_count)?;
        writeln!(out, "import_total: {}", num(s.import_total))?;
        writeln!(out, "import_friendly: {}", num(s.import_friendly))?;
        writeln!(out, "import_unfriendly: {}", num(s.import_unfriendly))?;
        writeln!(out, "import_from_reference_country: {}", num(s.import_from_reference_country))?;
        writeln!(out, "share_unfriendly: {}", num(s.share_unfriendly))?;
        writeln!(out, "share_reference_country: {}", num(s.share_reference_country))?;
        writeln!(out, "price_reference_country: {}", opt(s.price_reference_country))?;
        writeln!(out, "price_others: {}", opt(s.price_others))?;
        writeln!(out, "price_ratio: {}", opt(s.price_ratio))?;
        let excluded = if s.excluded_countries.is_empty() {
            "none".to_string()
        } else {
            s.excluded_countries.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        writeln!(out, "excluded_countries: {}", excluded)?;
    }

    writeln!(out)?;
    writeln!(out, "[trends]")?;
    for (metric, t) in &imports.trends.trends {
        writeln!(out, "{}.first_value: {}", metric, num(t.first_value))?;
        writeln!(out, "{}.last_value: {}", metric, num(t.last_value))?;
        writeln!(out, "{}.delta_absolute: {}", metric, num(t.delta_absolute))?;
        writeln!(out, "{}.delta_percent: {}", metric, opt(t.delta_percent))?;
        writeln!(out, "{}.cagr: {}", metric, opt(t.cagr))?;
        writeln!(out, "{}.label: {}", metric, t.label)?;
    }

    writeln!(out)?;
    writeln!(out, "[flags]")?;
    for (name, value) in imports.flags.entries() {
        writeln!(out, "{}: {}", name, value)?;
    }

    if let Some(production) = &report.production {
        for m in production.rows() {
            writeln!(out)?;
            writeln!(out, "[production {} {}]", m.category, m.year)?;
            writeln!(out, "manufacture: {}", num(m.manufacture))?;
            writeln!(out, "consumption: {}", num(m.consumption))?;
            writeln!(out, "import_value: {}", num(m.import_value))?;
            writeln!(out, "self_sufficiency: {}", num(m.self_sufficiency))?;
            writeln!(out, "balance: {}", num(m.balance))?;
            writeln!(out, "total_supply: {}", num(m.total_supply))?;
            writeln!(out, "import_dependency: {}", num(m.import_dependency))?;
            writeln!(out, "production_share: {}", num(m.production_share))?;
            writeln!(out, "growth_rate: {}", opt(m.growth_rate))?;
            writeln!(out, "consumption_growth_rate: {}", opt(m.consumption_growth_rate))?;
            writeln!(out, "import_growth_rate: {}", opt(m.import_growth_rate))?;
            writeln!(out, "competitiveness_index: {}", opt(m.competitiveness_index))?;
            writeln!(out, "self_sufficiency_index: {}", num(m.self_sufficiency_index))?;
        }
    }

    let warnings = &imports.diagnostics.warnings;
    if !warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "[diagnostics]")?;
        for (i, w) in warnings.iter().enumerate() {
            writeln!(out, "warning_{}: {}", i + 1, w)?;
        }
    }
    Ok(())
}
