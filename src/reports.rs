use crate::pipeline::ImportAnalysis;
use crate::production::ProductionReport;
use crate::types::{ProductionRow, SnapshotRow, TrendRow};
use crate::util::{format_number, format_opt, format_pct};

/// One display row per analysed year, oldest first.
pub fn snapshot_rows(imports: &ImportAnalysis) -> Vec<SnapshotRow> {
    imports
        .snapshots
        .values()
        .map(|s| SnapshotRow {
            year: s.year,
            import_total: format_number(s.import_total, 2),
            import_unfriendly: format_number(s.import_unfriendly, 2),
            import_reference: format_number(s.import_from_reference_country, 2),
            share_unfriendly_pct: format_pct(Some(s.share_unfriendly)),
            share_reference_pct: format_pct(Some(s.share_reference_country)),
            price_ratio: format_opt(s.price_ratio, 3),
            excluded_countries: s.excluded_countries.len(),
        })
        .collect()
}

pub fn trend_rows(imports: &ImportAnalysis) -> Vec<TrendRow> {
    imports
        .trends
        .trends
        .iter()
        .map(|(metric, t)| {
            // Shares read better as percentages, totals as money.
            let (first, last) = if metric.name().starts_with("share_") {
                (format_pct(Some(t.first_value)), format_pct(Some(t.last_value)))
            } else {
                (format_number(t.first_value, 2), format_number(t.last_value, 2))
            };
            TrendRow {
                metric: metric.name().to_string(),
                first,
                last,
                change_pct: format_pct(t.delta_percent),
                cagr_pct: format_pct(t.cagr),
                trend: t.label.to_string(),
            }
        })
        .collect()
}

pub fn production_rows(report: &ProductionReport) -> Vec<ProductionRow> {
    report
        .rows()
        .map(|m| ProductionRow {
            category: m.category.clone(),
            year: m.year,
            self_sufficiency_pct: format_pct(Some(m.self_sufficiency)),
            import_dependency_pct: format_pct(Some(m.import_dependency)),
            production_share_pct: format_pct(Some(m.production_share)),
            growth_pct: format_pct(m.growth_rate),
            competitiveness: format_opt(m.competitiveness_index, 2),
        })
        .collect()
}
