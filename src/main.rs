// Command line entry point.
//
// `analyze` loads a trade export (and optionally a production table), runs
// the metrics pipeline, writes CSV/JSON/text outputs and prints markdown
// previews of each table.
use anyhow::Context;
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use trade_metrics::friendly::StaticCountryList;
use trade_metrics::{loader, output, pipeline, reports, util};
use trade_metrics::{load_settings, render_summary, Settings};

/// Import structure, trend and self-sufficiency metrics for one tariff code.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute yearly snapshots, trends, flags and production metrics.
    Analyze(AnalyzeArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// Trade export CSV (Comtrade-style headers).
    #[arg(long)]
    records: PathBuf,

    /// Production/consumption CSV with category, year, manufacture, consumption.
    #[arg(long)]
    production: Option<PathBuf>,

    /// Tariff code the export was queried for (e.g. "8528").
    #[arg(long)]
    code: Option<String>,

    /// Explicit years to analyse, comma separated.
    #[arg(long, value_delimiter = ',')]
    years: Vec<i32>,

    /// Last year of the default window; defaults to the previous calendar year.
    #[arg(long)]
    through_year: Option<i32>,

    /// Settings file (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the output files are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn resolve_years(args: &AnalyzeArgs, settings: &Settings) -> Vec<i32> {
    if !args.years.is_empty() {
        let mut years = args.years.clone();
        years.sort_unstable();
        years.dedup();
        return years;
    }
    let through = args.through_year.unwrap_or_else(|| Local::now().year() - 1);
    pipeline::year_window(through, settings.analysis.years_back)
}

fn handle_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.config.as_deref()).context("loading settings")?;
    let years = resolve_years(&args, &settings);

    let (rows, load_report) = loader::load_trade_rows(&args.records)
        .with_context(|| format!("reading {}", args.records.display()))?;
    println!(
        "Processing dataset... ({} rows loaded, {} undecodable)",
        util::format_int(load_report.total_rows),
        util::format_int(load_report.parse_errors)
    );

    let imports = pipeline::analyze_imports(&rows, &years, &settings, &StaticCountryList)?;
    let diag = &imports.diagnostics;
    println!(
        "Note: {} rows without a year skipped, {} values coerced to 0, {} rows classified by the default country list.",
        util::format_int(diag.rejected_rows),
        util::format_int(diag.coerced_values),
        util::format_int(diag.classified_by_fallback)
    );
    for w in &diag.warnings {
        println!("Warning: {}", w);
    }
    println!();

    let production = match &args.production {
        Some(path) => {
            let (records, prod_report) = loader::load_production(path)
                .with_context(|| format!("reading {}", path.display()))?;
            println!(
                "Production table: {} rows loaded, {} skipped.\n",
                util::format_int(prod_report.total_rows),
                util::format_int(prod_report.parse_errors)
            );
            Some(pipeline::analyze_production(
                &records,
                &imports,
                args.code.as_deref(),
                &settings,
            )?)
        }
        None => None,
    };

    let report = pipeline::build_report(args.code.as_deref(), imports, production);
    write_outputs(&args.out_dir, &report)
}

fn write_outputs(out_dir: &Path, report: &trade_metrics::AnalysisReport) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let snapshots = reports::snapshot_rows(&report.imports);
    let file1 = out_dir.join("snapshots.csv");
    output::write_csv(&file1, &snapshots)?;
    output::preview_table("Yearly Import Structure", Some("values in import currency units"), &snapshots, 10);
    println!("(Full table exported to {})\n", file1.display());

    let trends = reports::trend_rows(&report.imports);
    let file2 = out_dir.join("trends.csv");
    output::write_csv(&file2, &trends)?;
    let span = match (report.imports.trends.years.first(), report.imports.trends.years.last()) {
        (Some(a), Some(b)) => format!("{}–{}", a, b),
        _ => String::new(),
    };
    output::preview_table("Import Trends", Some(span.as_str()), &trends, 10);
    println!("(Full table exported to {})\n", file2.display());

    println!("Policy flags:");
    for (name, value) in report.imports.flags.entries() {
        println!("  {}: {}", name, value);
    }
    println!();

    if let Some(production) = &report.production {
        let rows = reports::production_rows(production);
        let file3 = out_dir.join("production.csv");
        output::write_csv(&file3, &rows)?;
        output::preview_table("Production & Self-Sufficiency", None, &rows, 6);
        println!("(Full table exported to {})\n", file3.display());
    }

    let json = out_dir.join("analysis.json");
    output::write_json(&json, report)?;
    let text = out_dir.join("summary.txt");
    output::write_text(&text, &render_summary(report))?;
    println!("Outputs saved to {} and {}", json.display(), text.display());
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => {
            if let Err(e) = handle_analyze(args) {
                eprintln!("Error during analysis: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}
