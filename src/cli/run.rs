use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::diagnostics::{LedgerStats, RunReport};
use crate::error::{PricePairError, Result};
use crate::export::{write_matched_pairs, write_run_report, write_summary_table};
use crate::fmt::signed_pct;
use crate::loader::load_ledger;
use crate::models::{EnrichedPair, LedgerRole};
use crate::pipeline::{self, Linked};
use crate::reference::{enrich, PostcodeDirectory};
use crate::reports::{summarize, Summary, SummaryTable};
use crate::settings::{get_data_dir, load_settings};

pub struct RunArgs {
    pub baseline: Vec<String>,
    pub current: Vec<String>,
    pub reference: Option<String>,
    pub output: Option<String>,
    pub baseline_year: Option<i32>,
    pub current_year: Option<i32>,
    pub no_map: bool,
}

fn default_output_dir() -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    get_data_dir().join("exports").join(format!("run-{date}"))
}

fn to_paths(files: &[String]) -> Vec<PathBuf> {
    files.iter().map(PathBuf::from).collect()
}

fn stats_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Ledger", "Loaded", "No key", "Dup groups", "Dropped", "Retained"]);
    let row = |label: &str, s: &LedgerStats| {
        vec![
            Cell::new(format!("{label} {}", s.year)),
            Cell::new(s.loaded),
            Cell::new(s.undefined_keys),
            Cell::new(s.duplicate_groups),
            Cell::new(s.discarded_duplicates),
            Cell::new(s.retained),
        ]
    };
    table.add_row(row("Baseline", &report.baseline));
    table.add_row(row("Current", &report.current));
    table
}

fn summary_table(table: &SummaryTable) -> Table {
    let mut out = Table::new();
    out.set_header(vec!["Group", "Pairs", "Mean change"]);
    for row in &table.rows {
        out.add_row(vec![
            Cell::new(&row.group),
            Cell::new(row.count),
            Cell::new(signed_pct(row.mean_percent_change)),
        ]);
    }
    out
}

fn print_issues(report: &RunReport) {
    let counts = report.issue_counts();
    if counts.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Data issue", "Count"]);
    for (label, n) in counts {
        table.add_row(vec![Cell::new(label), Cell::new(n)]);
    }
    println!("\n{}\n{table}", "Data issues".yellow().bold());
}

#[cfg(feature = "map")]
fn render_map(pairs: &[EnrichedPair], out_dir: &Path) -> Result<()> {
    let settings = load_settings();
    let path = out_dir.join("change_map.png");
    if crate::map::render_change_map(pairs, settings.map_width, settings.map_height, &path)? {
        println!("Wrote {}", path.display());
    } else {
        println!("No pair has a reference location; map skipped.");
    }
    Ok(())
}

#[cfg(not(feature = "map"))]
fn render_map(_pairs: &[EnrichedPair], _out_dir: &Path) -> Result<()> {
    Ok(())
}

pub fn run(args: RunArgs) -> Result<()> {
    let settings = load_settings();
    let baseline_year = args.baseline_year.unwrap_or(settings.baseline_year);
    let current_year = args.current_year.unwrap_or(settings.current_year);
    if baseline_year >= current_year {
        return Err(PricePairError::Other(format!(
            "baseline year {baseline_year} must be before current year {current_year}"
        )));
    }

    let baseline = load_ledger(&to_paths(&args.baseline), baseline_year, LedgerRole::Baseline)?;
    let current = load_ledger(&to_paths(&args.current), current_year, LedgerRole::Current)?;
    let directory = args
        .reference
        .as_deref()
        .map(|p| PostcodeDirectory::load(Path::new(p)))
        .transpose()?;
    if let Some(d) = &directory {
        println!("Reference directory: {} postcodes", d.len());
        if d.skipped_rows() > 0 {
            println!(
                "{}",
                format!("  {} unreadable reference rows skipped", d.skipped_rows()).yellow()
            );
        }
    }

    let outcome = pipeline::run(&baseline.ledger, &current.ledger);
    let mut report = outcome.report;
    // load-time issues first, in the order they happened
    let mut issues = baseline.issues;
    issues.extend(current.issues);
    issues.append(&mut report.issues);
    report.issues = issues;
    report.reference_rows_skipped = directory.as_ref().map_or(0, |d| d.skipped_rows());

    let out_dir = args.output.map(PathBuf::from).unwrap_or_else(default_output_dir);
    std::fs::create_dir_all(&out_dir)?;

    println!("{}\n{}", "Deduplication".bold(), stats_table(&report));
    println!(
        "\n{} matched pairs ({} baseline, {} current unmatched), {} priced",
        report.matched_pairs, report.unmatched_baseline, report.unmatched_current, report.priced_pairs
    );

    let enriched = match outcome.linked {
        Linked::NoMatches => {
            println!("{}", "No matched pairs: the two ledgers share no property.".yellow());
            Vec::new()
        }
        Linked::Matched(priced) => enrich(priced, directory.as_ref()),
    };

    match summarize(&enriched) {
        Summary::NoData => println!("No data to summarise."),
        Summary::Tables { overall, tables } => {
            println!(
                "Mean change across {} pairs: {} ({:.3}% of households in England and Wales)",
                overall.count,
                signed_pct(overall.mean_percent_change),
                report.coverage_pct()
            );
            for table in &tables {
                println!("\n{}\n{}", table.dimension.title().bold(), summary_table(table));
                write_summary_table(&out_dir, table)?;
            }
        }
    }
    print_issues(&report);

    write_matched_pairs(&out_dir.join("matched_pairs.csv"), &enriched)?;
    write_run_report(&out_dir.join("run_report.json"), &report)?;
    if !args.no_map {
        render_map(&enriched, &out_dir)?;
    }

    println!("\nExports written to {}", out_dir.display());
    Ok(())
}
