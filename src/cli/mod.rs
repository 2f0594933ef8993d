pub mod dedup;
pub mod demo;
pub mod init;
pub mod run;

use clap::{Parser, Subcommand};

use crate::models::LedgerRole;

#[derive(Parser)]
#[command(
    name = "pricepair",
    about = "Repeat-sale price change between two Price Paid years."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and save settings.
    Init {
        /// Path for pricepair data (default: ~/Documents/pricepair)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Link two years of Price Paid data and summarise the price change.
    Run {
        /// Price Paid CSV(s) for the baseline year, appended in order
        #[arg(long, required = true, num_args = 1..)]
        baseline: Vec<String>,
        /// Price Paid CSV(s) for the current year, appended in order
        #[arg(long, required = true, num_args = 1..)]
        current: Vec<String>,
        /// ONS Postcode Directory CSV for urban/rural and region lookup
        #[arg(long)]
        reference: Option<String>,
        /// Output directory (default: <data_dir>/exports/run-YYYY-MM-DD)
        #[arg(long)]
        output: Option<String>,
        /// Baseline year (default from settings: 2012)
        #[arg(long = "baseline-year")]
        baseline_year: Option<i32>,
        /// Current year (default from settings: 2022)
        #[arg(long = "current-year")]
        current_year: Option<i32>,
        /// Skip the PNG map
        #[arg(long = "no-map")]
        no_map: bool,
    },
    /// Deduplicate a single year's ledger and write the survivors.
    Dedup {
        /// Price Paid CSV(s), appended in order
        #[arg(required = true)]
        files: Vec<String>,
        /// baseline keeps the earliest sale per property, current the latest
        #[arg(long, value_enum)]
        role: LedgerRole,
        /// Ledger year (default from settings for the role)
        #[arg(long)]
        year: Option<i32>,
        /// Output CSV path
        #[arg(long)]
        output: String,
    },
    /// Write a small synthetic dataset to try pricepair on.
    Demo {
        /// Directory to write into (default: <data_dir>/sources/demo)
        #[arg(long)]
        dir: Option<String>,
    },
}
