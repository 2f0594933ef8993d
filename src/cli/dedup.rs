use std::path::{Path, PathBuf};

use crate::dedup::{deduplicate, Retain};
use crate::error::Result;
use crate::export::write_ledger;
use crate::loader::load_ledger;
use crate::models::LedgerRole;
use crate::settings::load_settings;

pub fn run(files: &[String], role: LedgerRole, year: Option<i32>, output: &str) -> Result<()> {
    let settings = load_settings();
    let year = year.unwrap_or(match role {
        LedgerRole::Baseline => settings.baseline_year,
        LedgerRole::Current => settings.current_year,
    });
    let paths: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();

    let loaded = load_ledger(&paths, year, role)?;
    let retain = Retain::for_role(role);
    let out = deduplicate(&loaded.ledger, retain);

    write_ledger(Path::new(output), &out.ledger.records)?;

    println!(
        "{} loaded, {} load issues, {} without identity key",
        loaded.ledger.len(),
        loaded.issues.len(),
        out.undefined_keys()
    );
    println!(
        "{} duplicate groups, {} records dropped (kept {} sale), {} retained",
        out.duplicate_groups,
        out.discarded_duplicates,
        match retain {
            Retain::Earliest => "earliest",
            Retain::Latest => "latest",
        },
        out.ledger.len()
    );
    println!("Wrote {output}");
    Ok(())
}
