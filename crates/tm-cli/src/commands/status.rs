//! Status command implementation

use anyhow::{Context, Result};
use tm_core::{Migrator, StatusReport};

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{self, print_json, version_label};

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let target = common::resolve_target(global)?;
    let db = common::open_database(&target)?;

    let report = Migrator::new(&db)
        .status(&target.migrations_dir)
        .context("Failed to read migration status")?;

    match args.output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_text(&report, global.verbose),
    }
    Ok(())
}

/// Print a status report in human-readable form.
pub(crate) fn print_text(report: &StatusReport, verbose: bool) {
    println!(
        "Found total of {} migration files.",
        report.discovered.len()
    );
    println!("Current version is {}", version_label(report.current_version));

    if verbose {
        for version in &report.applied {
            println!("  applied  {version}");
        }
    }

    if report.pending.is_empty() {
        println!("Migrations are already up to date.");
        return;
    }
    for migration in &report.pending {
        println!("  pending  {} ({})", migration.version, migration.file_name);
    }
    println!("{} migrations pending.", report.pending.len());
}
