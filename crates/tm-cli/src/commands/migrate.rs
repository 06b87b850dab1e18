//! Migrate command implementation

use anyhow::{bail, Context, Result};
use tm_core::{MigrationReport, Migrator};

use crate::cli::{GlobalArgs, MigrateArgs, OutputFormat};
use crate::commands::common::{self, print_json, version_label};
use crate::commands::status;

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let target = common::resolve_target(global)?;
    if target.is_memory() && !args.dry_run && !args.allow_memory {
        bail!(
            "Refusing to migrate an in-memory database: set database.path in tidemark.yml, \
             pass --database, or use --allow-memory"
        );
    }
    let db = common::open_database(&target)?;
    let migrator = Migrator::new(&db);

    if args.dry_run {
        let report = migrator
            .status(&target.migrations_dir)
            .context("Failed to resolve pending migrations")?;
        return match args.output {
            OutputFormat::Json => print_json(&report),
            OutputFormat::Text => {
                println!("Dry run - would apply the following migrations:");
                status::print_text(&report, global.verbose);
                Ok(())
            }
        };
    }

    if args.output == OutputFormat::Text {
        println!(
            "Running migrations from {} against {}",
            target.migrations_dir.display(),
            target.database
        );
    }

    let report = migrator
        .migrate(&target.migrations_dir)
        .with_context(|| format!("Failed to migrate database {}", target.database))?;

    match args.output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => print_text(&report, global.verbose),
    }
    Ok(())
}

fn print_text(report: &MigrationReport, verbose: bool) {
    println!("Found total of {} migration files.", report.discovered);
    if verbose {
        println!(
            "Version before run: {}",
            version_label(report.previous_version)
        );
    }

    for migration in &report.applied {
        println!("  Applied {} ({})", migration.version, migration.file_name);
    }

    if report.applied_count() > 0 {
        println!("{} migrations have been applied.", report.applied_count());
    } else {
        println!("Migrations are already up to date.");
    }
    println!("Current version is {}", version_label(report.current_version()));
}
