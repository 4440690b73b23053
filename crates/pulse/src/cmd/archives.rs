//! Archives command - Inspect rotation archives on disk
//!
//! Reads the archive directory from the configuration; no server needed.
//!
//! # Usage
//!
//! ```bash
//! pulse archives                     # table of archives, oldest first
//! pulse archives --show <NAME>       # print one archive as JSON
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pulse_storage::{ArchiveInfo, ArchiveStore};

/// Archives command arguments
#[derive(Args, Debug)]
pub struct ArchivesArgs {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the named archive instead of listing
    #[arg(long, value_name = "NAME")]
    pub show: Option<String>,
}

/// Run the archives command
pub async fn run(args: ArchivesArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;
    let store = ArchiveStore::new(&config.rotation.archive_dir, config.rotation.compress);
    let mut out = io::stdout().lock();

    match args.show {
        Some(name) => {
            let document = store
                .read(&name)
                .await
                .with_context(|| format!("failed to read archive {name}"))?;
            serde_json::to_writer_pretty(&mut out, &document)?;
            writeln!(out)?;
        }
        None => {
            let archives = store.list().await.context("failed to list archives")?;
            write_table(&mut out, &archives)?;
        }
    }

    Ok(())
}

fn write_table(out: &mut impl Write, archives: &[ArchiveInfo]) -> io::Result<()> {
    if archives.is_empty() {
        return writeln!(out, "no archives");
    }

    let width = archives.iter().map(|a| a.name.len()).max().unwrap_or(4).max(4);
    writeln!(out, "{:<width$}  {:>12}  {:<25}  COMPRESSED", "NAME", "SIZE", "CREATED")?;
    for archive in archives {
        writeln!(
            out,
            "{:<width$}  {:>12}  {:<25}  {}",
            archive.name,
            archive.size,
            archive.created.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            if archive.compressed { "yes" } else { "no" },
        )?;
    }
    Ok(())
}
