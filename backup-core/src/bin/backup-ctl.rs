//! backup-ctl - operate on nomad guide backups from the command line.

use anyhow::Result;
use backup_core::restore::TableSelector;
use backup_core::utils::{self, format_bytes};
use backup_core::{BackupService, Category, Config, ExportFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Storage root (overrides config)
    #[arg(short, long)]
    storage: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List backups, newest first
    List {
        /// Show only the newest N backups
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Count and total size of all backups
    Stats,
    /// Export a data category into a new backup
    Create {
        /// all, users, companies, jobs, job_interactions or security_logs
        #[arg(default_value = "all")]
        category: Category,
        /// json or csv (default from config)
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },
    /// Delete one backup
    Delete { name: String },
    /// Delete backups older than the retention window
    Cleanup {
        /// Age cutoff in days (default from config)
        #[arg(short, long)]
        days: Option<u32>,
    },
    /// Write a backup's zip archive to disk
    Archive {
        name: String,
        /// Output file (default: ./backup_<name>.zip)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Load a backup back into the application
    Restore {
        name: String,
        /// "all" or a single table
        #[arg(short, long, default_value = "all")]
        table: TableSelector,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_env_overrides()?;
    if let Some(storage) = args.storage {
        config.storage.root = storage;
    }

    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    let service = BackupService::from_config(&config);

    match args.command {
        Command::List { limit } => {
            let listing = match limit {
                Some(n) => service.catalog.recent(n)?,
                None => service.catalog.list()?,
            };
            for backup in &listing.backups {
                println!(
                    "{}  {:>4} files  {:>10}",
                    backup.name,
                    backup.file_count(),
                    backup.total_size
                );
            }
            for skipped in &listing.skipped {
                eprintln!("skipped {}: {}", skipped.name, skipped.reason);
            }
        }
        Command::Stats => {
            let stats = service.catalog.stats()?;
            println!("backups: {}", stats.count);
            println!("total:   {}", stats.total_size);
            println!("oldest:  {}", stats.oldest.as_deref().unwrap_or("-"));
            println!("newest:  {}", stats.newest.as_deref().unwrap_or("-"));
        }
        Command::Create { category, format } => {
            let format = format.unwrap_or(config.export.default_format);
            let outcome = service.producer.create(category, format)?;
            print!("{}", outcome.output);
            println!(
                "created {} ({} files, {})",
                outcome.name,
                outcome.files,
                format_bytes(outcome.total_size_bytes)
            );
        }
        Command::Delete { name } => {
            service.catalog.delete(&name)?;
            println!("deleted {}", name);
        }
        Command::Cleanup { days } => {
            let days = days.unwrap_or(config.retention.days);
            let report = service.sweeper.cleanup_older_than(days)?;
            for name in &report.removed {
                println!("removed {}", name);
            }
            for failed in &report.failed {
                eprintln!("failed {}: {}", failed.name, failed.reason);
            }
            println!("{} removed, {} kept, {} failed", report.removed.len(), report.kept, report.failed.len());
            if !report.is_clean() {
                anyhow::bail!("{} backups could not be removed", report.failed.len());
            }
        }
        Command::Archive { name, out } => {
            let archive = service.archiver.build(&name)?;
            let dest = out.unwrap_or_else(|| PathBuf::from(archive.file_name()));
            let (entries, size) = (archive.entries(), archive.size());
            archive.persist(&dest)?;
            println!("wrote {} ({} files, {})", dest.display(), entries, format_bytes(size));
        }
        Command::Restore { name, table } => {
            let outcome = service.restorer.restore(&name, &table)?;
            print!("{}", outcome.output);
            println!("restored {} ({})", outcome.name, outcome.table);
        }
    }

    Ok(())
}
