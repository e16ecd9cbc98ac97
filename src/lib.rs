pub mod codec;
pub mod compress;
pub mod config;
pub mod diff;
pub mod err;
pub mod logging;
pub mod node;
pub mod util;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{
    compress::CompressionType,
    config::{Config, LogConfig, get_config, init_config},
    diff::{ApplySummary, DiffKind, NodePath, PatchTree},
    err::Result,
    node::{ArchiveFormat, ResourceFormat, ResourceNode},
};

/// Compares two trees into a patch with every change enabled.
pub fn compare_patch(left: &ResourceNode, right: &ResourceNode) -> PatchTree {
    PatchTree::from_compare(left, right)
}

/// Toggles one entry, cascading to descendants or ancestors.
pub fn set_enabled(patch: &mut PatchTree, path: &NodePath, enabled: bool) -> Result<()> {
    patch.set_enabled(path, enabled)
}

pub fn export_patch(patch: &PatchTree, path: &Path) -> Result<()> {
    codec::export_patch(patch, path, CompressionType::default())
}

pub fn export_patch_with(
    patch: &PatchTree,
    path: &Path,
    compression: CompressionType,
) -> Result<()> {
    codec::export_patch(patch, path, compression)
}

pub fn import_patch(path: &Path) -> Result<PatchTree> {
    codec::import_patch(path)
}

pub fn apply_patch(patch: &PatchTree, target: &mut ResourceNode) -> Result<ApplySummary> {
    patch.patch(target)
}

pub fn revert_patch(patch: &PatchTree, target: &mut ResourceNode) -> Result<ApplySummary> {
    patch.revert(target)
}

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Resource tree file format
    #[arg(short, long, default_value = "archive")]
    format: FileType,

    /// Compression of written patch files
    #[arg(short, long, default_value = "zlib")]
    compression_type: CompressionType,

    /// Use verbose output (-vv very verbose, -vvv also to file, -vvvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare two resource trees and save the differences as a patch
    Diff(DiffArgs),
    /// Apply the enabled entries of a patch to a resource tree
    Apply(ApplyArgs),
    /// Undo a patch on a resource tree it was applied to
    Revert(RevertArgs),
    /// Print the entries of a patch
    Show(ShowArgs),
}

#[derive(Debug, Args)]
struct DiffArgs {
    /// Path to old tree
    old: PathBuf,
    /// Path to new tree
    new: PathBuf,
    /// Path to save patch file
    patch: PathBuf,
    /// Entry to disable before saving, e.g. root/icons/icon[1]
    #[arg(short, long)]
    exclude: Vec<NodePath>,
}

#[derive(Debug, Args)]
struct ApplyArgs {
    /// Path to target tree
    target: PathBuf,
    /// Path to patch file
    patch: PathBuf,
    /// Path to save patched tree
    output: PathBuf,
    /// Entry to disable before applying
    #[arg(short, long)]
    exclude: Vec<NodePath>,
    /// Entry to enable before applying, after exclusions
    #[arg(short, long)]
    include: Vec<NodePath>,
}

#[derive(Debug, Args)]
struct RevertArgs {
    /// Path to patched tree
    target: PathBuf,
    /// Path to patch file
    patch: PathBuf,
    /// Path to save reverted tree
    output: PathBuf,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Path to patch file
    patch: PathBuf,
    /// Also list unchanged entries
    #[arg(short, long)]
    all: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FileType {
    /// Generic resource archive > *.rtree
    Archive,
}

impl FileType {
    fn reader(&self) -> impl ResourceFormat {
        match self {
            FileType::Archive => ArchiveFormat,
        }
    }
}

fn toggle(patch: &mut PatchTree, paths: &[NodePath], enabled: bool) -> Result<()> {
    for path in paths {
        patch.set_enabled(path, enabled)?;
    }
    Ok(())
}

fn log_summary(summary: &ApplySummary) {
    log::info!(
        "added {} node(s), removed {} node(s), modified {} node(s)",
        summary.added,
        summary.removed,
        summary.modified
    );
}

fn show(patch: &PatchTree, all: bool) {
    let stats = patch.stats();
    println!(
        "{} added, {} removed, {} modified, {} unchanged ({} change(s) enabled)",
        stats.added, stats.removed, stats.modified, stats.unchanged, stats.enabled_changes
    );
    for entry in patch.iter() {
        if !all && !entry.has_changes() {
            continue;
        }
        let mark = match entry.kind() {
            DiffKind::Added => "+",
            DiffKind::Removed => "-",
            DiffKind::Modified => "~",
            DiffKind::Unchanged => " ",
        };
        let check = if entry.is_enabled() { "x" } else { " " };
        let indent = "  ".repeat(entry.path().depth() - 1);
        let detail = match entry.kind() {
            DiffKind::Modified => {
                let delta = entry.payload_delta();
                let changed: usize = delta.iter().map(|c| c.old_len.max(c.new_len)).sum();
                format!(" ({} range(s), {} byte(s) changed)", delta.len(), changed)
            }
            _ => String::new(),
        };
        println!("[{}] {} {}{}{}", check, mark, indent, entry.name(), detail);
    }
}

fn run(cli: Cli) -> Result<()> {
    let reader = cli.format.reader();
    match cli.command {
        Commands::Diff(args) => {
            log::info!("reading old tree...");
            let old = reader.open(&args.old)?;
            log::info!("reading new tree...");
            let new = reader.open(&args.new)?;
            log::info!("comparing...");
            let mut patch = PatchTree::from_compare(&old, &new);
            reader.close(old);
            reader.close(new);
            toggle(&mut patch, &args.exclude, false)?;
            let stats = patch.stats();
            log::info!(
                "{} added, {} removed, {} modified",
                stats.added,
                stats.removed,
                stats.modified
            );
            codec::export_patch(&patch, &args.patch, get_config().compression_type)?;
        }
        Commands::Apply(args) => {
            log::info!("reading target tree...");
            let mut target = reader.open(&args.target)?;
            let mut patch = codec::import_patch(&args.patch)?;
            toggle(&mut patch, &args.exclude, false)?;
            toggle(&mut patch, &args.include, true)?;
            log::info!("patching...");
            let summary = patch.patch(&mut target)?;
            log_summary(&summary);
            log::info!("writing patched tree...");
            reader.save(&target, &args.output)?;
        }
        Commands::Revert(args) => {
            log::info!("reading target tree...");
            let mut target = reader.open(&args.target)?;
            let patch = codec::import_patch(&args.patch)?;
            log::info!("reverting...");
            let summary = patch.revert(&mut target)?;
            log_summary(&summary);
            log::info!("writing reverted tree...");
            reader.save(&target, &args.output)?;
        }
        Commands::Show(args) => {
            let patch = codec::import_patch(&args.patch)?;
            show(&patch, args.all);
        }
    }
    Ok(())
}

pub fn main() {
    let cli = Cli::parse();
    init_config(Config {
        log_config: LogConfig::Verbose(cli.verbose),
        compression_type: cli.compression_type,
    });
    log::debug!("cli args: {:#?}", cli);
    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
    log::info!("success");
}
