//! Index command: embed source index streams into .PDB files.

use super::HostArgs;
use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::{json, Map};
use srcsrv_core::{index_cache_root, Config, GitRepo, IndexOptions, Indexer, Summary, Verbosity};
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug)]
pub struct IndexArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// Commit the index refers to (default: HEAD of the build base)
    #[arg(long)]
    pub commit: Option<String>,

    /// Build directory the .PDB source paths are anchored at
    #[arg(long)]
    pub build_base: String,

    /// Semicolon-separated source extension allow-list
    #[arg(long)]
    pub extensions: Option<String>,

    /// Directory holding srctool and pdbstr
    #[arg(long)]
    pub srcsrv_tools: Option<PathBuf>,

    /// .PDB files or directories to scan for them
    #[arg(long, num_args = 1.., required = true)]
    pub pdbs: Vec<PathBuf>,

    /// Cache parent directory (default: the debugger-side %USERPROFILE%)
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Keep the staging files next to each .PDB
    #[arg(long)]
    pub keep: bool,

    /// Write index streams but skip the embedding step
    #[arg(long)]
    pub dry_run: bool,

    /// Write an execution summary to this file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Summary detail level (m|n|d|v or full names)
    #[arg(long, default_value = "minimal")]
    pub level: String,

    /// Configuration file
    #[arg(long, default_value = "srcsrv.toml")]
    pub config: PathBuf,
}

pub fn run(args: IndexArgs) -> Result<()> {
    let config = Config::load(&args.config)?;
    let extensions = args
        .extensions
        .clone()
        .unwrap_or_else(|| config.index.extensions.clone());
    let tools_dir = args
        .srcsrv_tools
        .clone()
        .unwrap_or_else(|| config.index.tools_dir.clone());
    let cache = args.cache.clone().or_else(|| config.index.cache.clone());
    let cache_root = index_cache_root(cache.as_deref());

    // A build tree outside any repository is still indexable; the entries
    // then carry no blob hash.
    let repo = match GitRepo::open(&args.build_base) {
        Ok(repo) => Some(repo),
        Err(e) => {
            warn!("{}: indexing without repository context", e);
            None
        }
    };
    let commit = match (&args.commit, &repo) {
        (Some(commit), Some(repo)) => repo.resolve_commit(commit)?,
        (Some(commit), None) => commit.clone(),
        (None, Some(repo)) => repo.head_commit()?,
        (None, None) => bail!("--commit is required when the build base is not a repository"),
    };

    let level: Verbosity = args.level.parse()?;
    let mut host = srcsrv_core::create_host(&args.host.host, args.host.to_options(commit.clone()))?;
    host.initialize()?;

    let mut summary = Summary::new(level);
    let mut arguments = Map::new();
    arguments.insert("date".to_string(), json!(chrono::Local::now().to_rfc3339()));
    arguments.insert("--host".to_string(), json!(args.host.host));
    arguments.insert("--uri".to_string(), json!(args.host.uri));
    arguments.insert("--commit".to_string(), json!(commit));
    arguments.insert("--build-base".to_string(), json!(args.build_base));
    arguments.insert("--extensions".to_string(), json!(extensions));
    arguments.insert(
        "--srcsrv-tools".to_string(),
        json!(tools_dir.display().to_string()),
    );
    arguments.insert(
        "--pdbs".to_string(),
        json!(args
            .pdbs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()),
    );
    arguments.insert("--cache".to_string(), json!(cache_root));
    arguments.insert("--keep".to_string(), json!(args.keep));
    arguments.insert("--dry-run".to_string(), json!(args.dry_run));
    summary.record_arguments(arguments);
    host.summarize(summary.arguments_mut(), level);

    let options = IndexOptions {
        build_base: args.build_base.clone(),
        extensions,
        tools_dir,
        pdbs: args.pdbs.clone(),
        cache_root,
        dry_run: args.dry_run,
        keep: args.keep,
    };
    let mut indexer = Indexer::new(options, host.as_ref(), repo.as_ref())?;
    let report = indexer.run(&mut summary)?;

    if let Some(path) = &args.summary {
        summary
            .write(
                path,
                report.processed,
                report.failed,
                report.skipped,
                report.duration,
            )
            .with_context(|| format!("writing summary to {}", path.display()))?;
    }

    println!(
        "Indexed {} symbol database(s), {} failed, {} skipped in {:.2}s",
        report.processed,
        report.failed,
        report.skipped,
        report.duration.as_secs_f64()
    );
    if report.failed > 0 {
        bail!("{} symbol database(s) failed", report.failed);
    }
    Ok(())
}
