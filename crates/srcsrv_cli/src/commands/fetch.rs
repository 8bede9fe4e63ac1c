//! Fetch command: the debugger-side entry point.
//!
//! Invoked by the SRCSRVCMD embedded in a .PDB. Arguments arrive
//! pre-substituted: the adapter options from the variable block, the
//! positionals from the entry line's fields.

use super::HostArgs;
use anyhow::{Context, Result};
use clap::Args;
use srcsrv_core::{cache_root_from_target, SourceCache};

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// Commit the indexed entry refers to
    #[arg(long)]
    pub commit: String,

    /// SRCSRVTRG target path; the cache root is derived from it
    #[arg(long)]
    pub cache: String,

    /// Repository-relative directory of the file (entry field 2)
    pub repo_dir: String,

    /// File name (entry field 3)
    pub file_name: String,

    /// Content hash recorded in the symbol database (entry field 4)
    pub pdb_hash: String,
}

pub fn run(args: FetchArgs) -> Result<()> {
    let root = cache_root_from_target(&args.cache)?;
    eprintln!("SRCSRV cache directory: {}", root.display());

    let cache = SourceCache::new(root);
    let mut host =
        srcsrv_core::create_host(&args.host.host, args.host.to_options(args.commit.clone()))?;
    host.initialize()?;
    let path = host
        .fetch(&args.repo_dir, &args.file_name, &args.pdb_hash, &cache)
        .with_context(|| format!("fetching {}{}", args.repo_dir, args.file_name))?;

    println!("{}", path.display());
    Ok(())
}
