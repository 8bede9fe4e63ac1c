//! Substitute SRCSRV tools.
//!
//! `srctool` replays a canned dump for the .PDB it is asked about and
//! `pdbstr` records its invocation, so scenarios can assert on the
//! embedding step without the Windows binaries.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    pub fn install() -> Result<Self> {
        let dir = TempDir::new().context("failed to create temp directory")?;
        std::fs::create_dir(dir.path().join("dumps"))?;

        // The .PDB path is the last argument; its stem picks the dump.
        write_script(
            &dir.path().join("srctool"),
            "#!/bin/sh\n\
             for a in \"$@\"; do last=\"$a\"; done\n\
             stem=$(basename \"$last\" .pdb)\n\
             cat \"$(dirname \"$0\")/dumps/$stem.dump\"\n",
        )?;
        write_script(
            &dir.path().join("pdbstr"),
            "#!/bin/sh\n\
             echo \"$@\" >> \"$(dirname \"$0\")/pdbstr.log\"\n",
        )?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Installs the dump replayed for `<stem>.pdb`.
    pub fn add_dump(&self, stem: &str, lines: &[String]) -> Result<()> {
        let mut text = lines.join("\n");
        text.push('\n');
        std::fs::write(
            self.dir.path().join("dumps").join(format!("{stem}.dump")),
            text,
        )?;
        Ok(())
    }

    /// One line per `pdbstr` invocation, empty when it never ran.
    pub fn pdbstr_log(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("pdbstr.log"))
            .map(|text| text.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// A dump line in `srctool`'s record format.
    pub fn dump_line(build_path: &str, kind: &str, digest: &str) -> String {
        format!("{build_path}\t Checksum {kind}: {digest}")
    }
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, body)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn write_script(path: &Path, body: &str) -> Result<()> {
    let _ = (path, body);
    anyhow::bail!("substitute tools are only available on unix")
}

/// Staging file paths for a .PDB, as the indexer lays them out.
pub fn staging_paths(pdb: &Path) -> (PathBuf, PathBuf) {
    (pdb.with_extension("ini"), pdb.with_extension("srcs"))
}
