//! Index-phase scenarios: a real git working tree, substitute SRCSRV
//! tools, and the GitHub adapter writing the index stream.

#![cfg(unix)]

use crate::harness::{BuildTree, FakeTools};
use srcsrv_core::{
    create_host, HostOptions, IndexOptions, Indexer, Summary, Verbosity,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn github_options(uri: &str, commit: &str) -> HostOptions {
    HostOptions {
        uri: uri.to_string(),
        commit: commit.to_string(),
        account: Some("acct".to_string()),
        repo: Some("app".to_string()),
        ..Default::default()
    }
}

fn index_options(tree: &BuildTree, tools: &FakeTools, pdbs: Vec<PathBuf>) -> IndexOptions {
    IndexOptions {
        build_base: tree.base(),
        extensions: "cpp;hpp;c;h".to_string(),
        tools_dir: tools.dir().to_path_buf(),
        pdbs,
        cache_root: "%USERPROFILE%/.srcsrv".to_string(),
        dry_run: false,
        keep: false,
    }
}

fn make_pdb(dir: &Path, name: &str) -> PathBuf {
    let pdb = dir.join(name);
    std::fs::write(&pdb, b"fake pdb").unwrap();
    pdb
}

#[test]
fn test_index_writes_resolved_entries() {
    let tree = BuildTree::new().unwrap();
    tree.write_source("app/main.cpp", b"int main() {}\n").unwrap();
    tree.write_source("app/util.h", b"#pragma once\n").unwrap();
    let commit = tree.commit_all("initial").unwrap();
    let repo = tree.repo().unwrap();
    let main_blob = repo
        .hash_object(Path::new(&tree.build_path("app/main.cpp")))
        .unwrap();

    let tools = FakeTools::install().unwrap();
    let out = TempDir::new().unwrap();
    let pdb = make_pdb(out.path(), "app.pdb");
    tools
        .add_dump(
            "app",
            &[
                FakeTools::dump_line(&tree.build_path("app/main.cpp"), "MD5", "AAAA1111"),
                FakeTools::dump_line(&tree.build_path("app/util.h"), "SHA256", "BBBB2222"),
                // Not in the allow-list, must be dropped
                FakeTools::dump_line(&tree.build_path("app/main.obj"), "MD5", "CCCC3333"),
            ],
        )
        .unwrap();

    let host = create_host("github", github_options("github.com", &commit)).unwrap();
    let mut options = index_options(&tree, &tools, vec![out.path().to_path_buf()]);
    options.dry_run = true;
    options.keep = true;
    let mut indexer = Indexer::new(options, host.as_ref(), Some(&repo)).unwrap();
    let mut summary = Summary::new(Verbosity::Verbose);
    let report = indexer.run(&mut summary).unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 0);

    let ini = std::fs::read_to_string(pdb.with_extension("ini")).unwrap();
    assert!(ini.contains("VERSION=2"));
    assert!(ini.contains("SRCSRVTRG=%USERPROFILE%/.srcsrv/%var4%/%var3%"));
    assert!(ini.contains(&format!("GH_COMMIT=--commit={commit}")));
    assert!(ini.contains("SRCSRVCMD=srcsrv fetch %gh_host%"));
    assert!(ini.contains(&format!(
        "{}*app/*main.cpp*AAAA1111*{}\n",
        tree.build_path("app/main.cpp"),
        main_blob
    )));
    assert!(ini.contains("*app/*util.h*BBBB2222*"));
    assert!(!ini.contains("main.obj"));
    assert!(ini.trim_end().ends_with("SRCSRV: end ------------------------------------------------"));
}

#[test]
fn test_index_embeds_and_cleans_staging() {
    let tree = BuildTree::new().unwrap();
    tree.write_source("a.cpp", b"void a() {}\n").unwrap();
    let commit = tree.commit_all("initial").unwrap();
    let repo = tree.repo().unwrap();

    let tools = FakeTools::install().unwrap();
    let out = TempDir::new().unwrap();
    let pdb = make_pdb(out.path(), "a.pdb");
    tools
        .add_dump(
            "a",
            &[FakeTools::dump_line(&tree.build_path("a.cpp"), "MD5", "DDDD4444")],
        )
        .unwrap();

    let host = create_host("github", github_options("github.com", &commit)).unwrap();
    let options = index_options(&tree, &tools, vec![pdb.clone()]);
    let mut indexer = Indexer::new(options, host.as_ref(), Some(&repo)).unwrap();
    let mut summary = Summary::new(Verbosity::Minimal);
    let report = indexer.run(&mut summary).unwrap();
    assert_eq!(report.processed, 1);

    // The embedding tool ran against this .PDB with the srcsrv stream.
    let log = tools.pdbstr_log();
    assert_eq!(log.len(), 1);
    assert!(log[0].contains("-w"));
    assert!(log[0].contains(&format!("-p:{}", pdb.display())));
    assert!(log[0].contains("-s:srcsrv"));

    assert!(!pdb.with_extension("ini").exists());
    assert!(!pdb.with_extension("srcs").exists());
}

#[test]
fn test_pdb_without_matching_sources_is_skipped() {
    let tree = BuildTree::new().unwrap();
    tree.write_source("a.cpp", b"void a() {}\n").unwrap();
    let commit = tree.commit_all("initial").unwrap();
    let repo = tree.repo().unwrap();

    let tools = FakeTools::install().unwrap();
    let out = TempDir::new().unwrap();
    let pdb = make_pdb(out.path(), "other.pdb");
    // All entries point outside the build base.
    tools
        .add_dump(
            "other",
            &[FakeTools::dump_line("/somewhere/else/x.cpp", "MD5", "EEEE5555")],
        )
        .unwrap();

    let host = create_host("github", github_options("github.com", &commit)).unwrap();
    let options = index_options(&tree, &tools, vec![pdb.clone()]);
    let mut indexer = Indexer::new(options, host.as_ref(), Some(&repo)).unwrap();
    let mut summary = Summary::new(Verbosity::Minimal);
    let report = indexer.run(&mut summary).unwrap();

    assert_eq!(report.processed, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert!(tools.pdbstr_log().is_empty());
    assert!(!pdb.with_extension("ini").exists());
    assert!(!pdb.with_extension("srcs").exists());
}

#[test]
fn test_tool_failure_fails_one_pdb_not_the_batch() {
    let tree = BuildTree::new().unwrap();
    tree.write_source("a.cpp", b"void a() {}\n").unwrap();
    let commit = tree.commit_all("initial").unwrap();
    let repo = tree.repo().unwrap();

    let tools = FakeTools::install().unwrap();
    let out = TempDir::new().unwrap();
    let good = make_pdb(out.path(), "good.pdb");
    // No dump registered for bad.pdb: the srctool substitute exits non-zero.
    make_pdb(out.path(), "bad.pdb");
    tools
        .add_dump(
            "good",
            &[FakeTools::dump_line(&tree.build_path("a.cpp"), "MD5", "FFFF6666")],
        )
        .unwrap();

    let host = create_host("github", github_options("github.com", &commit)).unwrap();
    let options = index_options(&tree, &tools, vec![out.path().to_path_buf()]);
    let mut indexer = Indexer::new(options, host.as_ref(), Some(&repo)).unwrap();
    let mut summary = Summary::new(Verbosity::Normal);
    let report = indexer.run(&mut summary).unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    let log = tools.pdbstr_log();
    assert_eq!(log.len(), 1);
    assert!(log[0].contains(&format!("-p:{}", good.display())));
}
