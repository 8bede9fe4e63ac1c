//! Fetch-phase scenarios: adapters pointed at a mock hosting server,
//! the content-addressed cache, and the shared-working-tree guard.

use crate::harness::{BuildTree, MockHost};
use srcsrv_core::{create_host, HostOptions, SourceCache, SrcSrvError};
use std::collections::HashMap;
use tempfile::TempDir;

fn github_options(uri: &str) -> HostOptions {
    HostOptions {
        uri: uri.to_string(),
        commit: "c0ffee".to_string(),
        account: Some("acct".to_string()),
        repo: Some("app".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_github_fetch_hits_network_once() {
    let routes = HashMap::from([(
        "/repos/acct/app/contents/app/main.cpp?ref=c0ffee".to_string(),
        b"int main() {}\n".to_vec(),
    )]);
    let mock = MockHost::serve(routes);
    let tmp = TempDir::new().unwrap();
    let cache = SourceCache::new(tmp.path().join(".srcsrv"));
    let host = create_host("github", github_options(&mock.base())).unwrap();

    let path = host.fetch("app/", "main.cpp", "AAAA1111", &cache).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"int main() {}\n");
    assert_eq!(mock.hits(), 1);

    // Identical request is served from the inventory alone.
    let again = host.fetch("app/", "main.cpp", "AAAA1111", &cache).unwrap();
    assert_eq!(again, path);
    assert_eq!(mock.hits(), 1);
}

#[test]
fn test_same_content_new_name_is_linked_not_fetched() {
    let routes = HashMap::from([(
        "/repos/acct/app/contents/app/a.cpp?ref=c0ffee".to_string(),
        b"shared bytes\n".to_vec(),
    )]);
    let mock = MockHost::serve(routes);
    let tmp = TempDir::new().unwrap();
    let cache = SourceCache::new(tmp.path().join(".srcsrv"));
    let host = create_host("github", github_options(&mock.base())).unwrap();

    let a = host.fetch("app/", "a.cpp", "SAMEHASH", &cache).unwrap();
    // No route exists for copy.cpp; the bucket already has the bytes.
    let b = host.fetch("lib/", "copy.cpp", "SAMEHASH", &cache).unwrap();

    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
    assert_eq!(mock.hits(), 1);
}

#[test]
fn test_missing_file_fails_closed() {
    let mock = MockHost::serve(HashMap::new());
    let tmp = TempDir::new().unwrap();
    let cache = SourceCache::new(tmp.path().join(".srcsrv"));
    let host = create_host("github", github_options(&mock.base())).unwrap();

    let err = host
        .fetch("app/", "gone.cpp", "DEAD0000", &cache)
        .unwrap_err();
    assert!(matches!(err, SrcSrvError::HttpStatus { status: 404, .. }));
    // Fail-closed: no bucket, no inventory, no bytes.
    assert!(!tmp.path().join(".srcsrv").join("DEAD0000").exists());
}

#[test]
fn test_gitlab_two_step_retrieval() {
    let routes = HashMap::from([
        (
            "/api/v4/projects/7/repository/files/app%2Fmain.cpp?ref=c0ffee".to_string(),
            serde_json::json!({ "blob_id": "b10b1d", "file_name": "main.cpp" })
                .to_string()
                .into_bytes(),
        ),
        (
            "/api/v4/projects/7/repository/blobs/b10b1d/raw".to_string(),
            b"historical content\n".to_vec(),
        ),
    ]);
    let mock = MockHost::serve(routes);
    let tmp = TempDir::new().unwrap();
    let cache = SourceCache::new(tmp.path().join(".srcsrv"));
    let host = create_host(
        "gitlab",
        HostOptions {
            uri: mock.base(),
            commit: "c0ffee".to_string(),
            project_id: Some("7".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let path = host.fetch("app/", "main.cpp", "BBBB2222", &cache).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"historical content\n");
    assert_eq!(mock.hits(), 2);

    host.fetch("app/", "main.cpp", "BBBB2222", &cache).unwrap();
    assert_eq!(mock.hits(), 2);
}

#[test]
fn test_fetch_round_trips_historical_content() {
    // Index-time state: the first commit. The build moves on afterwards.
    let tree = BuildTree::new().unwrap();
    tree.write_source("app/main.cpp", b"historical\n").unwrap();
    let indexed_commit = tree.commit_all("indexed build").unwrap();
    tree.write_source("app/main.cpp", b"rewritten since\n").unwrap();
    tree.commit_all("later work").unwrap();
    let repo = tree.repo().unwrap();

    // The mock host serves what the working tree held at the indexed
    // commit, read under a scoped checkout.
    let historical = {
        let _guard = repo.checkout_guard(&indexed_commit).unwrap();
        std::fs::read(tree.path().join("app/main.cpp")).unwrap()
    };
    let routes = HashMap::from([(
        format!("/repos/acct/app/contents/app/main.cpp?ref={indexed_commit}"),
        historical,
    )]);
    let mock = MockHost::serve(routes);

    let tmp = TempDir::new().unwrap();
    let cache = SourceCache::new(tmp.path().join(".srcsrv"));
    let host = create_host(
        "github",
        HostOptions {
            uri: mock.base(),
            commit: indexed_commit,
            account: Some("acct".to_string()),
            repo: Some("app".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    let path = host.fetch("app/", "main.cpp", "CAFE7777", &cache).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"historical\n");
}

#[test]
fn test_checkout_guard_restores_previous_state() {
    let tree = BuildTree::new().unwrap();
    tree.write_source("app/a.cpp", b"version one\n").unwrap();
    let first = tree.commit_all("first").unwrap();
    tree.write_source("app/a.cpp", b"version two\n").unwrap();
    tree.commit_all("second").unwrap();
    let repo = tree.repo().unwrap();

    {
        let _guard = repo.checkout_guard(&first).unwrap();
        let content = std::fs::read(tree.path().join("app/a.cpp")).unwrap();
        assert_eq!(content, b"version one\n");
    }

    // Guard dropped: the tree is back on the branch tip.
    let content = std::fs::read(tree.path().join("app/a.cpp")).unwrap();
    assert_eq!(content, b"version two\n");
}
