//! CLI integration tests for kindred
//!
//! Tests the kindred CLI commands end-to-end using assert_cmd. Every test
//! gets its own config directory, database and recent-searches file.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const CORPUS: &str = r#"{
    "posts": [
        {"id": "p1", "title": "Rust ownership explained", "authorId": "u1",
         "communityId": "c1", "tags": ["rust"], "votes": 10, "createdAt": 1000},
        {"id": "p2", "title": "Rust lifetimes", "authorId": "u2",
         "communityId": "c1", "votes": 3, "createdAt": 3000},
        {"id": "p3", "title": "Rust async in practice", "authorId": "u1",
         "communityId": "c2", "tags": ["async"], "votes": 7, "createdAt": 2000}
    ],
    "communities": [
        {"id": "g1", "name": "Rustaceans", "ownerId": "u1", "memberCount": 120},
        {"id": "g2", "name": "Rust insiders", "ownerId": "u1", "visibility": "private"}
    ],
    "profiles": [
        {"id": "u1", "displayName": "Ada", "bio": "Mentor for Rust beginners",
         "skills": ["rust"], "rating": 4.8}
    ]
}"#;

/// Isolated environment for one test
struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("config");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            format!(
                "[recent]\nfile = {:?}\n\n[storage]\ndatabase_path = {:?}\n",
                dir.path().join("recent.json"),
                dir.path().join("data").join("kindred.db"),
            ),
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("kindred").unwrap();
        cmd.env("KINDRED_CONFIG_DIR", self.path().join("config"));
        cmd.env("RUST_LOG", "off");
        cmd
    }

    fn seeded() -> Self {
        let env = Self::new();
        let corpus = env.path().join("corpus.json");
        std::fs::write(&corpus, CORPUS).unwrap();
        env.cmd()
            .arg("seed")
            .arg(&corpus)
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported 6 records"));
        env
    }

    fn search_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .args(["--format", "json", "search"])
            .args(args)
            .output()
            .unwrap();
        assert!(output.status.success(), "search failed: {:?}", output);
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn ids(output: &serde_json::Value) -> Vec<String> {
    output["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_search_all_types() {
    let env = TestEnv::seeded();
    let output = env.search_json(&["rust"]);

    let found = ids(&output);
    assert!(found.contains(&"p1".to_string()));
    assert!(found.contains(&"g1".to_string()));
    assert!(found.contains(&"u1".to_string()));
    // private community never shows up
    assert!(!found.contains(&"g2".to_string()));
    assert_eq!(output["count"], found.len());
    assert_eq!(output["nextCursor"], "offset:20");
}

#[test]
fn test_search_popular_content() {
    let env = TestEnv::seeded();
    let output = env.search_json(&["rust", "--type", "content", "--sort", "popular"]);

    assert_eq!(ids(&output), vec!["p1", "p3", "p2"]);
    for result in output["results"].as_array().unwrap() {
        assert_eq!(result["type"], "content");
    }
}

#[test]
fn test_search_filters() {
    let env = TestEnv::seeded();

    let output = env.search_json(&["rust", "--type", "content", "--min-popularity", "5"]);
    for result in output["results"].as_array().unwrap() {
        assert!(result["metadata"]["popularity"].as_f64().unwrap() >= 5.0);
    }
    assert_eq!(output["count"], 2);

    let output = env.search_json(&["rust", "--type", "content", "--tag", "ASYNC"]);
    assert_eq!(ids(&output), vec!["p3"]);

    let output = env.search_json(&["rust", "--type", "content", "--scope", "c1"]);
    assert_eq!(output["count"], 2);
}

#[test]
fn test_search_newest_with_paging() {
    let env = TestEnv::seeded();
    let first = env.search_json(&["rust", "-t", "content", "-s", "newest", "--page-size", "2"]);
    assert_eq!(first["nextCursor"], "offset:2");

    let second = env.search_json(&[
        "rust", "-t", "content", "-s", "newest", "--page-size", "2", "--cursor", "offset:2",
    ]);
    assert_eq!(ids(&second), vec!["p1"]);
}

#[test]
fn test_blank_search_returns_nothing() {
    let env = TestEnv::seeded();
    env.cmd()
        .args(["search", "   "])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results"));
}

#[test]
fn test_search_rejects_invalid_type() {
    let env = TestEnv::seeded();
    env.cmd()
        .args(["search", "rust", "--type", "widgets"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid type"));
}

#[test]
fn test_suggest() {
    let env = TestEnv::seeded();
    env.cmd()
        .args(["suggest", "RUST"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rust ownership explained"))
        .stdout(predicate::str::contains("Rustaceans"));

    env.cmd()
        .args(["suggest", "rust", "--type", "group"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rustaceans"))
        .stdout(predicate::str::contains("Rust lifetimes").not());

    env.cmd()
        .args(["suggest", "r"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_recent_searches() {
    let env = TestEnv::seeded();
    env.cmd().args(["search", "rust"]).assert().success();
    env.cmd().args(["search", "async"]).assert().success();
    env.cmd().args(["search", "rust"]).assert().success();

    let output = env
        .cmd()
        .args(["--format", "json", "recent", "list"])
        .output()
        .unwrap();
    let terms: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(terms, vec!["rust", "async"]);

    env.cmd()
        .args(["recent", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cleared"));
    env.cmd()
        .args(["recent", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No recent searches"));
}

#[test]
fn test_seed_missing_file_fails() {
    let env = TestEnv::new();
    env.cmd()
        .args(["seed", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read corpus"));
}

#[test]
fn test_config_commands() {
    let env = TestEnv::new();

    env.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    env.cmd()
        .args(["config", "set", "search.default_sort", "popular"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set search.default_sort = popular"));

    env.cmd()
        .args(["config", "get", "search.default_sort"])
        .assert()
        .success()
        .stdout(predicate::str::contains("popular"));

    env.cmd()
        .args(["config", "set", "search.default_page_size", "0"])
        .assert()
        .failure();

    env.cmd()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("suggestions.debounce_ms = 300"));

    env.cmd().args(["config", "reset"]).assert().success();
    env.cmd()
        .args(["config", "get", "search.default_sort"])
        .assert()
        .success()
        .stdout(predicate::str::contains("relevance"));
}
