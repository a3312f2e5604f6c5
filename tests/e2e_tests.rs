//! End-to-end CLI tests for mizan.
//!
//! These tests exercise the full CLI binary with isolated test environments.
//! Each test creates its own temporary data directory and config to ensure
//! isolation.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const SURAHS: &str = include_str!("fixtures/surahs.json");

// =============================================================================
// Test Environment Helper
// =============================================================================

/// Isolated test environment with its own data directory and config.
struct TestEnv {
    _temp_dir: TempDir,
    data_path: PathBuf,
    config_path: PathBuf,
}

impl TestEnv {
    /// Create a new environment with an empty data directory.
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();

        let data_path = root.join("data");
        fs::create_dir_all(&data_path).expect("Failed to create data dir");

        // Create config pointing to the data directory
        let config_path = root.join("config.toml");
        let config_content = format!("[data]\ndir = \"{}\"\n", data_path.display());
        fs::write(&config_path, config_content).expect("Failed to write config");

        Self {
            _temp_dir: temp_dir,
            data_path,
            config_path,
        }
    }

    /// Create an environment with surah, hadith and podcast collections.
    fn with_collections() -> Self {
        let env = Self::new();

        env.write("surahs.json", SURAHS);
        env.write(
            "hadiths.json",
            r#"[
    {"label": "Sahih al-Bukhari"},
    {"label": "Sahih Muslim"},
    {"label": "Sunan Abu Dawud"}
]"#,
        );
        env.write(
            "podcasts.json",
            r#"[
    {
        "episodeTitle": "Lessons from Surah Yusuf",
        "episodeURL": "lessons/yusuf.mp3",
        "episodeDate": "2024-01-05",
        "episodeDuration": "32:00"
    }
]"#,
        );

        env
    }

    fn write(&self, name: &str, contents: &str) {
        fs::write(self.data_path.join(name), contents).expect("Failed to write collection");
    }

    /// Get a Command configured for this test environment.
    fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("mizan");
        cmd.env("MIZAN_CONFIG", &self.config_path);
        cmd.env_remove("MIZAN_DATA_DIR");
        cmd.env_remove("RUST_LOG");
        cmd
    }
}

// =============================================================================
// 1. Help / No Command Tests
// =============================================================================

#[test]
fn tc_1_1_no_subcommand_shows_help() {
    let env = TestEnv::new();

    env.command()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("categories"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn tc_1_2_help_flag() {
    let env = TestEnv::new();

    env.command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Fuzzy search over Quran, Hadith and podcast collections",
        ));
}

#[test]
fn tc_1_3_version_flag() {
    let env = TestEnv::new();

    env.command()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mizan"));
}

// =============================================================================
// 2. Search Command Tests
// =============================================================================

#[test]
fn tc_2_1_search_with_matches() {
    let env = TestEnv::with_collections();

    env.command()
        .args(["search", "baqarah"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## surahs"))
        .stdout(predicate::str::contains("0.80  Al-Baqarah (#2)"))
        .stdout(predicate::str::contains("result(s) found"));
}

#[test]
fn tc_2_2_search_with_no_matches() {
    let env = TestEnv::with_collections();

    // only an exact match (1.2) clears 1.1
    env.command()
        .args(["search", "yusu", "--min-score", "1.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches found for 'yusu'"));
}

#[test]
fn tc_2_3_search_tolerates_typos() {
    let env = TestEnv::with_collections();

    env.command()
        .args(["search", "yuusf", "--category", "surahs", "--limit", "114"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.60  Yusuf (#12)"));
}

#[test]
fn tc_2_4_search_with_category_filter() {
    let env = TestEnv::with_collections();

    env.command()
        .args(["search", "muslim", "--category", "hadiths"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## hadiths"))
        .stdout(predicate::str::contains("Sahih Muslim"))
        .stdout(predicate::str::contains("## surahs").not());
}

#[test]
fn tc_2_5_search_unknown_category() {
    let env = TestEnv::with_collections();

    env.command()
        .args(["search", "x", "--category", "tafsir"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown category: tafsir"));
}

#[test]
fn tc_2_6_search_empty_query_lists_first_page() {
    let env = TestEnv::with_collections();

    env.command()
        .args(["search", "", "--category", "surahs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## surahs (114 match(es))"))
        .stdout(predicate::str::contains("Al-Fatihah (#1)"))
        .stdout(predicate::str::contains("An-Nisa (#4)"))
        .stdout(predicate::str::contains("Al-Ma'idah").not())
        .stdout(predicate::str::contains("4 result(s) found"));
}

#[test]
fn tc_2_7_search_with_limit_and_offset() {
    let env = TestEnv::with_collections();

    env.command()
        .args(["search", "", "-c", "surahs", "--limit", "2", "--offset", "112"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Al-Falaq (#113)"))
        .stdout(predicate::str::contains("An-Nas (#114)"))
        .stdout(predicate::str::contains("2 result(s) found"));
}

#[test]
fn tc_2_8_search_json_output() {
    let env = TestEnv::with_collections();

    let output = env
        .command()
        .args(["search", "yusuf", "--json"])
        .output()
        .expect("Failed to run mizan");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["surahs"]["results"][0]["name"], "Yusuf");
    assert_eq!(json["surahs"]["scores"][0], 1.2);
    assert_eq!(
        json["podcasts"]["results"][0]["downloadLink"],
        "https://podcasts.muslimcentral.com/lessons/yusuf.mp3"
    );
    assert_eq!(json["juzs"]["total"], 0);
}

#[test]
fn tc_2_9_search_min_score_filters() {
    let env = TestEnv::with_collections();

    env.command()
        .args(["search", "yuusf", "-c", "surahs", "--min-score", "0.9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches found for 'yuusf'"));
}

#[test]
fn tc_2_10_search_empty_data_dir() {
    let env = TestEnv::new();

    env.command()
        .args(["search", "test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No collections found"));
}

#[test]
fn tc_2_11_search_invalid_collection() {
    let env = TestEnv::new();
    env.write("surahs.json", "not valid json");

    env.command()
        .args(["search", "test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Loading collections failed"));
}

#[test]
fn tc_2_12_search_arabic_query() {
    let env = TestEnv::with_collections();

    env.command()
        .args(["search", "يوسف", "-c", "surahs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.20  Yusuf (#12)"));
}

#[test]
fn tc_2_13_search_long_query_scores_by_length() {
    let env = TestEnv::with_collections();

    // every word is more than three letters shorter, so each scores 1 - 4/17
    env.command()
        .args(["search", "xyznonexistent123", "-c", "hadiths"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## hadiths (3 match(es))"))
        .stdout(predicate::str::contains("0.76  Sahih al-Bukhari"));
}

// =============================================================================
// 3. Categories Command Tests
// =============================================================================

#[test]
fn tc_3_1_categories_lists_defaults() {
    let env = TestEnv::with_collections();

    env.command()
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("Data directory:"))
        .stdout(predicate::str::contains("surahs"))
        .stdout(predicate::str::contains("114 records"))
        .stdout(predicate::str::contains("[label] limit 5"))
        .stdout(predicate::str::contains("missing"));
}

// =============================================================================
// 4. Watch Command Tests
// =============================================================================

#[test]
fn tc_4_1_watch_debounces_piped_queries() {
    let env = TestEnv::with_collections();

    env.command()
        .args(["watch", "--json"])
        .write_stdin("y\nyu\nyus\nyusuf\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""query":"yusuf""#))
        .stdout(predicate::function(|out: &str| out.lines().count() == 1));
}

#[test]
fn tc_4_2_watch_text_output() {
    let env = TestEnv::with_collections();

    env.command()
        .arg("watch")
        .write_stdin("kahf\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("> kahf"))
        .stdout(predicate::str::contains("Al-Kahf (#18)"));
}

#[test]
fn tc_4_3_watch_empty_input() {
    let env = TestEnv::with_collections();

    env.command()
        .arg("watch")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// =============================================================================
// 5. Edge Cases and Config Tests
// =============================================================================

#[test]
fn tc_5_1_invalid_config_toml() {
    let env = TestEnv::new();
    fs::write(&env.config_path, "this is not [valid toml").unwrap();

    env.command()
        .args(["search", "test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn tc_5_2_data_dir_flag_overrides_config() {
    let env = TestEnv::new();
    let other = TempDir::new().expect("Failed to create temp dir");
    fs::write(other.path().join("surahs.json"), SURAHS).unwrap();

    env.command()
        .args(["search", "kahf", "--data-dir"])
        .arg(other.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Al-Kahf (#18)"));
}

#[test]
fn tc_5_3_custom_categories_from_config() {
    let env = TestEnv::new();
    env.write(
        "books.json",
        r#"[{"title": "Riyad as-Salihin"}, {"title": "Bulugh al-Maram"}]"#,
    );
    let config = format!(
        "[data]\ndir = \"{}\"\n\n[[categories]]\nname = \"books\"\nsearch_fields = [\"title\"]\n",
        env.data_path.display()
    );
    fs::write(&env.config_path, config).unwrap();

    env.command()
        .args(["search", "maram"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## books"))
        .stdout(predicate::str::contains("Bulugh al-Maram"));
}

#[test]
fn tc_5_4_missing_config_file() {
    let env = TestEnv::new();
    fs::remove_file(&env.config_path).unwrap();

    env.command()
        .args(["search", "test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config"));
}
