use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_site(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let posts = root.join("posts");
    fs::create_dir_all(&posts)?;

    fs::write(
        root.join("butterfly.yml"),
        r#"
site:
  title: "Test Blog"
paths:
  content: "posts"
render:
  cache_capacity: 0
"#,
    )?;

    fs::write(
        posts.join("rust-guide.md"),
        "---\ntitle: Rust Guide\ndate: 2024-03-01\ncategory: tech\ndescription: Learning Rust\n---\n# Rust Guide\n\nOwnership and borrowing explained.\n",
    )?;
    fs::write(
        posts.join("diary.md"),
        "---\ntitle: Diary\ndate: 2023-12-31\n---\n今天天气很好\n",
    )?;

    Ok(())
}

#[allow(deprecated)]
fn butterfly(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("butterfly").expect("binary built");
    cmd.current_dir(dir);
    cmd
}

#[test]
fn search_json_outputs_results() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    let assert = butterfly(dir.path())
        .args(["search", "borrowing", "--json", "--limit", "1"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    let arr = value.as_array().expect("json array");
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["id"], "rust-guide");
    assert_eq!(arr[0]["category"], "tech");
    assert!(arr[0]["snippet"]
        .as_str()
        .expect("snippet")
        .contains("borrowing"));

    Ok(())
}

#[test]
fn search_single_char_finds_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    butterfly(dir.path())
        .args(["search", "r"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found for 'r'"));

    Ok(())
}

#[test]
fn list_json_is_newest_first() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    let assert = butterfly(dir.path()).args(["list", "--json"]).assert().success();

    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(value["articles"][0]["id"], "rust-guide");
    assert_eq!(value["articles"][1]["category"], "未分类");
    assert_eq!(value["categories"], serde_json::json!(["tech", "未分类"]));

    Ok(())
}

#[test]
fn article_html_strips_title() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    butterfly(dir.path())
        .args(["article", "rust-guide", "--format", "html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<p>Ownership and borrowing explained.</p>"))
        .stdout(predicate::str::contains("<h1>").not());

    Ok(())
}

#[test]
fn missing_article_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    butterfly(dir.path())
        .args(["article", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));

    Ok(())
}

#[test]
fn missing_config_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("content"))?;
    fs::write(dir.path().join("content").join("hello.md"), "hello there")?;

    let assert = butterfly(dir.path()).args(["list", "--json"]).assert().success();
    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(value["articles"][0]["title"], "Untitled");

    Ok(())
}

#[test]
fn list_text_shows_site_title() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_site(dir.path())?;

    butterfly(dir.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Test Blog\n"))
        .stdout(predicate::str::contains("[tech] Rust Guide"));

    Ok(())
}
