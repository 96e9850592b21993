//! Integration tests for workspace scaffolding (`ticbuild init`)
//!
//! These tests verify:
//! - Layout creation (workspace, build/, placeholder output)
//! - Declining the prompt copies nothing
//! - Running init twice overwrites nothing and reports every skipped file

use camino::Utf8PathBuf;
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;
use ticbuild::scaffold::TEMPLATES;
use ticbuild::{ConfigManager, ScaffoldOutcome, Scaffolder};

fn create_test_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let workspace = Utf8PathBuf::try_from(temp_dir.path().join("game")).unwrap();
    (temp_dir, workspace)
}

fn run_init(workspace: &Utf8PathBuf, assume_yes: bool, answer: &str) -> (ScaffoldOutcome, String) {
    let mut input = Cursor::new(answer.to_string());
    let mut out = Vec::new();
    let outcome = Scaffolder::new(workspace)
        .run(assume_yes, &mut input, &mut out)
        .unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

#[test]
fn test_init_creates_layout_and_templates() {
    let (_temp_dir, workspace) = create_test_dir();

    let (outcome, output) = run_init(&workspace, false, "y\n");

    assert!(workspace.join("build").is_dir());
    assert!(workspace.join("build/game.js").is_file());
    assert_eq!(fs::read_to_string(workspace.join("build/game.js")).unwrap(), "");
    for template in TEMPLATES {
        assert!(output.contains(template.path));
        assert!(workspace.join(template.path).is_file());
    }

    match outcome {
        ScaffoldOutcome::Completed { copied, skipped } => {
            assert_eq!(copied.len(), TEMPLATES.len());
            assert!(skipped.is_empty());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // The scaffolded workspace loads as a valid configuration
    let config = ConfigManager::new(&workspace).load_build_config().unwrap();
    assert_eq!(config.output_file, workspace.join("build/game.js"));
}

#[test]
fn test_init_declined_copies_nothing() {
    let (_temp_dir, workspace) = create_test_dir();

    let (outcome, output) = run_init(&workspace, false, "n\n");

    assert_eq!(outcome, ScaffoldOutcome::Declined);
    assert!(output.contains("[y/N]"));
    assert!(workspace.join("build").is_dir());
    for template in TEMPLATES {
        assert!(!workspace.join(template.path).exists());
    }
}

#[test]
fn test_init_twice_skips_existing_files() {
    let (_temp_dir, workspace) = create_test_dir();
    run_init(&workspace, true, "");

    // User edits survive a second init
    fs::write(workspace.join("src/main.ts"), "// edited\n").unwrap();
    fs::write(workspace.join("build/game.js"), "compiled").unwrap();

    let (outcome, output) = run_init(&workspace, true, "");

    match outcome {
        ScaffoldOutcome::Completed { copied, skipped } => {
            assert!(copied.is_empty());
            assert_eq!(skipped.len(), TEMPLATES.len());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    for template in TEMPLATES {
        assert!(output.contains(&format!("Skipping {}: file already exists", template.path)));
    }
    assert_eq!(fs::read_to_string(workspace.join("src/main.ts")).unwrap(), "// edited\n");
    assert_eq!(fs::read_to_string(workspace.join("build/game.js")).unwrap(), "compiled");
}

#[test]
fn test_placeholder_follows_existing_compiler_config() {
    let (_temp_dir, workspace) = create_test_dir();
    fs::create_dir_all(&workspace).unwrap();
    fs::write(
        workspace.join("tsconfig.json"),
        r#"{ "compilerOptions": { "outFile": "dist/out.js" } }"#,
    )
    .unwrap();

    run_init(&workspace, false, "no\n");

    assert!(workspace.join("dist/out.js").is_file());
    assert!(!workspace.join("build/game.js").exists());
}
