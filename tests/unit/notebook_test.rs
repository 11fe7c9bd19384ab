//! Tests for notebook assembly and artifact grouping

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use snowball::adapters::file::assemble_all;
use snowball::adapters::walker::ArtifactWalker;
use snowball::core::models::Artifact;
use snowball::core::services::{NotebookAssembler, TableRetarget};

use crate::common::TestProject;

fn notebook_json(project: &TestProject, group: &str) -> serde_json::Value {
    let path = project.paths().notebooks_dir().join(format!("{group}_nb.ipynb"));
    serde_json::from_str(&project.read(path)).unwrap()
}

fn cell_sources(json: &serde_json::Value) -> Vec<String> {
    json["cells"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["source"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_artifacts_sorted_by_name() {
    let artifacts = vec![
        Artifact::in_group(PathBuf::from("/c/10_core/b.sql"), "10_core", "SELECT 2".into()).unwrap(),
        Artifact::in_group(PathBuf::from("/c/10_core/a.sql"), "10_core", "SELECT 1".into()).unwrap(),
    ];
    let doc = NotebookAssembler::new().assemble("10_core", &artifacts);

    let names: Vec<_> = doc
        .cells
        .iter()
        .filter(|c| c.source.starts_with("##### **"))
        .map(|c| c.source.clone())
        .collect();
    assert_eq!(names, vec!["##### **a**", "##### **b**"]);
}

#[test]
fn test_every_file_in_exactly_one_group() {
    let project = TestProject::new();
    project.add_compiled("30_reports", "churn", "SELECT 1");
    let walker = ArtifactWalker::new(project.paths().compiled_dir(), "sql").unwrap();

    let groups = walker.grouped();
    let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["10_core", "20_mart", "30_reports"]);

    let mut seen = HashSet::new();
    for file in groups.iter().flat_map(|g| &g.files) {
        assert!(seen.insert(file.clone()), "{} grouped twice", file.display());
    }
    assert_eq!(seen.len(), walker.files().len());
}

#[test]
fn test_assemble_all_writes_notebooks() {
    let project = TestProject::new();
    let paths = project.paths();

    let report = assemble_all(&paths.compiled_dir(), &paths.notebooks_dir(), &NotebookAssembler::new()).unwrap();
    assert_eq!(report.summary(), "2 of 2 succeeded");

    let core = notebook_json(&project, "10_core");
    assert_eq!(core["nbformat"], 4);
    assert_eq!(core["nbformat_minor"], 5);

    let sources = cell_sources(&core);
    assert_eq!(sources.len(), 6);
    assert!(sources[0].contains("#### **Notebook to create CORE layer**"));
    assert_eq!(sources[1], "%%sql\nCREATE SCHEMA IF NOT EXISTS core;");
    assert_eq!(sources[2], "##### **orders**");
    assert_eq!(
        sources[3],
        "%%sql\nDROP TABLE IF EXISTS core.orders;\nCREATE TABLE core.orders AS\nSELECT id, amount FROM raw.orders"
    );
    assert_eq!(sources[4], "##### **revenue**");

    let ids: Vec<_> = core["cells"].as_array().unwrap().iter().map(|c| c["id"].clone()).collect();
    let unique: HashSet<_> = ids.iter().map(ToString::to_string).collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn test_assemble_all_with_retarget() {
    let project = TestProject::new();
    let paths = project.paths();
    let assembler =
        NotebookAssembler::new().with_retarget(Some(TableRetarget::new("revenue", "snowball_revenue", "arr_2024")));

    assemble_all(&paths.compiled_dir(), &paths.notebooks_dir(), &assembler).unwrap();

    let sources = cell_sources(&notebook_json(&project, "10_core"));
    assert!(sources[5].ends_with("SELECT * FROM finance.arr_2024"));
}

#[test]
fn test_reassembly_is_deterministic() {
    let project = TestProject::new();
    let paths = project.paths();
    let assembler = NotebookAssembler::new();

    assemble_all(&paths.compiled_dir(), &paths.notebooks_dir(), &assembler).unwrap();
    let first = project.read(paths.notebooks_dir().join("20_mart_nb.ipynb"));
    assemble_all(&paths.compiled_dir(), &paths.notebooks_dir(), &assembler).unwrap();
    let second = project.read(paths.notebooks_dir().join("20_mart_nb.ipynb"));
    assert_eq!(first, second);
}

#[test]
fn test_unwritable_notebook_leaves_others_written() {
    let project = TestProject::new();
    let paths = project.paths();
    fs::create_dir_all(paths.notebooks_dir().join("10_core_nb.ipynb")).unwrap();

    let report = assemble_all(&paths.compiled_dir(), &paths.notebooks_dir(), &NotebookAssembler::new()).unwrap();

    assert_eq!(report.summary(), "1 of 2 succeeded");
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.contains("failed to write"));
    assert!(paths.notebooks_dir().join("10_core_nb.ipynb").is_dir());

    let mart = notebook_json(&project, "20_mart");
    assert_eq!(cell_sources(&mart)[2], "##### **arr**");
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_does_not_block_notebooks() {
    let project = TestProject::new();
    let paths = project.paths();
    let link = project.compiled("10_core", "gone");
    std::os::unix::fs::symlink(project.path().join("nowhere.sql"), &link).unwrap();

    let report = assemble_all(&paths.compiled_dir(), &paths.notebooks_dir(), &NotebookAssembler::new()).unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, link);

    let core = cell_sources(&notebook_json(&project, "10_core"));
    assert_eq!(core.len(), 6);
    assert!(paths.notebooks_dir().join("20_mart_nb.ipynb").exists());
}
