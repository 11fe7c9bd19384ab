//! Tests for build orchestration and pipelines

use std::time::Duration;

use snowball::core::models::{BuildOperation, RunState};
use snowball::core::ports::{InvocationError, SilentReporter};
use snowball::core::services::TableRetarget;
use snowball::runner::{RunError, Runner, count_models};

use crate::common::mocks::{BrokenInvoker, RecordingReporter, Script, ScriptedInvoker};
use crate::common::{TestProject, compile_lines, run_lines};

const POLL: Duration = Duration::from_millis(2);

fn model_ids() -> [&'static str; 3] {
    ["snowball_dbt.core.orders", "snowball_dbt.core.revenue", "snowball_dbt.mart.arr"]
}

fn healthy_build() -> ScriptedInvoker {
    ScriptedInvoker::new()
        .with("run-operation", Script::ok(vec!["Running macro pre_run_setup\n".to_string()]))
        .with("run", Script::ok(run_lines(&model_ids())))
        .with("compile", Script::ok(compile_lines(&model_ids())))
}

// =============================================================================
// SINGLE RUNS
// =============================================================================

#[tokio::test]
async fn test_three_completions_end_at_target_with_success_label() {
    let project = TestProject::new();
    let invoker = ScriptedInvoker::new()
        .with(
            "run",
            Script::ok(vec![
                "1 of 3 OK created sql table model p.a [OK in 0.1s]\n".to_string(),
                "2 of 3 OK created sql table model p.b [OK in 0.1s]\n".to_string(),
                "3 of 3 OK created sql table model p.c [OK in 0.1s]\n".to_string(),
            ]),
        )
        .with_delay(Duration::from_millis(5));
    let runner = Runner::new(invoker, POLL);
    let mut reporter = RecordingReporter::default();

    let request = project.settings().request(BuildOperation::Run);
    let outcome = runner.run(&request, 3, &mut reporter).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.progress.completed, 3);
    assert_eq!(outcome.progress.target, 3);
    assert_eq!(outcome.progress.label, "All 3 models executed successfully");
    assert_eq!(reporter.finished, 1);

    let counts: Vec<_> = reporter.snapshots.iter().map(|s| s.completed).collect();
    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {counts:?}");
    assert!(counts.iter().all(|c| *c <= 3));
}

#[tokio::test]
async fn test_burst_output_is_caught_by_final_scan() {
    let project = TestProject::new();
    // No delay: everything may arrive before the first tick
    let runner = Runner::new(
        ScriptedInvoker::new().with("compile", Script::failing(compile_lines(&model_ids()))),
        Duration::from_secs(3600),
    );

    let request = project.settings().request(BuildOperation::Compile);
    let outcome = runner.run(&request, 5, &mut SilentReporter).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.progress.completed, 3);
    assert_eq!(outcome.progress.state, RunState::Failed);
    assert_eq!(outcome.progress.label, "Compilation failed (3/5 models compiled)");
    assert!(outcome.log.contains("Found 3 models"));
}

#[tokio::test]
async fn test_spawn_failure_aborts_before_output() {
    let project = TestProject::new();
    let runner = Runner::new(BrokenInvoker, POLL);
    let mut reporter = RecordingReporter::default();

    let request = project.settings().request(BuildOperation::Debug);
    let err = runner.run(&request, 1, &mut reporter).await.unwrap_err();

    assert!(matches!(err, InvocationError::Spawn { .. }));
    assert!(reporter.snapshots.is_empty());
}

#[test]
fn test_count_models() {
    let project = TestProject::new();
    assert_eq!(count_models(&project.paths()), 3);

    let empty = tempfile::TempDir::new().unwrap();
    let paths = snowball::paths::ProjectPaths::new(empty.path(), empty.path(), empty.path());
    assert_eq!(count_models(&paths), 0);
}

// =============================================================================
// PIPELINES
// =============================================================================

#[tokio::test]
async fn test_sql_pipeline_runs_steps_in_order_and_rewrites() {
    let project = TestProject::new();
    let runner = Runner::new(healthy_build(), POLL);
    let mut settings = project.settings();
    settings.retarget = Some(TableRetarget::new("revenue", "snowball_revenue", "arr_2024"));

    let report = runner.sql_pipeline(&settings, &mut SilentReporter).await.unwrap();

    let keywords: Vec<_> = runner
        .invoker()
        .requests()
        .iter()
        .map(|r| r.operation.to_string())
        .collect();
    assert_eq!(keywords, vec!["run-operation pre_run_setup", "run", "compile"]);

    assert_eq!(report.steps.len(), 3);
    assert!(report.steps.iter().all(|s| s.progress.completed == s.progress.target));
    assert_eq!(report.steps[1].progress.target, 3);
    assert_eq!(report.rewrite.as_ref().unwrap().summary(), "3 of 3 succeeded");
    assert_eq!(report.retarget.as_ref().unwrap().succeeded, 1);

    let revenue = project.read(project.compiled("10_core", "revenue"));
    assert!(revenue.starts_with("CREATE OR ALTER PROCEDURE core.sp_revenue"));
    assert!(revenue.contains("INTO core.revenue\nFROM finance.arr_2024"));
}

#[tokio::test]
async fn test_pipeline_stops_at_failed_step() {
    let project = TestProject::new();
    let invoker = healthy_build().with("run", Script::failing(run_lines(&model_ids()[..1])));
    let runner = Runner::new(invoker, POLL);

    let err = runner.sql_pipeline(&project.settings(), &mut SilentReporter).await.unwrap_err();

    let RunError::Failed(failure) = err else {
        panic!("expected a build failure, got {err}");
    };
    assert_eq!(failure.operation, BuildOperation::Run);
    assert_eq!(failure.progress.completed, 1);
    assert_eq!(runner.invoker().requests().len(), 2);

    // Nothing was post-processed
    let orders = project.read(project.compiled("10_core", "orders"));
    assert_eq!(orders, "SELECT id, amount FROM raw.orders");
}

#[tokio::test]
async fn test_notebook_pipeline_writes_one_notebook_per_group() {
    let project = TestProject::new();
    let runner = Runner::new(healthy_build(), POLL);

    let report = runner.notebook_pipeline(&project.settings(), &mut SilentReporter).await.unwrap();

    assert_eq!(report.notebooks.as_ref().unwrap().summary(), "2 of 2 succeeded");
    assert!(report.rewrite.is_none());
    let notebooks = project.paths().notebooks_dir();
    assert!(notebooks.join("10_core_nb.ipynb").exists());
    assert!(notebooks.join("20_mart_nb.ipynb").exists());

    // Compiled sources are only read
    let orders = project.read(project.compiled("10_core", "orders"));
    assert_eq!(orders, "SELECT id, amount FROM raw.orders");
}

#[tokio::test]
async fn test_requests_carry_vars() {
    let project = TestProject::new();
    let runner = Runner::new(healthy_build(), POLL);
    runner.notebook_pipeline(&project.settings(), &mut SilentReporter).await.unwrap();

    let requests = runner.invoker().requests();
    let args = requests[0].to_args().unwrap();
    assert_eq!(&args[..2], ["run-operation", "pre_run_setup"]);
    assert!(args.iter().any(|a| a.contains(r#""my_database":"analytics""#)));
    assert!(args.iter().any(|a| a.contains(r#""db_name":"analytics""#)));
}
