//! End-to-end engine tests: execution scenarios, failure isolation,
//! deployment gating, cancellation, and selection policies.

use super::{Engine, ExecutionOutputs};
use crate::cancellation::CancellationToken;
use crate::config::{CleanMode, LogLevel, Settings};
use crate::core::{Document, DocumentBatch};
use crate::errors::EngineError;
use crate::fs::{FileSystem, MemoryFileSystem};
use crate::graph::PhaseKind;
use crate::modules::{FnModule, Module};
use crate::pipeline::{ExecutionPolicy, Pipeline};
use crate::testing::{
    CountingModule, EmitDocuments, FailingModule, RecordPriorOutputs, SleepingModule,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn token() -> Arc<CancellationToken> {
    Arc::new(CancellationToken::new())
}

fn emit_one(dest: &str) -> Arc<dyn Module> {
    Arc::new(EmitDocuments::one(dest, "x"))
}

/// Captures the outputs map through `AfterEngineExecution`, which fires on
/// every path - the only way to observe per-phase results when `execute`
/// returns an error.
fn capture_outputs(engine: &Engine) -> Arc<Mutex<Option<ExecutionOutputs>>> {
    let captured = Arc::new(Mutex::new(None));
    let slot = captured.clone();
    engine.events().after_engine_execution().subscribe_fn(move |args| {
        *slot.lock() = Some(args.outputs.clone());
        Ok(())
    });
    captured
}

#[tokio::test]
async fn s1_linear_single_pipeline() {
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(emit_one("a.txt")),
        )
        .unwrap();

    let outputs = engine.execute(&[], true, token()).await.unwrap();

    let results = outputs.get("A").unwrap();
    assert!(results.iter().all(Option::is_some), "all four phases ran");

    let input = results[PhaseKind::Input.index()].as_ref().unwrap();
    let process = results[PhaseKind::Process.index()].as_ref().unwrap();
    assert_eq!(input.outputs.len(), 1);
    assert_eq!(process.outputs.len(), 1, "empty module list passes through");

    let final_docs = outputs.documents("A").unwrap();
    assert_eq!(final_docs.len(), 1);
    assert!(final_docs
        .get(0)
        .unwrap()
        .same_identity(input.outputs.get(0).unwrap()));
}

#[tokio::test]
async fn s2_dependency_outputs_and_ordering() {
    // Serial mode makes the dependency's Process outputs observable from
    // the dependent's Input deterministically.
    let mut engine = Engine::new().with_serial_execution(true);
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(emit_one("a.txt")),
        )
        .unwrap();
    engine
        .add_pipeline(
            Pipeline::new("B")
                .unwrap()
                .with_dependency("A")
                .with_input_module(Arc::new(RecordPriorOutputs::new("A", "prior"))),
        )
        .unwrap();

    let outputs = engine.execute(&[], true, token()).await.unwrap();

    let b_input = outputs.phase_result("B", PhaseKind::Input).unwrap();
    assert_eq!(
        b_input.outputs.get(0).unwrap().get("prior"),
        Some(&serde_json::json!(1))
    );

    let a_process = outputs.phase_result("A", PhaseKind::Process).unwrap();
    let b_process = outputs.phase_result("B", PhaseKind::Process).unwrap();
    assert!(
        b_process.start >= a_process.end(),
        "B.Process must start after A.Process completes"
    );
}

#[tokio::test]
async fn s2_dependency_ordering_holds_concurrently() {
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(emit_one("a.txt")),
        )
        .unwrap();
    engine
        .add_pipeline(Pipeline::new("B").unwrap().with_dependency("A"))
        .unwrap();

    let outputs = engine.execute(&[], true, token()).await.unwrap();

    let a_process = outputs.phase_result("A", PhaseKind::Process).unwrap();
    let b_process = outputs.phase_result("B", PhaseKind::Process).unwrap();
    assert!(b_process.start >= a_process.end());
}

#[tokio::test]
async fn s3_post_process_sees_all_same_group_process_outputs() {
    let seen: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));

    let recorder = |seen: Arc<Mutex<Vec<(usize, usize)>>>| -> Arc<dyn Module> {
        Arc::new(FnModule::new("RecordBoth", move |ctx| {
            let a = ctx.outputs("A").map_or(0, |b| b.len());
            let b = ctx.outputs("B").map_or(0, |b| b.len());
            seen.lock().push((a, b));
            Ok(ctx.inputs().clone())
        }))
    };

    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(emit_one("a.txt"))
                .with_post_process_module(recorder(seen.clone())),
        )
        .unwrap();
    engine
        .add_pipeline(
            Pipeline::new("B")
                .unwrap()
                .with_input_module(emit_one("b.txt"))
                .with_post_process_module(recorder(seen.clone())),
        )
        .unwrap();

    engine.execute(&[], true, token()).await.unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    for &(a, b) in seen.iter() {
        assert!(a >= 1, "PostProcess ran before A's Process completed");
        assert!(b >= 1, "PostProcess ran before B's Process completed");
    }
}

#[tokio::test]
async fn s4_deployment_gate_orders_and_fires() {
    let t_gate: Arc<Mutex<Option<DateTime<Utc>>>> = Arc::new(Mutex::new(None));

    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(emit_one("a.txt")),
        )
        .unwrap();
    engine
        .add_pipeline(
            Pipeline::new("D")
                .unwrap()
                .deployment()
                .with_input_module(emit_one("d.txt")),
        )
        .unwrap();

    {
        let t_gate = t_gate.clone();
        engine.events().before_deployment().subscribe_fn(move |_args| {
            *t_gate.lock() = Some(Utc::now());
            Ok(())
        });
    }

    let outputs = engine.execute(&["D"], true, token()).await.unwrap();

    let t_gate = (*t_gate.lock()).expect("gate event must fire");
    let a_output = outputs.phase_result("A", PhaseKind::Output).unwrap();
    let d_input = outputs.phase_result("D", PhaseKind::Input).unwrap();

    assert!(
        a_output.end() <= t_gate,
        "gate fired before A's Output completed"
    );
    assert!(
        t_gate <= d_input.start,
        "deployment Input started before the gate fired"
    );
}

#[tokio::test]
async fn before_deployment_fires_without_deployment_pipelines() {
    let fired = Arc::new(Mutex::new(false));

    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(emit_one("a.txt")),
        )
        .unwrap();
    {
        let fired = fired.clone();
        engine.events().before_deployment().subscribe_fn(move |_args| {
            *fired.lock() = true;
            Ok(())
        });
    }

    engine.execute(&[], true, token()).await.unwrap();
    assert!(*fired.lock());
}

#[tokio::test]
async fn s5_failure_is_isolated_to_dependents() {
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(emit_one("a.txt"))
                .with_process_module(Arc::new(FailingModule::new("broken render"))),
        )
        .unwrap();
    engine
        .add_pipeline(
            Pipeline::new("B")
                .unwrap()
                .with_input_module(emit_one("b.txt")),
        )
        .unwrap();
    engine
        .add_pipeline(
            Pipeline::new("C")
                .unwrap()
                .with_dependency("A")
                .with_input_module(emit_one("c.txt")),
        )
        .unwrap();
    let captured = capture_outputs(&engine);

    let err = engine.execute(&[], true, token()).await.unwrap_err();
    assert!(matches!(err, EngineError::Module { .. }));

    let captured = captured.lock();
    let outputs = captured.as_ref().unwrap();

    // B is unrelated and ran to completion.
    let b = outputs.get("B").unwrap();
    assert!(b.iter().all(Option::is_some));

    // A stopped at its failing Process.
    let a = outputs.get("A").unwrap();
    assert!(a[PhaseKind::Input.index()].is_some());
    assert!(a[PhaseKind::Process.index()].is_none());
    assert!(a[PhaseKind::PostProcess.index()].is_none());
    assert!(a[PhaseKind::Output.index()].is_none());

    // C's Input has no dependencies and ran; everything downstream of
    // A.Process was skipped.
    let c = outputs.get("C").unwrap();
    assert!(c[PhaseKind::Input.index()].is_some());
    assert!(c[PhaseKind::Process.index()].is_none());
    assert!(c[PhaseKind::Output.index()].is_none());
}

#[tokio::test]
async fn s6_cancellation_stops_sleeping_module() {
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(Arc::new(SleepingModule::new(Duration::from_secs(10)))),
        )
        .unwrap();
    let captured = capture_outputs(&engine);

    let token = token();
    {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel("test timeout");
        });
    }

    let started = std::time::Instant::now();
    let err = engine.execute(&[], true, token).await.unwrap_err();
    assert!(err.is_cancellation());
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "cancellation must not wait out the sleep"
    );

    let captured = captured.lock();
    let outputs = captured.as_ref().unwrap();
    assert!(outputs.get("A").unwrap()[PhaseKind::Input.index()].is_none());
}

#[tokio::test]
async fn cancellation_before_start_runs_no_modules() {
    let counting = Arc::new(CountingModule::new());
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(counting.clone()),
        )
        .unwrap();
    let captured = capture_outputs(&engine);

    let token = token();
    token.cancel("cancelled before start");

    let err = engine.execute(&[], true, token).await.unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
    assert_eq!(counting.calls(), 0);

    // The summary/after event still ran, with no phase results.
    let captured = captured.lock();
    let outputs = captured.as_ref().unwrap();
    assert!(outputs.get("A").unwrap().iter().all(Option::is_none));
}

#[tokio::test]
async fn before_module_override_suppresses_execution() {
    let counting = Arc::new(CountingModule::new());
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(counting.clone()),
        )
        .unwrap();

    engine.events().before_module_execution().subscribe_fn(|args| {
        args.overridden_outputs = Some(DocumentBatch::single(
            Document::new().with_destination("injected.txt"),
        ));
        Ok(())
    });

    let outputs = engine.execute(&[], true, token()).await.unwrap();
    assert_eq!(counting.calls(), 0, "override must suppress the module");
    assert_eq!(
        outputs
            .phase_result("A", PhaseKind::Input)
            .unwrap()
            .outputs
            .len(),
        1
    );
}

#[tokio::test]
async fn empty_collection_executes_successfully() {
    let engine = Engine::new();
    let outputs = engine.execute(&[], true, token()).await.unwrap();
    assert!(outputs.is_empty());
}

#[tokio::test]
async fn unknown_pipeline_name_is_a_configuration_error() {
    let counting = Arc::new(CountingModule::new());
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(counting.clone()),
        )
        .unwrap();

    let err = engine.execute(&["Ghost"], true, token()).await.unwrap_err();
    assert!(matches!(err, EngineError::UnknownPipeline(_)));
    assert_eq!(counting.calls(), 0, "no phase may run");
}

#[tokio::test]
async fn selection_honors_policies() {
    let manual = Arc::new(CountingModule::new());
    let always = Arc::new(CountingModule::new());
    let normal = Arc::new(CountingModule::new());

    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("manual")
                .unwrap()
                .with_policy(ExecutionPolicy::Manual)
                .with_input_module(manual.clone()),
        )
        .unwrap();
    engine
        .add_pipeline(
            Pipeline::new("always")
                .unwrap()
                .with_policy(ExecutionPolicy::Always)
                .with_input_module(always.clone()),
        )
        .unwrap();
    engine
        .add_pipeline(
            Pipeline::new("normal")
                .unwrap()
                .with_input_module(normal.clone()),
        )
        .unwrap();

    // include_normal = false: only Always runs.
    let outputs = engine.execute(&[], false, token()).await.unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(always.calls(), 1);
    assert_eq!(manual.calls(), 0);
    assert_eq!(normal.calls(), 0);

    // Naming the manual pipeline selects it.
    let outputs = engine.execute(&["MANUAL"], false, token()).await.unwrap();
    assert!(outputs.get("manual").is_some());
    assert_eq!(manual.calls(), 1);
}

#[tokio::test]
async fn deployment_pipelines_default_to_manual() {
    let deploy = Arc::new(CountingModule::new());
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("deploy")
                .unwrap()
                .deployment()
                .with_input_module(deploy.clone()),
        )
        .unwrap();

    engine.execute(&[], true, token()).await.unwrap();
    assert_eq!(deploy.calls(), 0, "Default resolves to Manual for deployment");

    engine.execute(&["deploy"], true, token()).await.unwrap();
    assert_eq!(deploy.calls(), 1);
}

#[tokio::test]
async fn selection_closes_over_dependencies() {
    let dep = Arc::new(CountingModule::new());
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("base")
                .unwrap()
                .with_input_module(dep.clone()),
        )
        .unwrap();
    engine
        .add_pipeline(
            Pipeline::new("site")
                .unwrap()
                .with_dependency("base")
                .with_policy(ExecutionPolicy::Manual),
        )
        .unwrap();

    // base is Normal but include_normal is false; it still runs because
    // the named pipeline depends on it.
    let outputs = engine.execute(&["site"], false, token()).await.unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(dep.calls(), 1);
}

#[tokio::test]
async fn consecutive_executions_are_idempotent() {
    let mut engine = Engine::new();
    engine.add_pipeline(Pipeline::new("empty").unwrap()).unwrap();

    let first = engine.execute(&[], true, token()).await.unwrap();
    let second = engine.execute(&[], true, token()).await.unwrap();

    for outputs in [&first, &second] {
        let results = outputs.get("empty").unwrap();
        assert!(results.iter().all(Option::is_some));
        for result in results.iter().flatten() {
            assert!(result.outputs.is_empty());
        }
    }
}

#[tokio::test]
async fn execution_order_is_deterministic() {
    let mut engine = Engine::new();
    for name in ["c", "a", "b"] {
        engine
            .add_pipeline(
                Pipeline::new(name)
                    .unwrap()
                    .with_input_module(emit_one("x.txt")),
            )
            .unwrap();
    }

    let first = engine.execute(&[], true, token()).await.unwrap();
    let second = engine.execute(&[], true, token()).await.unwrap();

    let names = |o: &ExecutionOutputs| o.iter().map(|(n, _)| n.to_string()).collect::<Vec<_>>();
    assert_eq!(names(&first), vec!["c", "a", "b"]);
    assert_eq!(names(&first), names(&second));
}

#[tokio::test]
async fn failure_log_threshold_fails_the_execution() {
    let mut engine = Engine::new()
        .with_settings(Settings::default().with_failure_log_level(LogLevel::Warning));
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(Arc::new(FnModule::new("Warner", |ctx| {
                    ctx.log(LogLevel::Warning, "suspicious front matter");
                    Ok(ctx.inputs().clone())
                }))),
        )
        .unwrap();

    let err = engine.execute(&[], true, token()).await.unwrap_err();
    match err {
        EngineError::FailuresLogged { threshold, records } => {
            assert_eq!(threshold, LogLevel::Warning);
            assert_eq!(records.len(), 1);
            assert!(records[0].message.contains("front matter"));
        }
        other => panic!("expected FailuresLogged, got {other:?}"),
    }
}

#[tokio::test]
async fn logs_below_threshold_do_not_fail() {
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(Arc::new(FnModule::new("Warner", |ctx| {
                    ctx.log(LogLevel::Warning, "just noise");
                    Ok(ctx.inputs().clone())
                }))),
        )
        .unwrap();

    assert!(engine.execute(&[], true, token()).await.is_ok());
}

#[tokio::test]
async fn reentrant_execution_is_rejected() {
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("slow")
                .unwrap()
                .with_input_module(Arc::new(SleepingModule::new(Duration::from_millis(300)))),
        )
        .unwrap();
    let engine = Arc::new(engine);

    let first = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.execute(&[], true, token()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = engine.execute(&[], true, token()).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyExecuting(_)));

    first.await.unwrap().unwrap();
}

#[tokio::test]
async fn first_execution_wipes_the_output_directory() {
    let fs = Arc::new(MemoryFileSystem::new());
    fs.seed("output/stale.html", b"old".to_vec());

    let mut engine = Engine::new().with_file_system(fs.clone());
    engine.add_pipeline(Pipeline::new("A").unwrap()).unwrap();

    engine.execute(&[], true, token()).await.unwrap();
    assert!(fs.read(Path::new("output/stale.html")).await.is_err());
}

#[derive(Debug)]
struct WriteMarker;

#[async_trait::async_trait]
impl Module for WriteMarker {
    fn name(&self) -> &str {
        "WriteMarker"
    }

    async fn execute(
        &self,
        ctx: &crate::context::ModuleContext,
    ) -> Result<DocumentBatch, EngineError> {
        ctx.file_system()
            .write(Path::new("output/marker.txt"), b"run")
            .await?;
        Ok(ctx.inputs().clone())
    }
}

#[tokio::test]
async fn written_clean_mode_deletes_previous_outputs() {
    let fs = Arc::new(MemoryFileSystem::new());
    let mut engine = Engine::new()
        .with_file_system(fs.clone())
        .with_settings(Settings::default().with_clean_mode(CleanMode::Written));
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_output_module(Arc::new(WriteMarker)),
        )
        .unwrap();

    engine.execute(&[], true, token()).await.unwrap();
    assert!(fs.read(Path::new("output/marker.txt")).await.is_ok());
    assert_eq!(fs.written_files().len(), 1);

    // The second execution deletes what the first wrote, then the module
    // writes it again; the tracked set holds only the fresh write.
    engine.execute(&[], true, token()).await.unwrap();
    assert!(fs.read(Path::new("output/marker.txt")).await.is_ok());
    assert_eq!(fs.written_files().len(), 1, "written set was reset");
}

#[tokio::test]
async fn clean_mode_none_preserves_outputs_between_runs() {
    let fs = Arc::new(MemoryFileSystem::new());
    let mut engine = Engine::new().with_file_system(fs.clone());
    engine.add_pipeline(Pipeline::new("A").unwrap()).unwrap();

    // The first execution always wipes; seed afterwards and re-run.
    engine.execute(&[], true, token()).await.unwrap();
    fs.seed("output/kept.html", b"kept".to_vec());

    engine.execute(&[], true, token()).await.unwrap();
    assert_eq!(fs.read(Path::new("output/kept.html")).await.unwrap(), b"kept");
}

#[tokio::test]
async fn dispose_removes_written_files_and_blocks_the_engine() {
    let fs = Arc::new(MemoryFileSystem::new());
    let mut engine = Engine::new().with_file_system(fs.clone());
    engine.add_pipeline(Pipeline::new("A").unwrap()).unwrap();

    engine.execute(&[], true, token()).await.unwrap();
    fs.write(Path::new("output/page.html"), b"content").await.unwrap();

    engine.dispose().await.unwrap();
    assert!(fs.read(Path::new("output/page.html")).await.is_err());

    let err = engine.execute(&[], true, token()).await.unwrap_err();
    assert!(matches!(err, EngineError::Disposed));

    let err = engine.dispose().await.unwrap_err();
    assert!(matches!(err, EngineError::Disposed));
}

#[tokio::test]
async fn pipeline_mutation_invalidates_the_cached_graph() {
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(emit_one("a.txt")),
        )
        .unwrap();

    let outputs = engine.execute(&[], true, token()).await.unwrap();
    assert_eq!(outputs.len(), 1);

    engine
        .pipelines_mut()
        .add(
            Pipeline::new("B")
                .unwrap()
                .with_input_module(emit_one("b.txt")),
        )
        .unwrap();

    let outputs = engine.execute(&[], true, token()).await.unwrap();
    assert_eq!(outputs.len(), 2);
    assert!(outputs.get("B").is_some());
}

#[tokio::test]
async fn isolated_pipeline_runs_alongside_failures() {
    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("broken")
                .unwrap()
                .with_input_module(Arc::new(FailingModule::new("boom"))),
        )
        .unwrap();
    engine
        .add_pipeline(
            Pipeline::new("iso")
                .unwrap()
                .isolated()
                .with_input_module(emit_one("iso.txt")),
        )
        .unwrap();
    let captured = capture_outputs(&engine);

    engine.execute(&[], true, token()).await.unwrap_err();

    let captured = captured.lock();
    let outputs = captured.as_ref().unwrap();
    assert!(outputs.get("iso").unwrap().iter().all(Option::is_some));
}

#[tokio::test]
async fn analyzer_results_feed_the_failure_threshold() {
    use crate::analysis::{Analyzer, AnalyzerContext};
    use crate::core::AnalyzerResult;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct FlagEverything;

    #[async_trait]
    impl Analyzer for FlagEverything {
        fn name(&self) -> &str {
            "FlagEverything"
        }

        async fn analyze(
            &self,
            ctx: &AnalyzerContext<'_>,
        ) -> Result<Vec<AnalyzerResult>, EngineError> {
            Ok(ctx
                .documents
                .iter()
                .map(|d| {
                    AnalyzerResult::new("FlagEverything", LogLevel::Warning, "flagged").with_document(
                        d.destination().map(Path::to_path_buf).unwrap_or_default(),
                    )
                })
                .collect())
        }
    }

    let mut engine = Engine::new()
        .with_settings(
            Settings::default()
                .with_analyzer("FlagEverything=Error")
                .with_failure_log_level(LogLevel::Error),
        )
        .with_analyzer(Arc::new(FlagEverything));
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(emit_one("a.txt")),
        )
        .unwrap();

    let err = engine.execute(&[], true, token()).await.unwrap_err();
    match err {
        EngineError::FailuresLogged { records, .. } => {
            assert!(records.iter().any(|r| r.message.contains("flagged")));
        }
        other => panic!("expected FailuresLogged, got {other:?}"),
    }
}

#[tokio::test]
async fn after_engine_execution_reports_elapsed_time() {
    let elapsed: Arc<Mutex<Option<f64>>> = Arc::new(Mutex::new(None));

    let mut engine = Engine::new();
    engine
        .add_pipeline(
            Pipeline::new("A")
                .unwrap()
                .with_input_module(emit_one("a.txt")),
        )
        .unwrap();
    {
        let elapsed = elapsed.clone();
        engine.events().after_engine_execution().subscribe_fn(move |args| {
            *elapsed.lock() = Some(args.elapsed_ms);
            Ok(())
        });
    }

    engine.execute(&[], true, token()).await.unwrap();
    assert!(elapsed.lock().is_some());
}
