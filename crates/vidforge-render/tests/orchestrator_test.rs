//! End-to-end orchestrator scenarios against a scripted fake engine.
//!
//! The fake engine records the argument vector it received and then behaves
//! as directed: produce an output artifact, fail with a diagnostic, produce
//! nothing, or hang past the timeout. Every scenario also asserts the
//! workspace is gone afterwards, success or failure.
#![cfg(unix)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use vidforge_core::{Config, DeliveryResult, InputSpec, JobError, RenderJob, ResourceSpec, StorageConfig};
use vidforge_render::JobOrchestrator;

struct Harness {
    orchestrator: JobOrchestrator,
    workspace_root: PathBuf,
    args_file: PathBuf,
    _dir: TempDir,
}

/// Build an orchestrator whose engine is a shell script with the given body.
/// `$ARGS_FILE` and `$OUT` (the last argument, i.e. the output path) are
/// available to the body.
fn harness(engine_body: &str, render_timeout: Duration) -> Harness {
    let dir = TempDir::new().unwrap();
    let args_file = dir.path().join("argv.txt");
    let engine_path = dir.path().join("fake-engine.sh");
    let workspace_root = dir.path().join("workspaces");

    let script = format!(
        "#!/bin/sh\n\
         ARGS_FILE=\"{args}\"\n\
         printf '%s\\n' \"$@\" > \"$ARGS_FILE\"\n\
         for a in \"$@\"; do OUT=$a; done\n\
         {body}\n",
        args = args_file.display(),
        body = engine_body,
    );
    std::fs::write(&engine_path, script).unwrap();
    let mut perms = std::fs::metadata(&engine_path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&engine_path, perms).unwrap();

    let config = Config {
        server_port: 0,
        engine_path: engine_path.to_string_lossy().into_owned(),
        workspace_root: workspace_root.clone(),
        render_timeout,
        fetch_timeout: Duration::from_secs(5),
        max_concurrent_jobs: 1,
        storage: StorageConfig::None,
    };

    Harness {
        orchestrator: JobOrchestrator::new(&config, reqwest::Client::new(), None),
        workspace_root,
        args_file,
        _dir: dir,
    }
}

fn job(inputs: Vec<InputSpec>, graph: &str, output_options: &[&str]) -> RenderJob {
    RenderJob {
        inputs,
        resources: vec![],
        filter_graph: graph.to_string(),
        output_options: output_options.iter().map(|o| o.to_string()).collect(),
        output_ext: "mp4".to_string(),
        total_frames: None,
    }
}

fn by_reference(locator: &str) -> InputSpec {
    InputSpec {
        locator: locator.to_string(),
        engine_options: vec![],
        materialize: false,
    }
}

fn recorded_args(harness: &Harness) -> Vec<String> {
    std::fs::read_to_string(&harness.args_file)
        .unwrap()
        .lines()
        .map(|l| l.to_string())
        .collect()
}

fn assert_workspace_root_empty(root: &Path) {
    let leftovers: Vec<_> = match std::fs::read_dir(root) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        // Root never created or already gone both mean no leaked workspace.
        Err(_) => return,
    };
    assert!(leftovers.is_empty(), "leaked workspaces: {leftovers:?}");
}

fn spawn_single_response_server(
    status: u16,
    reason: &'static str,
    body: Vec<u8>,
) -> (String, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        consume_request_headers(&mut stream);
        let headers = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(headers.as_bytes()).unwrap();
        stream.write_all(&body).unwrap();
        let _ = stream.flush();
    });

    (format!("http://{addr}"), handle)
}

fn consume_request_headers(stream: &mut TcpStream) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buffer = [0u8; 4096];
    let _ = stream.read(&mut buffer);
}

#[tokio::test]
async fn single_input_job_invokes_engine_and_delivers_inline() {
    let h = harness("printf 'rendered-bytes' > \"$OUT\"", Duration::from_secs(10));

    let result = h
        .orchestrator
        .execute(job(
            vec![by_reference("a.jpg")],
            "[0:v]scale=640:480[v]",
            &["-map", "[v]"],
        ))
        .await
        .unwrap();

    match result {
        DeliveryResult::Inline { data, content_type } => {
            assert_eq!(&data[..], b"rendered-bytes");
            assert_eq!(content_type, "video/mp4");
        }
        other => panic!("expected inline delivery, got {other:?}"),
    }

    let argv = recorded_args(&h);
    let tail = &argv[argv.len() - 7..];
    assert_eq!(
        &tail[..6],
        &[
            "-i",
            "a.jpg",
            "-filter_complex",
            "[0:v]scale=640:480[v]",
            "-map",
            "[v]",
        ]
    );
    let output = &tail[6];
    assert!(output.starts_with(h.workspace_root.to_string_lossy().as_ref()));
    assert!(output.ends_with("output.mp4"));

    assert_workspace_root_empty(&h.workspace_root);
}

#[tokio::test]
async fn resources_are_resolved_to_workspace_paths_in_the_graph() {
    let h = harness("printf 'rendered' > \"$OUT\"", Duration::from_secs(10));
    let (font_url, font_server) = spawn_single_response_server(200, "OK", b"glyphs".to_vec());
    let (logo_url, logo_server) = spawn_single_response_server(200, "OK", b"pixels".to_vec());

    let mut render_job = job(
        vec![by_reference("clip.mp4")],
        "drawtext=fontfile=font.ttf:text=hi,movie=logo.png[wm]",
        &[],
    );
    render_job.resources = vec![
        ResourceSpec {
            name: "font.ttf".to_string(),
            locator: format!("{font_url}/font.ttf"),
        },
        ResourceSpec {
            name: "logo.png".to_string(),
            locator: format!("{logo_url}/logo.png"),
        },
    ];

    h.orchestrator.execute(render_job).await.unwrap();
    font_server.join().unwrap();
    logo_server.join().unwrap();

    let argv = recorded_args(&h);
    let graph_pos = argv.iter().position(|t| t == "-filter_complex").unwrap();
    let graph = &argv[graph_pos + 1];

    let root = h.workspace_root.to_string_lossy().into_owned();
    assert!(
        graph.contains(&format!("fontfile={root}")),
        "fontfile should point into the workspace: {graph}"
    );
    assert!(graph.contains("/font.ttf:text=hi"), "{graph}");
    assert!(graph.contains("/logo.png[wm]"), "{graph}");

    assert_workspace_root_empty(&h.workspace_root);
}

#[tokio::test]
async fn failed_resource_fetch_fails_the_job_and_cleans_up() {
    let h = harness("printf 'rendered' > \"$OUT\"", Duration::from_secs(10));
    let (url, server) = spawn_single_response_server(404, "Not Found", b"gone".to_vec());

    let mut render_job = job(vec![by_reference("clip.mp4")], "[0:v]null[v]", &[]);
    render_job.resources = vec![ResourceSpec {
        name: "font.ttf".to_string(),
        locator: format!("{url}/font.ttf"),
    }];

    let err = h.orchestrator.execute(render_job).await.unwrap_err();
    server.join().unwrap();

    match err {
        JobError::ResourceFetch { name, .. } => assert_eq!(name, "font.ttf"),
        other => panic!("expected ResourceFetch, got {other:?}"),
    }

    // The engine must never have run.
    assert!(!h.args_file.exists());
    assert_workspace_root_empty(&h.workspace_root);
}

#[tokio::test]
async fn engine_failure_carries_diagnostic_tail_and_cleans_up() {
    let h = harness(
        "echo 'Unable to parse filter graph' >&2\nexit 1",
        Duration::from_secs(10),
    );

    let err = h
        .orchestrator
        .execute(job(vec![by_reference("a.mp4")], "not-a-graph", &[]))
        .await
        .unwrap_err();

    match err {
        JobError::ProcessFailure {
            exit_code,
            diagnostic_tail,
        } => {
            assert_eq!(exit_code, 1);
            assert!(diagnostic_tail.contains("Unable to parse filter graph"));
        }
        other => panic!("expected ProcessFailure, got {other:?}"),
    }

    assert_workspace_root_empty(&h.workspace_root);
}

#[tokio::test]
async fn clean_exit_without_output_is_output_missing() {
    let h = harness("exit 0", Duration::from_secs(10));

    let err = h
        .orchestrator
        .execute(job(vec![by_reference("a.mp4")], "[0:v]null[v]", &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::OutputMissing));
    assert_workspace_root_empty(&h.workspace_root);
}

#[tokio::test]
async fn hung_engine_times_out_within_budget_and_cleans_up() {
    let h = harness("sleep 30", Duration::from_millis(300));

    let started = Instant::now();
    let err = h
        .orchestrator
        .execute(job(vec![by_reference("a.mp4")], "[0:v]null[v]", &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::ProcessTimeout { .. }));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "timeout handling took {:?}",
        started.elapsed()
    );
    assert_workspace_root_empty(&h.workspace_root);
}

#[tokio::test]
async fn cancellation_fails_the_job_and_cleans_up() {
    let h = harness("sleep 30", Duration::from_secs(30));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = h
        .orchestrator
        .execute_with_id(
            Uuid::new_v4(),
            job(vec![by_reference("a.mp4")], "[0:v]null[v]", &[]),
            &cancel,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, JobError::Cancelled));
    assert_workspace_root_empty(&h.workspace_root);
}

#[tokio::test]
async fn validation_failure_never_touches_the_filesystem() {
    let h = harness("printf 'rendered' > \"$OUT\"", Duration::from_secs(10));

    let err = h
        .orchestrator
        .execute(job(vec![], "[0:v]null[v]", &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::Validation(_)));

    // No workspace was ever allocated.
    assert!(!h.workspace_root.exists());
}

#[tokio::test]
async fn undeclared_placeholder_is_rejected_before_any_io() {
    let h = harness("printf 'rendered' > \"$OUT\"", Duration::from_secs(10));

    let err = h
        .orchestrator
        .execute(job(
            vec![by_reference("a.mp4")],
            "drawtext=fontfile={{missing.ttf}}:text=hi",
            &[],
        ))
        .await
        .unwrap_err();

    match err {
        JobError::GraphResolution(name) => assert_eq!(name, "missing.ttf"),
        other => panic!("expected GraphResolution, got {other:?}"),
    }
    assert!(!h.workspace_root.exists());
}

#[tokio::test]
async fn concurrent_jobs_use_isolated_workspaces() {
    let h = harness("printf 'rendered' > \"$OUT\"", Duration::from_secs(10));

    let a = h
        .orchestrator
        .execute(job(vec![by_reference("a.mp4")], "[0:v]null[v]", &[]));
    let b = h
        .orchestrator
        .execute(job(vec![by_reference("b.mp4")], "[0:v]null[v]", &[]));

    let (a, b) = tokio::join!(a, b);
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_workspace_root_empty(&h.workspace_root);
}
