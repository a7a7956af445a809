//! End-to-end table runs against an in-memory completion backend.
//!
//! Each test writes an input table into a temporary directory, runs a full
//! session and checks the written output plus the returned report.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{ConfigBuilder, RecordingProgress, ScriptedCompleter, TableBuilder, TestHarness};
use paperlens::error::CompletionError;
use paperlens::pipeline::ProgressEvent;
use paperlens::{CompletionResult, RowSource, RunState};

/// Title the prompt was rendered for (prompt is "Classify {title}").
fn title_of(prompt: &str) -> &str {
    prompt.strip_prefix("Classify ").unwrap_or(prompt)
}

fn reply(text: impl Into<String>) -> Result<CompletionResult, CompletionError> {
    Ok(CompletionResult {
        text: text.into(),
        tokens: 12,
    })
}

/// Classifies even papers as "vision" and odd ones as "nlp".
fn classifier() -> ScriptedCompleter {
    ScriptedCompleter::new(|prompt| {
        let title = title_of(prompt);
        let n: usize = title
            .rsplit(' ')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let category = if n % 2 == 0 { "vision" } else { "nlp" };
        reply(format!(
            "```json\n{{\"title\": \"{}\", \"category\": \"{}\"}}\n```",
            title, category
        ))
    })
}

#[test]
fn test_csv_to_csv_run() {
    let harness = TestHarness::new();
    let table = TableBuilder::new(&["title", "abstract", "method"]).numbered_papers(20);
    harness.write_input("papers.csv", &table.to_csv());

    let config = harness.localize(
        ConfigBuilder::new()
            .output_columns("title,category,method")
            .sort_by_row(true)
            .build(),
        "papers.csv",
        "report.csv",
    );

    let report = harness
        .run_quiet(&config, Arc::new(classifier()))
        .unwrap();

    assert_eq!(report.total_rows, 20);
    assert_eq!(report.succeeded, 20);
    assert_eq!(report.failed, 0);
    assert!(!report.cancelled);
    assert_eq!(report.usage.total_tokens, 20 * 12);

    let rows = harness.read_csv(&harness.output_path("report.csv"));
    assert_eq!(rows.len(), 21);
    assert_eq!(rows[0], vec!["title", "category", "method"]);
    assert_eq!(rows[1], vec!["paper 0", "vision", ""]);
    assert_eq!(rows[4], vec!["paper 3", "nlp", ""]);
}

#[test]
fn test_missing_json_keys_fall_back_to_input_columns() {
    let harness = TestHarness::new();
    let table = TableBuilder::new(&["title", "method"])
        .row(&["Deep Nets", "CNN"])
        .row(&["Transformers", "Attention"]);
    harness.write_input("papers.csv", &table.to_csv());

    let config = harness.localize(
        ConfigBuilder::new()
            .output_columns("title,method,team")
            .sort_by_row(true)
            .build(),
        "papers.csv",
        "report.csv",
    );
    let completer = ScriptedCompleter::constant(r#"{"team": "Lab A", "method": null}"#, 5);

    harness.run_quiet(&config, Arc::new(completer)).unwrap();

    let rows = harness.read_csv(&harness.output_path("report.csv"));
    assert_eq!(
        rows,
        vec![
            vec!["title", "method", "team"],
            vec!["Deep Nets", "CNN", "Lab A"],
            vec!["Transformers", "Attention", "Lab A"],
        ]
    );
}

#[test]
fn test_skipped_and_failed_rows_are_left_out() {
    let harness = TestHarness::new();
    let table = TableBuilder::new(&["title"])
        .row(&["good"])
        .row(&["empty"])
        .row(&["garbage"])
        .row(&["offline"])
        .row(&[""])
        .row(&["also good"]);
    harness.write_input("papers.csv", &table.to_csv());

    let config = harness.localize(
        ConfigBuilder::new()
            .output_columns("title,verdict")
            .failures_file("failures.csv")
            .sort_by_row(true)
            .build(),
        "papers.csv",
        "report.csv",
    );
    let completer = ScriptedCompleter::new(|prompt| match title_of(prompt) {
        "empty" => reply(""),
        "garbage" => reply("Sorry, I can only answer in prose."),
        "offline" => Err(CompletionError::Connect("connection refused".to_string())),
        title => reply(format!(r#"{{"verdict": "ok {}"}}"#, title)),
    });

    let report = harness.run_quiet(&config, Arc::new(completer)).unwrap();

    // The blank row never reaches the pipeline.
    assert_eq!(report.total_rows, 5);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 2);

    let rows = harness.read_csv(&harness.output_path("report.csv"));
    assert_eq!(
        rows,
        vec![
            vec!["title", "verdict"],
            vec!["good", "ok good"],
            vec!["also good", "ok also good"],
        ]
    );

    let failures = harness.read_csv(&harness.output_path("failures.csv"));
    assert_eq!(failures[0], vec!["row", "title", "error", "raw_response"]);
    assert_eq!(failures.len(), 3);
    assert!(failures
        .iter()
        .any(|r| r[1] == "garbage" && r[3].contains("only answer in prose")));
    assert!(failures
        .iter()
        .any(|r| r[1] == "offline" && r[2].contains("connection refused")));
}

#[test]
fn test_no_failures_file_when_everything_succeeds() {
    let harness = TestHarness::new();
    harness.write_input(
        "papers.csv",
        &TableBuilder::new(&["title"]).numbered_papers(3).to_csv(),
    );

    let config = harness.localize(
        ConfigBuilder::new().failures_file("failures.csv").build(),
        "papers.csv",
        "report.csv",
    );

    harness.run_quiet(&config, Arc::new(classifier())).unwrap();

    assert!(harness.output_path("report.csv").exists());
    assert!(!harness.output_path("failures.csv").exists());
}

#[test]
fn test_columns_default_to_union_of_answer_keys() {
    let harness = TestHarness::new();
    harness.write_input(
        "papers.csv",
        &TableBuilder::new(&["title"]).row(&["a"]).to_csv(),
    );

    let config = harness.localize(ConfigBuilder::new().build(), "papers.csv", "report.csv");
    let completer = ScriptedCompleter::constant(
        r#"{"category": "ml", "authors": ["x", "y"], "score": 4}"#,
        1,
    );

    harness.run_quiet(&config, Arc::new(completer)).unwrap();

    let rows = harness.read_csv(&harness.output_path("report.csv"));
    assert_eq!(rows[0], vec!["category", "authors", "score"]);
    assert_eq!(rows[1], vec!["ml", r#"["x","y"]"#, "4"]);
}

#[test]
fn test_xlsx_output() {
    let harness = TestHarness::new();
    harness.write_input(
        "papers.csv",
        &TableBuilder::new(&["title"]).numbered_papers(5).to_csv(),
    );

    let config = harness.localize(
        ConfigBuilder::new()
            .output_columns("title,category")
            .sort_by_row(true)
            .build(),
        "papers.csv",
        "report.xlsx",
    );

    harness.run_quiet(&config, Arc::new(classifier())).unwrap();

    let source = RowSource::open_path(harness.output_path("report.xlsx")).unwrap();
    assert_eq!(source.columns(), &["title".to_string(), "category".to_string()][..]);
    let records: Vec<_> = source.map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 5);
    assert_eq!(records[2].get("title"), Some("paper 2"));
    assert_eq!(records[2].get("category"), Some("vision"));
}

#[test]
fn test_unmatched_placeholders_are_reported_and_kept() {
    let harness = TestHarness::new();
    harness.write_input(
        "papers.csv",
        &TableBuilder::new(&["title"]).row(&["Graph Nets"]).to_csv(),
    );

    let config = harness.localize(
        ConfigBuilder::new()
            .prompt("Classify {title} from {venue}")
            .build(),
        "papers.csv",
        "report.csv",
    );
    let prompts = Arc::new(std::sync::Mutex::new(Vec::new()));
    let seen = Arc::clone(&prompts);
    let completer = ScriptedCompleter::new(move |prompt| {
        seen.lock().unwrap().push(prompt.to_string());
        reply(r#"{"ok": true}"#)
    });
    let progress = Arc::new(RecordingProgress::default());

    harness
        .run(&config, Arc::new(completer), RunState::new(), progress.clone())
        .unwrap();

    assert_eq!(
        prompts.lock().unwrap().as_slice(),
        ["Classify Graph Nets from {venue}".to_string()]
    );
    assert!(progress
        .log_messages()
        .iter()
        .any(|m| m.contains("placeholders") && m.contains("venue")));
}

#[test]
fn test_empty_table_writes_header_only() {
    let harness = TestHarness::new();
    harness.write_input("papers.csv", "title,abstract\n");

    let config = harness.localize(
        ConfigBuilder::new().output_columns("title,category").build(),
        "papers.csv",
        "report.csv",
    );
    let completer = Arc::new(classifier());

    let report = harness.run_quiet(&config, completer.clone()).unwrap();

    assert_eq!(report.total_rows, 0);
    assert_eq!(completer.calls(), 0);
    let rows = harness.read_csv(&harness.output_path("report.csv"));
    assert_eq!(rows, vec![vec!["title", "category"]]);
}

#[test]
fn test_missing_input_is_fatal() {
    let harness = TestHarness::new();
    let config = harness.localize(ConfigBuilder::new().build(), "absent.csv", "report.csv");
    let completer = Arc::new(classifier());

    let err = harness.run_quiet(&config, completer.clone()).unwrap_err();

    assert!(err.to_string().contains("absent.csv"), "got: {}", err);
    assert_eq!(completer.calls(), 0);
    assert!(!harness.output_path("report.csv").exists());
}

#[test]
fn test_cancellation_returns_partial_results() {
    const ROWS: usize = 100;
    const WORKERS: usize = 8;

    let harness = TestHarness::new();
    harness.write_input(
        "papers.csv",
        &TableBuilder::new(&["title"]).numbered_papers(ROWS).to_csv(),
    );
    let config = harness.localize(
        ConfigBuilder::new().max_workers(WORKERS).build(),
        "papers.csv",
        "report.csv",
    );

    let completer = Arc::new(classifier().with_latency(Duration::from_millis(50)));
    let state = RunState::new();

    let canceller = {
        let completer = Arc::clone(&completer);
        let state = state.clone();
        thread::spawn(move || {
            while completer.returned() < 2 * WORKERS {
                thread::sleep(Duration::from_millis(5));
            }
            thread::sleep(Duration::from_millis(20));
            state.cancel();
        })
    };

    let started = Instant::now();
    let report = harness
        .run(
            &config,
            completer.clone(),
            state,
            Arc::new(RecordingProgress::default()),
        )
        .unwrap();
    let elapsed = started.elapsed();
    canceller.join().unwrap();

    assert!(report.cancelled);
    assert!(report.processed() <= ROWS);
    assert!(report.processed() >= WORKERS, "only {} landed", report.processed());
    assert!(report.processed() <= completer.returned());
    assert!(report.unfinished() > 0);
    // 100 rows at 50ms over 8 workers take well over half a second.
    assert!(elapsed < Duration::from_secs(5));

    let mut rows: Vec<usize> = report.outcomes.iter().map(|o| o.row_index()).collect();
    rows.sort_unstable();
    rows.dedup();
    assert_eq!(rows.len(), report.processed());

    // Landed rows are still written.
    let written = harness.read_csv(&harness.output_path("report.csv"));
    assert_eq!(written.len(), report.succeeded + 1);
}

#[test]
fn test_progress_reports_reach_completion() {
    let harness = TestHarness::new();
    harness.write_input(
        "papers.csv",
        &TableBuilder::new(&["title"]).numbered_papers(25).to_csv(),
    );
    let config = harness.localize(
        ConfigBuilder::new().monitor_enabled(true).build(),
        "papers.csv",
        "report.csv",
    );
    let progress = Arc::new(RecordingProgress::default());

    harness
        .run(&config, Arc::new(classifier()), RunState::new(), progress.clone())
        .unwrap();

    let events = progress.events.lock().unwrap();
    let completed: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Progress(update) => Some(update.completed),
            _ => None,
        })
        .collect();
    assert_eq!(completed, vec![10, 20, 25]);
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::Usage { .. })));
}
