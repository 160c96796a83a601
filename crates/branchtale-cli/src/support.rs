use crate::config::Config;
use branchtale_check::{CheckContext, CheckStatus, MarkerValidator, StoryReport, check_story};
use branchtale_story::{CorpusError, DirectoryCorpus, StoryGraph};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "BRANCHTALE_LOG";

/// Install the stderr subscriber. `--debug` wins over `BRANCHTALE_LOG`.
pub fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config_or_exit(path: Option<&str>) -> Config {
    Config::load(path.map(Path::new)).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

pub fn story_root(config: &Config, story: Option<String>) -> PathBuf {
    story.map(PathBuf::from).unwrap_or_else(|| config.story.root.clone())
}

/// Build the graph, exiting 2 on I/O errors and 1 on a missing or empty corpus.
pub fn load_graph_or_exit(root: &Path, config: &Config) -> StoryGraph {
    let corpus = DirectoryCorpus::new(root);
    let graph = match StoryGraph::build(&corpus, config.graph_options()) {
        Ok(graph) => graph,
        Err(CorpusError::MissingRoot(_)) => StoryGraph::default(),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };
    if graph.is_empty() {
        eprintln!("error: could not locate any story parts under {}", root.display());
        std::process::exit(1);
    }
    graph
}

pub fn marker_validator_or_exit(config: &Config) -> MarkerValidator {
    config.marker_validator().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

/// Run the configured checks over `graph`.
pub fn run_report_or_exit(graph: &StoryGraph, config: &Config) -> StoryReport {
    let markers = marker_validator_or_exit(config);
    let context = CheckContext::new(graph, &markers)
        .with_path_deviation(config.thresholds.path_deviation);
    check_story(&context, &config.checks).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    })
}

pub fn render_json_or_exit(payload: &serde_json::Value, what: &str) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|e| {
        eprintln!("error: failed to render {what} payload: {e}");
        std::process::exit(2);
    })
}

pub fn report_payload(report: &StoryReport) -> serde_json::Value {
    serde_json::json!({
        "schema": 1,
        "checkKind": report.check_kind,
        "result": report.result,
        "summary": report.summary,
        "checks": report.checks,
    })
}

pub fn print_report(report: &StoryReport) {
    let summary = &report.summary;
    println!(
        "[story-check] {} (groups={}, variants={}, failures={}, warnings={})",
        if report.accepted() { "OK" } else { "FAIL" },
        summary.group_count,
        summary.variant_count,
        summary.failure_count,
        summary.warning_count
    );

    let total = report.checks.len();
    let width = total.to_string().len();
    let name_width = report
        .checks
        .iter()
        .map(|outcome| outcome.name.len())
        .max()
        .unwrap_or(0);
    for (index, outcome) in report.checks.iter().enumerate() {
        let marker = match outcome.status {
            CheckStatus::Pass => "OK  ",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "SKIP",
        };
        println!(
            "{marker}  {:>width$}/{total} {:<name_width$} - {}",
            index + 1,
            outcome.name,
            outcome.label
        );
        if matches!(outcome.status, CheckStatus::Warn | CheckStatus::Fail) {
            for offender in &outcome.offenders {
                println!("      - {}", offender.describe());
            }
        }
    }
}
