use crate::support::{
    init_tracing, load_config_or_exit, load_graph_or_exit, print_report, render_json_or_exit,
    report_payload, run_report_or_exit, story_root,
};
use branchtale_story::write_document;
use serde_json::json;
use std::path::PathBuf;

pub fn run(
    story: Option<String>,
    out: Option<String>,
    config: Option<String>,
    json_output: bool,
    debug: bool,
) {
    init_tracing(debug);
    let config = load_config_or_exit(config.as_deref());
    let root = story_root(&config, story);
    let out = out
        .map(PathBuf::from)
        .unwrap_or_else(|| config.story.output.clone());
    let graph = load_graph_or_exit(&root, &config);
    let report = run_report_or_exit(&graph, &config);

    if !report.accepted() {
        if json_output {
            let mut payload = report_payload(&report);
            payload["storyRoot"] = root.display().to_string().into();
            payload["output"] = serde_json::Value::Null;
            println!("{}", render_json_or_exit(&payload, "story-build"));
        } else {
            print_report(&report);
            println!("[story-build] FAIL could not generate story, fix and rerun");
        }
        std::process::exit(1);
    }

    let summary = write_document(&out, &graph).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    });
    tracing::info!(path = %summary.path.display(), "story document written");

    if json_output {
        let mut payload = report_payload(&report);
        payload["storyRoot"] = root.display().to_string().into();
        payload["output"] = json!({
            "path": summary.path.display().to_string(),
            "sha256": summary.digest,
            "bytes": summary.bytes,
        });
        println!("{}", render_json_or_exit(&payload, "story-build"));
    } else {
        print_report(&report);
        println!(
            "[story-build] OK wrote {} (sha256={}, bytes={})",
            summary.path.display(),
            summary.digest,
            summary.bytes
        );
    }
}
