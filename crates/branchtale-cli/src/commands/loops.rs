use crate::support::{
    init_tracing, load_config_or_exit, load_graph_or_exit, render_json_or_exit, story_root,
};
use branchtale_check::{Loop, classify_loops};
use serde_json::json;

const CHECK_KIND: &str = "branchtale.story_loops.v1";

pub fn run(story: Option<String>, config: Option<String>, json_output: bool, debug: bool) {
    init_tracing(debug);
    let config = load_config_or_exit(config.as_deref());
    let root = story_root(&config, story);
    let graph = load_graph_or_exit(&root, &config);

    let classification = classify_loops(&graph);
    let row = |escapable: bool, found: &Loop<'_>| {
        let source_ids: Vec<String> = found
            .nodes()
            .iter()
            .map(|node| node.source_id.clone())
            .collect();
        (escapable, found.canonical().to_vec(), source_ids)
    };
    let mut rows: Vec<(bool, Vec<String>, Vec<String>)> = classification
        .escapable
        .iter()
        .map(|found| row(true, found))
        .chain(classification.inescapable.iter().map(|found| row(false, found)))
        .collect();
    rows.sort_by(|a, b| a.1.cmp(&b.1));
    let escapable = rows.iter().filter(|(escapable, _, _)| *escapable).count();

    if json_output {
        let loops: Vec<_> = rows
            .iter()
            .map(|(escapable, groups, source_ids)| {
                json!({
                    "groups": groups,
                    "sourceIds": source_ids,
                    "escapable": escapable,
                })
            })
            .collect();
        let payload = json!({
            "schema": 1,
            "checkKind": CHECK_KIND,
            "storyRoot": root.display().to_string(),
            "loopCount": rows.len(),
            "escapableCount": escapable,
            "inescapableCount": rows.len() - escapable,
            "loops": loops,
        });
        println!("{}", render_json_or_exit(&payload, "story-loops"));
        return;
    }

    println!(
        "[story-loops] {} loops (escapable={}, inescapable={})",
        rows.len(),
        escapable,
        rows.len() - escapable
    );
    for (escapable, groups, _) in &rows {
        let tag = if *escapable { "ESCAPABLE" } else { "TRAPPED" };
        println!("  - {tag} {}", groups.join(" -> "));
    }
}
