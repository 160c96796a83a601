use crate::support::{
    init_tracing, load_config_or_exit, load_graph_or_exit, print_report, render_json_or_exit,
    report_payload, run_report_or_exit, story_root,
};

pub fn run(story: Option<String>, config: Option<String>, json_output: bool, debug: bool) {
    init_tracing(debug);
    let config = load_config_or_exit(config.as_deref());
    let root = story_root(&config, story);
    let graph = load_graph_or_exit(&root, &config);
    let report = run_report_or_exit(&graph, &config);

    if json_output {
        let mut payload = report_payload(&report);
        payload["storyRoot"] = root.display().to_string().into();
        println!("{}", render_json_or_exit(&payload, "story-check"));
    } else {
        print_report(&report);
    }

    if !report.accepted() {
        std::process::exit(1);
    }
}
