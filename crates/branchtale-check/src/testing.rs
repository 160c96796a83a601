//! Fixture helpers shared by the analyzer tests.

use branchtale_story::{GraphOptions, MemoryCorpus, StoryGraph};

/// Build a graph from `(source_id, document)` pairs.
pub(crate) fn story(documents: &[(&str, &str)]) -> StoryGraph {
    let corpus = documents
        .iter()
        .fold(MemoryCorpus::new(), |corpus, (id, raw)| {
            corpus.with_document(id, raw)
        });
    StoryGraph::build(&corpus, GraphOptions::default()).expect("memory corpus never fails")
}
