//! Canonical in-memory narrative graph.
//!
//! Groups are keyed by name in a `BTreeMap` so every traversal sees the same
//! order. Variants keep corpus enumeration order.

use crate::corpus::{Corpus, CorpusError, SourceDocument};
use crate::frontmatter::{parse_metadata, split_front_matter};
use crate::metadata::NodeMetadata;
use crate::node::{Group, StoryNode};
use serde_yaml::Mapping;
use std::collections::BTreeMap;

/// Options applied while building a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphOptions {
    /// Revisit policy for variants that do not declare `revisit`.
    pub revisit_default: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            revisit_default: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoryGraph {
    groups: BTreeMap<String, Group>,
    /// Declared `start`/`end` values seen so far per group, used for divergence tracking.
    declared: BTreeMap<String, DeclaredFlags>,
}

#[derive(Debug, Clone, Copy, Default)]
struct DeclaredFlags {
    start: Option<bool>,
    end: Option<bool>,
}

impl StoryGraph {
    /// Build a graph from every document in `corpus`.
    pub fn build(corpus: &impl Corpus, options: GraphOptions) -> Result<Self, CorpusError> {
        Ok(Self::from_documents(corpus.documents()?, options))
    }

    /// Build a graph from already-enumerated documents.
    ///
    /// Malformed metadata never fails the build: the document keeps its prose
    /// and the bad fields default.
    pub fn from_documents(documents: Vec<SourceDocument>, options: GraphOptions) -> Self {
        let mut graph = Self::default();
        for document in documents {
            graph.ingest(document, options);
        }
        graph
    }

    fn ingest(&mut self, document: SourceDocument, options: GraphOptions) {
        let (mapping, body) = match split_front_matter(&document.raw) {
            Ok(split) => {
                let mapping = match split.yaml.map(parse_metadata).transpose() {
                    Ok(mapping) => mapping.unwrap_or_default(),
                    Err(error) => {
                        tracing::warn!(
                            source = %document.source_id,
                            %error,
                            "ignoring unreadable metadata"
                        );
                        Mapping::new()
                    }
                };
                (mapping, split.body)
            }
            Err(error) => {
                tracing::warn!(source = %document.source_id, %error, "treating document as prose");
                (Mapping::new(), document.raw.trim().to_string())
            }
        };

        let metadata = NodeMetadata::from_mapping(&mapping);
        for problem in &metadata.problems {
            tracing::warn!(source = %document.source_id, "{problem}");
        }

        let node = StoryNode {
            source_id: document.source_id,
            group: document.group,
            text: body,
            choices: metadata.choices,
            pace: metadata.pace,
            colour: metadata.colour,
            effect: metadata.effect,
            pov: metadata.pov,
            message_pov: metadata.message_pov,
            message_title: metadata.message_title,
            revisit_override: metadata.revisit,
        };
        self.insert(node, metadata.start, metadata.end, options);
    }

    /// Append a variant to its group, creating the group on first sight.
    ///
    /// Declared `start`/`end` values follow last-declared-wins; a declaration
    /// that contradicts an earlier one marks the group as divergent.
    pub fn insert(
        &mut self,
        node: StoryNode,
        start: Option<bool>,
        end: Option<bool>,
        options: GraphOptions,
    ) {
        let name = node.group.clone();
        let group = self
            .groups
            .entry(name.clone())
            .or_insert_with(|| Group::new(name.clone(), options.revisit_default));
        let declared = self.declared.entry(name.clone()).or_default();

        for (incoming, seen, current) in [
            (start, &mut declared.start, &mut group.is_start),
            (end, &mut declared.end, &mut group.is_end),
        ] {
            let Some(value) = incoming else { continue };
            if seen.is_some_and(|previous| previous != value) {
                group.divergent_flags = true;
            }
            *seen = Some(value);
            *current = value;
        }

        tracing::debug!(source = %node.source_id, group = %name, "added story variant");
        group.variants.push(node);
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// Every variant, grouped, in name order then corpus order.
    pub fn nodes(&self) -> impl Iterator<Item = &StoryNode> {
        self.groups.values().flat_map(|group| group.variants.iter())
    }

    pub fn start_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups().filter(|group| group.is_start)
    }

    pub fn end_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups().filter(|group| group.is_end)
    }

    /// Every variant of every start group.
    pub fn start_nodes(&self) -> impl Iterator<Item = &StoryNode> {
        self.start_groups()
            .flat_map(|group| group.variants.iter())
    }

    /// Whether the named group exists and is an ending.
    pub fn is_end(&self, name: &str) -> bool {
        self.group(name).is_some_and(|group| group.is_end)
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of variants across all groups.
    pub fn node_count(&self) -> usize {
        self.groups.values().map(|group| group.variants.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::MemoryCorpus;

    fn build(corpus: MemoryCorpus) -> StoryGraph {
        StoryGraph::build(&corpus, GraphOptions::default()).expect("memory corpus never fails")
    }

    #[test]
    fn builds_groups_from_documents() {
        let graph = build(
            MemoryCorpus::new()
                .with_document("a.md", "---\nstart: true\nchoices:\n  go: b\n---\nHello")
                .with_document("b.md", "---\nend: true\n---\nBye"),
        );

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.node_count(), 2);
        let a = graph.group("a").expect("group a");
        assert!(a.is_start);
        assert!(!a.is_end);
        assert_eq!(a.variants[0].text, "Hello");
        assert_eq!(a.variants[0].choices["go"], "b");
        assert!(graph.is_end("b"));
        assert_eq!(graph.start_nodes().count(), 1);
        assert_eq!(graph.end_groups().map(|g| g.name.as_str()).collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn co_located_variants_merge_into_one_group() {
        let graph = build(
            MemoryCorpus::new()
                .with_document("hall/one.md", "---\nrevisit: true\n---\nOne")
                .with_document("hall/two.md", "---\nrevisit: false\n---\nTwo"),
        );

        let hall = graph.group("hall").expect("group hall");
        assert_eq!(hall.variants.len(), 2);
        assert!(!hall.revisit());
        assert_eq!(hall.variants[1].source_id, "hall/two.md");
    }

    #[test]
    fn revisit_holds_when_every_variant_allows_it() {
        let graph = build(
            MemoryCorpus::new()
                .with_document("hall/one.md", "---\nrevisit: true\n---\nOne")
                .with_document("hall/two.md", "Two"),
        );
        assert!(graph.group("hall").expect("group hall").revisit());
    }

    #[test]
    fn divergent_declarations_use_last_value_and_are_recorded() {
        let graph = build(
            MemoryCorpus::new()
                .with_document("gate/a.md", "---\nend: false\n---\nA")
                .with_document("gate/b.md", "---\nend: true\n---\nB"),
        );

        let gate = graph.group("gate").expect("group gate");
        assert!(gate.is_end);
        assert!(gate.divergent_flags);
    }

    #[test]
    fn undeclared_flags_are_not_divergent() {
        let graph = build(
            MemoryCorpus::new()
                .with_document("gate/a.md", "---\nstart: true\n---\nA")
                .with_document("gate/b.md", "B"),
        );

        let gate = graph.group("gate").expect("group gate");
        assert!(gate.is_start);
        assert!(!gate.divergent_flags);
    }

    #[test]
    fn malformed_metadata_defaults_instead_of_failing() {
        let graph = build(
            MemoryCorpus::new()
                .with_document("a.md", "---\nchoices: [oops\n---\nStill here")
                .with_document("b.md", "---\nstart: true\nunterminated"),
        );

        let a = graph.group("a").expect("group a");
        assert!(a.variants[0].choices.is_empty());
        assert_eq!(a.variants[0].text, "Still here");
        let b = graph.group("b").expect("group b");
        assert!(!b.is_start);
        assert_eq!(b.variants[0].text, "---\nstart: true\nunterminated");
    }

    #[test]
    fn group_default_applies_to_undeclared_variants() {
        let corpus = MemoryCorpus::new().with_document("loop.md", "Around again");
        let graph = StoryGraph::build(
            &corpus,
            GraphOptions {
                revisit_default: false,
            },
        )
        .expect("memory corpus never fails");
        assert!(!graph.group("loop").expect("group loop").revisit());
    }
}
