//! Reachability from declared start groups.

use branchtale_story::{StoryGraph, StoryNode};
use std::collections::BTreeSet;

/// Every variant never visited from any start variant.
///
/// Reaching a group reaches all of its variants. Traversal stops at ending
/// groups and skips links to missing groups. With no start groups every
/// variant is unreachable.
pub fn unreachable_nodes(graph: &StoryGraph) -> Vec<&StoryNode> {
    let mut stack: Vec<&StoryNode> = graph.start_nodes().collect();
    if stack.is_empty() {
        return graph.nodes().collect();
    }

    let mut visited: BTreeSet<&str> = BTreeSet::new();
    while let Some(node) = stack.pop() {
        if !visited.insert(node.source_id.as_str()) {
            continue;
        }
        if graph.is_end(&node.group) {
            continue;
        }
        for target in node.choice_targets() {
            if let Some(group) = graph.group(target) {
                stack.extend(group.variants.iter());
            }
        }
    }

    graph
        .nodes()
        .filter(|node| !visited.contains(node.source_id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::story;

    fn ids<'a>(nodes: &[&'a StoryNode]) -> Vec<&'a str> {
        nodes.iter().map(|node| node.source_id.as_str()).collect()
    }

    #[test]
    fn fully_linked_story_has_no_unreachable_nodes() {
        let graph = story(&[
            ("a.md", "---\nstart: true\nchoices:\n  go: b\n---\nA"),
            ("b.md", "---\nend: true\n---\nB"),
        ]);
        assert!(unreachable_nodes(&graph).is_empty());
    }

    #[test]
    fn no_start_groups_means_everything_is_unreachable() {
        let graph = story(&[
            ("a.md", "---\nchoices:\n  go: b\n---\nA"),
            ("b.md", "---\nend: true\n---\nB"),
        ]);
        assert_eq!(ids(&unreachable_nodes(&graph)), vec!["a.md", "b.md"]);
    }

    #[test]
    fn reaching_a_group_reaches_every_variant() {
        let graph = story(&[
            ("a.md", "---\nstart: true\nchoices:\n  go: hall\n---\nA"),
            ("hall/one.md", "---\nend: true\n---\nOne"),
            ("hall/two.md", "---\nend: true\n---\nTwo"),
        ]);
        assert!(unreachable_nodes(&graph).is_empty());
    }

    #[test]
    fn traversal_does_not_continue_past_endings() {
        let graph = story(&[
            ("a.md", "---\nstart: true\nchoices:\n  go: b\n---\nA"),
            ("b.md", "---\nend: true\nchoices:\n  epilogue: c\n---\nB"),
            ("c.md", "---\nend: true\n---\nC"),
        ]);
        assert_eq!(ids(&unreachable_nodes(&graph)), vec!["c.md"]);
    }

    #[test]
    fn dangling_links_are_skipped() {
        let graph = story(&[
            ("a.md", "---\nstart: true\nchoices:\n  go: nowhere\n  stay: b\n---\nA"),
            ("b.md", "---\nend: true\n---\nB"),
            ("island.md", "---\nend: true\n---\nIsland"),
        ]);
        assert_eq!(ids(&unreachable_nodes(&graph)), vec!["island.md"]);
    }
}
