//! Per-group structural checks.
//!
//! Each check returns offending variants in graph order (groups by name,
//! variants in ingestion order).

use branchtale_story::{Group, StoryGraph, StoryNode};
use std::collections::BTreeSet;

fn variants_where<'g>(
    graph: &'g StoryGraph,
    keep: impl Fn(&Group, &StoryNode) -> bool,
) -> Vec<&'g StoryNode> {
    graph
        .groups()
        .flat_map(|group| group.variants.iter().map(move |node| (group, node)))
        .filter(|&(group, node)| keep(group, node))
        .map(|(_, node)| node)
        .collect()
}

pub fn starting_nodes(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, _| group.is_start)
}

pub fn ending_nodes(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, _| group.is_end)
}

pub fn start_end_nodes(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, _| group.is_start && group.is_end)
}

pub fn empty_nodes(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |_, node| node.text.trim().is_empty())
}

/// Variants repeating the text of an earlier variant anywhere in the story.
pub fn duplicate_nodes(graph: &StoryGraph) -> Vec<&StoryNode> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    graph
        .nodes()
        .filter(|node| !seen.insert(node.text.as_str()))
        .collect()
}

/// Non-ending variants with at least one choice naming a missing group.
pub fn invalid_links(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, node| {
        !group.is_end && node.choice_targets().any(|target| !graph.contains(target))
    })
}

pub fn dead_ends(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, node| !group.is_end && !node.has_choices())
}

pub fn continuing_ends(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, node| group.is_end && node.has_choices())
}

/// Variants without choices whose siblings do offer some.
pub fn noncontinuing_variants(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, node| group.any_choices() && !node.has_choices())
}

/// Variants that forbid revisiting while a sibling permits it.
pub fn revisit_variants(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, node| {
        let default = group.revisit_default;
        !node.revisit(default)
            && group
                .variants
                .iter()
                .any(|sibling| sibling.revisit(default))
    })
}

pub fn single_choice(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, node| !group.is_end && node.choices.len() == 1)
}

/// Non-ending variants offering two choices that lead to the same group.
pub fn duplicate_choices(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, node| {
        if group.is_end {
            return false;
        }
        let distinct: BTreeSet<&str> = node.choice_targets().collect();
        distinct.len() != node.choices.len()
    })
}

/// Variants of groups whose documents disagreed on `start` or `end`.
pub fn divergent_flags(graph: &StoryGraph) -> Vec<&StoryNode> {
    variants_where(graph, |group, _| group.divergent_flags)
}
