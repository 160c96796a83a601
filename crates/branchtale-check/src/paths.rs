//! Playthrough enumeration and pacing anomalies.
//!
//! A playthrough runs from a start variant to an ending group or to a group
//! whose variants have no valid choice. Paths are memoized on their exact
//! group-name sequence, so each distinct route is recorded once even when
//! several variants could fill the same position.

use branchtale_story::{StoryGraph, StoryNode};
use std::collections::BTreeSet;

/// Path-length cutoff, as a multiple of the group count.
pub const PATH_LENGTH_FACTOR: usize = 5;

/// Default allowed deviation from the mean playthrough length, in nodes.
pub const DEFAULT_PATH_DEVIATION: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playthrough<'g> {
    nodes: Vec<&'g StoryNode>,
}

impl<'g> Playthrough<'g> {
    pub fn nodes(&self) -> &[&'g StoryNode] {
        &self.nodes
    }

    /// Number of nodes visited.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn group_names(&self) -> Vec<&'g str> {
        self.nodes.iter().map(|node| node.group.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaythroughSearch<'g> {
    pub playthroughs: Vec<Playthrough<'g>>,
    pub cutoffs: usize,
}

struct PathWalker<'g> {
    graph: &'g StoryGraph,
    limit: usize,
    path: Vec<&'g StoryNode>,
    visited: BTreeSet<Vec<&'g str>>,
    search: PlaythroughSearch<'g>,
}

impl<'g> PathWalker<'g> {
    fn visit(&mut self, node: &'g StoryNode) {
        if self.path.len() > self.limit {
            self.search.cutoffs += 1;
            return;
        }

        self.path.push(node);
        let names: Vec<&'g str> = self.path.iter().map(|n| n.group.as_str()).collect();
        if self.visited.insert(names) {
            self.expand(node);
        }
        self.path.pop();
    }

    fn expand(&mut self, node: &'g StoryNode) {
        let graph = self.graph;
        let Some(group) = graph.group(&node.group) else {
            return;
        };

        let has_valid_choices = group
            .variants
            .iter()
            .any(|variant| variant.choice_targets().any(|target| graph.contains(target)));
        if group.is_end || !has_valid_choices {
            self.search.playthroughs.push(Playthrough {
                nodes: self.path.clone(),
            });
            return;
        }

        for variant in &group.variants {
            for target in variant.choice_targets() {
                let Some(next) = graph.group(target) else {
                    continue;
                };
                if !next.revisit() && self.path.iter().any(|n| n.group == next.name) {
                    continue;
                }
                for next_variant in &next.variants {
                    self.visit(next_variant);
                }
            }
        }
    }
}

/// Enumerate every playthrough from every start variant.
pub fn enumerate_playthroughs(graph: &StoryGraph) -> PlaythroughSearch<'_> {
    let mut walker = PathWalker {
        graph,
        limit: PATH_LENGTH_FACTOR * graph.len(),
        path: Vec::new(),
        visited: BTreeSet::new(),
        search: PlaythroughSearch::default(),
    };
    for start in graph.start_nodes() {
        walker.visit(start);
    }
    if walker.search.cutoffs > 0 {
        tracing::debug!(
            cutoffs = walker.search.cutoffs,
            limit = walker.limit,
            "playthrough search abandoned long branches"
        );
    }
    walker.search
}

pub fn playthroughs(graph: &StoryGraph) -> Vec<Playthrough<'_>> {
    enumerate_playthroughs(graph).playthroughs
}

/// Playthroughs more than one node longer or shorter than the mean.
pub fn abnormal_paths(graph: &StoryGraph) -> Vec<Playthrough<'_>> {
    abnormal_paths_with(graph, DEFAULT_PATH_DEVIATION)
}

pub fn abnormal_paths_with(graph: &StoryGraph, max_deviation: f64) -> Vec<Playthrough<'_>> {
    let all = playthroughs(graph);
    if all.is_empty() {
        return Vec::new();
    }

    let mean = all.iter().map(Playthrough::len).sum::<usize>() as f64 / all.len() as f64;
    all.into_iter()
        .filter(|path| (path.len() as f64 - mean).abs() > max_deviation)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::story;

    fn routes<'g>(paths: &[Playthrough<'g>]) -> Vec<Vec<&'g str>> {
        paths.iter().map(Playthrough::group_names).collect()
    }

    #[test]
    fn single_edge_story_has_one_playthrough_of_length_two() {
        let graph = story(&[
            ("a.md", "---\nstart: true\nchoices:\n  go: b\n---\nA"),
            ("b.md", "---\nend: true\n---\nB"),
        ]);

        let all = playthroughs(&graph);
        assert_eq!(routes(&all), vec![vec!["a", "b"]]);
        assert_eq!(all[0].len(), 2);
        assert!(abnormal_paths(&graph).is_empty());
    }

    #[test]
    fn self_loop_never_completes_and_is_cut_off() {
        let graph = story(&[("a.md", "---\nstart: true\nchoices:\n  again: a\n---\nA")]);

        let search = enumerate_playthroughs(&graph);
        assert!(search.playthroughs.is_empty());
        assert!(search.cutoffs > 0);
        assert!(abnormal_paths(&graph).is_empty());
    }

    #[test]
    fn equal_length_playthroughs_are_not_abnormal() {
        let graph = story(&[
            ("a.md", "---\nstart: true\nchoices:\n  left: b\n  right: c\n---\nA"),
            ("b.md", "---\nchoices:\n  on: z\n---\nB"),
            ("c.md", "---\nchoices:\n  on: z\n---\nC"),
            ("z.md", "---\nend: true\n---\nZ"),
        ]);
        assert_eq!(playthroughs(&graph).len(), 2);
        assert!(abnormal_paths(&graph).is_empty());
    }

    #[test]
    fn outlier_lengths_are_reported() {
        // Three routes of length 2 and one of length 6: mean 3, so only the long one deviates.
        let graph = story(&[
            (
                "a.md",
                "---\nstart: true\nchoices:\n  x: end1\n  y: end2\n  z: end3\n  long: b\n---\nA",
            ),
            ("b.md", "---\nchoices:\n  on: c\n---\nB"),
            ("c.md", "---\nchoices:\n  on: d\n---\nC"),
            ("d.md", "---\nchoices:\n  on: e\n---\nD"),
            ("e.md", "---\nchoices:\n  on: end1\n---\nE"),
            ("end1.md", "---\nend: true\n---\nOne"),
            ("end2.md", "---\nend: true\n---\nTwo"),
            ("end3.md", "---\nend: true\n---\nThree"),
        ]);

        let abnormal = abnormal_paths(&graph);
        assert_eq!(
            routes(&abnormal),
            vec![vec!["a", "b", "c", "d", "e", "end1"]]
        );
    }

    #[test]
    fn deviation_bound_controls_which_paths_are_reported() {
        // Lengths 2, 2 and 4: mean 8/3.
        let graph = story(&[
            ("a.md", "---\nstart: true\nchoices:\n  x: end1\n  y: end2\n  long: b\n---\nA"),
            ("b.md", "---\nchoices:\n  on: c\n---\nB"),
            ("c.md", "---\nchoices:\n  on: end1\n---\nC"),
            ("end1.md", "---\nend: true\n---\nOne"),
            ("end2.md", "---\nend: true\n---\nTwo"),
        ]);
        let lengths = |max_deviation: f64| {
            let mut lengths: Vec<usize> = abnormal_paths_with(&graph, max_deviation)
                .iter()
                .map(Playthrough::len)
                .collect();
            lengths.sort_unstable();
            lengths
        };

        assert_eq!(lengths(DEFAULT_PATH_DEVIATION), vec![4]);
        assert_eq!(lengths(0.5), vec![2, 2, 4]);
        assert!(lengths(2.0).is_empty());
    }

    #[test]
    fn dead_end_terminates_a_playthrough() {
        let graph = story(&[
            ("a.md", "---\nstart: true\nchoices:\n  go: b\n  lost: nowhere\n---\nA"),
            ("b.md", "B with no choices"),
        ]);
        assert_eq!(routes(&playthroughs(&graph)), vec![vec!["a", "b"]]);
    }

    #[test]
    fn variants_at_one_position_are_explored_once() {
        let graph = story(&[
            ("a.md", "---\nstart: true\nchoices:\n  go: hall\n---\nA"),
            ("hall/one.md", "---\nend: true\n---\nOne"),
            ("hall/two.md", "---\nend: true\n---\nTwo"),
        ]);
        let all = playthroughs(&graph);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].nodes()[1].source_id, "hall/one.md");
    }

    #[test]
    fn non_revisitable_groups_are_not_reentered() {
        let graph = story(&[
            ("a.md", "---\nstart: true\nrevisit: false\nchoices:\n  go: b\n---\nA"),
            ("b.md", "---\nchoices:\n  back: a\n  on: z\n---\nB"),
            ("z.md", "---\nend: true\n---\nZ"),
        ]);
        assert_eq!(routes(&playthroughs(&graph)), vec![vec!["a", "b", "z"]]);
    }
}
