//! Loop discovery, canonicalization, and escapability.
//!
//! Loops are found by depth-first search from every start variant. The
//! ancestor path is pushed and popped around each recursive call so that two
//! different routes into the same group are explored independently.
//!
//! A loop is identified by its canonical group-name sequence: the cycle body
//! rotated to its lexicographically smallest rotation, closed by repeating the
//! first name. A self-loop on `a` is `[a, a]`.

use branchtale_story::{StoryGraph, StoryNode};
use std::collections::BTreeSet;

/// Ancestor-length cutoff, as a multiple of the group count.
///
/// A loop closes as soon as a group repeats, so the ancestor path never
/// exceeds the group count and the cutoff stays a recursion guard.
pub const LOOP_DEPTH_FACTOR: usize = 2;

/// A closed walk through the story graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop<'g> {
    nodes: Vec<&'g StoryNode>,
    canonical: Vec<String>,
}

impl<'g> Loop<'g> {
    /// Extract the loop closed by the last node of `path`.
    ///
    /// Returns `None` when the last node's group does not occur earlier.
    pub fn from_path(path: &[&'g StoryNode]) -> Option<Self> {
        let (closing, ancestors) = path.split_last()?;
        let start = ancestors
            .iter()
            .position(|node| node.group == closing.group)?;
        let body = &ancestors[start..];

        let names: Vec<&str> = body.iter().map(|node| node.group.as_str()).collect();
        let rotation = min_rotation(&names);
        let mut nodes: Vec<&'g StoryNode> = body[rotation..]
            .iter()
            .chain(body[..rotation].iter())
            .copied()
            .collect();
        nodes.push(nodes[0]);

        Some(Self {
            canonical: canonical_cycle(&names),
            nodes,
        })
    }

    /// Nodes of the loop in canonical order; the last repeats the first.
    pub fn nodes(&self) -> &[&'g StoryNode] {
        &self.nodes
    }

    /// Canonical group-name sequence.
    pub fn canonical(&self) -> &[String] {
        &self.canonical
    }
}

/// Canonical closed form of a cycle body given as group names.
pub fn canonical_cycle(body: &[&str]) -> Vec<String> {
    if body.is_empty() {
        return Vec::new();
    }
    let rotation = min_rotation(body);
    let mut names: Vec<String> = body[rotation..]
        .iter()
        .chain(body[..rotation].iter())
        .map(|name| name.to_string())
        .collect();
    names.push(names[0].clone());
    names
}

/// Index of the lexicographically smallest rotation; first one on ties.
fn min_rotation(names: &[&str]) -> usize {
    let rotated = |i: usize| names[i..].iter().chain(names[..i].iter());
    (1..names.len()).fold(0, |best, candidate| {
        if rotated(candidate).lt(rotated(best)) {
            candidate
        } else {
            best
        }
    })
}

struct LoopWalker<'g> {
    graph: &'g StoryGraph,
    limit: usize,
    ancestors: Vec<&'g StoryNode>,
    seen: BTreeSet<Vec<String>>,
    loops: Vec<Loop<'g>>,
}

impl<'g> LoopWalker<'g> {
    fn visit(&mut self, node: &'g StoryNode) {
        if self.has_ancestor(&node.group) {
            self.ancestors.push(node);
            let found = Loop::from_path(&self.ancestors);
            self.ancestors.pop();
            if let Some(found) = found
                && self.seen.insert(found.canonical.clone())
            {
                self.loops.push(found);
            }
            return;
        }

        let Some(group) = self.graph.group(&node.group) else {
            return;
        };
        if group.is_end {
            return;
        }
        if self.ancestors.len() > self.limit {
            tracing::debug!(limit = self.limit, "loop search abandoned a deep branch");
            return;
        }

        // Pruning looks at ancestors before this node joins them.
        let expansions: Vec<_> = node
            .choice_targets()
            .filter_map(|target| self.graph.group(target))
            .filter(|target| target.revisit() || !self.has_ancestor(&target.name))
            .collect();

        self.ancestors.push(node);
        for target in expansions {
            for variant in &target.variants {
                self.visit(variant);
            }
        }
        self.ancestors.pop();
    }

    fn has_ancestor(&self, group: &str) -> bool {
        self.ancestors.iter().any(|ancestor| ancestor.group == group)
    }
}

/// Distinct loops reachable from the start groups, in discovery order.
pub fn find_loops(graph: &StoryGraph) -> Vec<Loop<'_>> {
    let mut walker = LoopWalker {
        graph,
        limit: LOOP_DEPTH_FACTOR * graph.len(),
        ancestors: Vec::new(),
        seen: BTreeSet::new(),
        loops: Vec::new(),
    };
    for node in graph.start_nodes() {
        walker.visit(node);
    }
    tracing::debug!(loops = walker.loops.len(), "loop search finished");
    walker.loops
}

/// Whether some node of the loop can still reach an ending group.
pub fn can_escape(graph: &StoryGraph, found: &Loop<'_>) -> bool {
    found.nodes().iter().any(|node| {
        let mut visited = BTreeSet::new();
        reaches_ending(graph, &node.group, &mut visited)
    })
}

fn reaches_ending<'g>(graph: &'g StoryGraph, name: &str, visited: &mut BTreeSet<&'g str>) -> bool {
    let Some(group) = graph.group(name) else {
        return false;
    };
    if group.is_end {
        return true;
    }
    if !visited.insert(group.name.as_str()) {
        return false;
    }
    group
        .variants
        .iter()
        .flat_map(|variant| variant.choice_targets())
        .any(|target| reaches_ending(graph, target, visited))
}

/// Loops split by escapability. Together they are exactly `find_loops`.
#[derive(Debug, Clone, Default)]
pub struct LoopClassification<'g> {
    pub escapable: Vec<Loop<'g>>,
    pub inescapable: Vec<Loop<'g>>,
}

pub fn classify_loops(graph: &StoryGraph) -> LoopClassification<'_> {
    let (escapable, inescapable): (Vec<_>, Vec<_>) = find_loops(graph)
        .into_iter()
        .partition(|found| can_escape(graph, found));
    LoopClassification {
        escapable,
        inescapable,
    }
}

pub fn escapable_loops(graph: &StoryGraph) -> Vec<Loop<'_>> {
    classify_loops(graph).escapable
}

/// Loops from which no ending can be reached: narrative traps.
pub fn inescapable_loops(graph: &StoryGraph) -> Vec<Loop<'_>> {
    classify_loops(graph).inescapable
}
