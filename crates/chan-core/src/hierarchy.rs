//! Pure tree computations over rows fetched from a channel store
//!
//! "Depth" here is the number of nodes on the longest downward path that
//! starts at (and includes) a channel: a leaf has depth 1. Every structural
//! mutation keeps the depth of every top-level channel at or below
//! [`MAX_DEPTH`].

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::entities::{ChannelNode, ChannelType};
use crate::value_objects::Snowflake;

/// Longest allowed downward path, counted in nodes
pub const MAX_DEPTH: usize = 5;

/// How many levels below a node a descendant walk may go
pub const MAX_DESCENDANT_LEVELS: usize = MAX_DEPTH - 1;

/// Longest path through a new leaf created under a parent with
/// `parent_ascendants` ancestors
#[inline]
pub const fn leaf_depth_under(parent_ascendants: usize) -> usize {
    parent_ascendants + 2
}

/// Longest path through a subtree of height `subtree_depth` once attached
/// below `new_parent_ascendants`. `None` means the subtree moves to the root.
#[inline]
pub const fn reparented_depth(subtree_depth: usize, new_parent_ascendants: Option<usize>) -> usize {
    match new_parent_ascendants {
        Some(ascendants) => subtree_depth + ascendants + 1,
        None => subtree_depth,
    }
}

// ============================================================================
// Lineage
// ============================================================================

/// A node followed by its ancestors, nearest first
#[derive(Debug, Clone, Default)]
pub struct Lineage {
    nodes: Vec<ChannelNode>,
}

impl Lineage {
    /// Build from store rows; truncates at the first repeated id
    pub fn new(rows: Vec<ChannelNode>) -> Self {
        let mut seen = HashSet::new();
        let nodes = rows.into_iter().take_while(|n| seen.insert(n.id)).collect();
        Self { nodes }
    }

    /// The node the lineage was fetched for
    pub fn node(&self) -> Option<&ChannelNode> {
        self.nodes.first()
    }

    /// Ancestor ids from the immediate parent up to the root
    pub fn ascendant_ids(&self) -> Vec<Snowflake> {
        self.nodes.iter().skip(1).map(|n| n.id).collect()
    }

    pub fn ascendant_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn contains(&self, id: Snowflake) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Names root-first joined with `/`, ending with the node's own name
    pub fn path(&self) -> String {
        self.nodes
            .iter()
            .rev()
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

// ============================================================================
// Subtree
// ============================================================================

/// Active subtree below a root, as a parent -> children index
#[derive(Debug, Clone)]
pub struct Subtree {
    root: Snowflake,
    children: HashMap<Snowflake, Vec<Snowflake>>,
}

impl Subtree {
    /// Index the Active rows of `rows`; rows not connected to `root` are ignored
    /// by every traversal
    pub fn new(root: Snowflake, rows: &[ChannelNode]) -> Self {
        let mut children: HashMap<Snowflake, Vec<Snowflake>> = HashMap::new();
        for node in rows.iter().filter(|n| n.is_active() && n.id != root) {
            if let Some(parent) = node.parent_id {
                children.entry(parent).or_default().push(node.id);
            }
        }
        for ids in children.values_mut() {
            ids.sort_unstable();
        }
        Self { root, children }
    }

    pub fn root(&self) -> Snowflake {
        self.root
    }

    /// Breadth-first closure below the root, at most
    /// [`MAX_DESCENDANT_LEVELS`] levels deep
    pub fn descendant_ids(&self) -> Vec<Snowflake> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([self.root]);
        let mut queue = VecDeque::from([(self.root, 0usize)]);

        while let Some((id, level)) = queue.pop_front() {
            if level == MAX_DESCENDANT_LEVELS {
                continue;
            }
            for &child in self.children.get(&id).into_iter().flatten() {
                if seen.insert(child) {
                    out.push(child);
                    queue.push_back((child, level + 1));
                }
            }
        }
        out
    }

    pub fn contains(&self, id: Snowflake) -> bool {
        id == self.root || self.descendant_ids().contains(&id)
    }

    /// Longest downward path from the root, root included
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut seen = HashSet::from([self.root]);
        let mut frontier = vec![self.root];

        while depth < MAX_DEPTH + 1 {
            let next: Vec<_> = frontier
                .iter()
                .flat_map(|id| self.children.get(id).into_iter().flatten().copied())
                .filter(|id| seen.insert(*id))
                .collect();
            if next.is_empty() {
                break;
            }
            depth += 1;
            frontier = next;
        }
        depth
    }
}

// ============================================================================
// Forest verification
// ============================================================================

/// A broken structural invariant found by [`verify_forest`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForestViolation {
    #[error("channel {id} points at unknown parent {parent_id}")]
    DanglingParent { id: Snowflake, parent_id: Snowflake },

    #[error("channel {id} is part of a parent cycle")]
    Cycle { id: Snowflake },

    #[error("channel {id} has depth {depth}")]
    DepthExceeded { id: Snowflake, depth: usize },

    #[error("active channel {id} sits under archived parent {parent_id}")]
    ActiveUnderArchived { id: Snowflake, parent_id: Snowflake },

    #[error("non-public channel {id} is not top-level")]
    NonPublicNested { id: Snowflake },

    #[error("channel {id} has non-public parent {parent_id}")]
    NonPublicParent { id: Snowflake, parent_id: Snowflake },

    #[error("sibling name {name:?} is used {count} times under {parent_id:?}")]
    DuplicateName {
        parent_id: Option<Snowflake>,
        name: String,
        count: usize,
    },
}

/// Check every structural invariant over a full table dump
pub fn verify_forest(nodes: &[ChannelNode]) -> Vec<ForestViolation> {
    let by_id: HashMap<Snowflake, &ChannelNode> = nodes.iter().map(|n| (n.id, n)).collect();
    let mut violations = Vec::new();
    let mut names: HashMap<(Option<Snowflake>, String), usize> = HashMap::new();

    for node in nodes {
        if node.channel_type != ChannelType::Public && node.parent_id.is_some() {
            violations.push(ForestViolation::NonPublicNested { id: node.id });
        }
        if node.is_active() && node.channel_type == ChannelType::Public {
            *names
                .entry((node.parent_id, node.name.to_ascii_lowercase()))
                .or_default() += 1;
        }

        let Some(parent_id) = node.parent_id else {
            continue;
        };
        match by_id.get(&parent_id) {
            None => violations.push(ForestViolation::DanglingParent {
                id: node.id,
                parent_id,
            }),
            Some(parent) => {
                if parent.channel_type != ChannelType::Public {
                    violations.push(ForestViolation::NonPublicParent {
                        id: node.id,
                        parent_id,
                    });
                }
                if node.is_active() && !parent.is_active() {
                    violations.push(ForestViolation::ActiveUnderArchived {
                        id: node.id,
                        parent_id,
                    });
                }
            }
        }
    }

    // Walk up from every node; a walk longer than the table has a cycle.
    for node in nodes {
        let mut steps = 0usize;
        let mut current = node.parent_id;
        while let Some(id) = current {
            if id == node.id || steps > nodes.len() {
                violations.push(ForestViolation::Cycle { id: node.id });
                break;
            }
            steps += 1;
            current = by_id.get(&id).and_then(|n| n.parent_id);
        }
    }

    // Depth only makes sense on acyclic data, and the root's depth bounds
    // every node below it.
    if !violations.iter().any(|v| matches!(v, ForestViolation::Cycle { .. })) {
        for node in nodes.iter().filter(|n| n.parent_id.is_none() && n.is_active()) {
            let depth = full_depth(node.id, &by_id, nodes);
            if depth > MAX_DEPTH {
                violations.push(ForestViolation::DepthExceeded { id: node.id, depth });
            }
        }
    }

    let mut duplicates: Vec<_> = names.into_iter().filter(|(_, count)| *count > 1).collect();
    duplicates.sort_by(|a, b| a.0.cmp(&b.0));
    violations.extend(duplicates.into_iter().map(|((parent_id, name), count)| {
        ForestViolation::DuplicateName {
            parent_id,
            name,
            count,
        }
    }));

    violations
}

/// Unbounded depth over acyclic rows; only used for verification
fn full_depth(
    root: Snowflake,
    by_id: &HashMap<Snowflake, &ChannelNode>,
    nodes: &[ChannelNode],
) -> usize {
    let mut children: HashMap<Snowflake, Vec<Snowflake>> = HashMap::new();
    for node in nodes.iter().filter(|n| n.is_active()) {
        if let Some(parent) = node.parent_id.filter(|p| by_id.contains_key(p)) {
            children.entry(parent).or_default().push(node.id);
        }
    }

    let mut depth = 0;
    let mut frontier = vec![root];
    while !frontier.is_empty() {
        depth += 1;
        frontier = frontier
            .iter()
            .flat_map(|id| children.get(id).into_iter().flatten().copied())
            .collect();
    }
    depth
}
