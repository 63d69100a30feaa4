//! Ancestor/descendant hierarchy derivation.
//!
//! # Responsibility
//! - Derive a `HierarchyNode` tree rooted at one person from the flat family
//!   edge list, for tree and fan charts.
//!
//! # Invariants
//! - Only positive (stored, role-bearing) edges are followed; every parental
//!   role is included.
//! - Children appear in the order their edges occur in the input.
//! - No deduplication: an ancestor reachable through several paths appears
//!   once per path, each node with `weight = 1`.
//! - A person already on the current path is emitted as a leaf, so malformed
//!   cyclic input terminates with depth bounded by the number of distinct ids.
//! - Expansion uses an explicit frame stack, not call-stack recursion.

use crate::model::person::{Person, PersonId};
use crate::model::relationship::RelationshipEdge;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Weight contributed by each node to proportional charts.
pub const NODE_WEIGHT: u32 = 1;

/// Traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HierarchyDirection {
    /// Follow edges from child to parent.
    Ancestor,
    /// Follow edges from parent to child.
    Descendant,
}

/// Derived chart node. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    pub person_id: PersonId,
    /// `None` when the id is not in the people directory.
    pub display_name: Option<String>,
    pub weight: u32,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    fn leaf(person_id: PersonId, display_name: Option<String>) -> Self {
        Self {
            person_id,
            display_name,
            weight: NODE_WEIGHT,
            children: Vec::new(),
        }
    }

    /// False when the person could not be found in the directory.
    pub fn is_resolved(&self) -> bool {
        self.display_name.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Ids of direct children, in output order.
    pub fn child_ids(&self) -> Vec<PersonId> {
        self.children.iter().map(|child| child.person_id).collect()
    }

    /// Total node count, root included.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }

    /// Sum of node weights in this subtree.
    pub fn total_weight(&self) -> u64 {
        let mut total = 0u64;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            total += u64::from(node.weight);
            pending.extend(node.children.iter());
        }
        total
    }

    /// Number of levels; a lone root has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1usize)];
        while let Some((node, level)) = pending.pop() {
            deepest = deepest.max(level);
            pending.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        deepest
    }
}

/// Indexed view over one family graph; reusable for many roots.
pub struct HierarchyBuilder {
    names: HashMap<PersonId, String>,
    parents_of: HashMap<PersonId, Vec<PersonId>>,
    children_of: HashMap<PersonId, Vec<PersonId>>,
}

struct Frame {
    node: HierarchyNode,
    pending: std::vec::IntoIter<PersonId>,
}

impl HierarchyBuilder {
    /// Indexes people and edges. Negative edges are ignored.
    pub fn new(people: &[Person], edges: &[RelationshipEdge]) -> Self {
        let names = people
            .iter()
            .map(|person| (person.id, person.display_name.clone()))
            .collect();

        let mut parents_of: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
        let mut children_of: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
        for edge in edges.iter().filter(|edge| edge.is_persistable()) {
            parents_of
                .entry(edge.related_person_id)
                .or_default()
                .push(edge.person_id);
            children_of
                .entry(edge.person_id)
                .or_default()
                .push(edge.related_person_id);
        }

        Self {
            names,
            parents_of,
            children_of,
        }
    }

    /// Builds the tree rooted at `root`.
    ///
    /// A root missing from the people directory is still expanded through
    /// its edges; only its `display_name` stays `None`.
    pub fn build(&self, root: PersonId, direction: HierarchyDirection) -> HierarchyNode {
        let mut on_path: HashSet<PersonId> = HashSet::from([root]);
        let mut stack = vec![self.open_frame(root, direction)];

        while let Some(frame) = stack.last_mut() {
            if let Some(next_id) = frame.pending.next() {
                if on_path.contains(&next_id) {
                    frame.node.children.push(HierarchyNode::leaf(
                        next_id,
                        self.display_name(next_id),
                    ));
                    continue;
                }
                on_path.insert(next_id);
                let child = self.open_frame(next_id, direction);
                stack.push(child);
                continue;
            }

            let Some(finished) = stack.pop() else {
                break;
            };
            on_path.remove(&finished.node.person_id);
            match stack.last_mut() {
                Some(parent) => parent.node.children.push(finished.node),
                None => return finished.node,
            }
        }

        HierarchyNode::leaf(root, self.display_name(root))
    }

    fn open_frame(&self, person_id: PersonId, direction: HierarchyDirection) -> Frame {
        let neighbours = match direction {
            HierarchyDirection::Ancestor => self.parents_of.get(&person_id),
            HierarchyDirection::Descendant => self.children_of.get(&person_id),
        };
        Frame {
            node: HierarchyNode::leaf(person_id, self.display_name(person_id)),
            pending: neighbours.cloned().unwrap_or_default().into_iter(),
        }
    }

    fn display_name(&self, person_id: PersonId) -> Option<String> {
        self.names.get(&person_id).cloned()
    }
}

/// One-shot convenience over `HierarchyBuilder`.
pub fn build_hierarchy(
    root: PersonId,
    direction: HierarchyDirection,
    people: &[Person],
    edges: &[RelationshipEdge],
) -> HierarchyNode {
    HierarchyBuilder::new(people, edges).build(root, direction)
}
