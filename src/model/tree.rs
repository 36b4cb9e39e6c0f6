//! Decision tree of a single HMM state.
//!
//! Provides [Tree], an arena of [Node]s referenced by [NodeIndex], and
//! traversal helpers. Trees are built with a
//! [TreeBuilder](crate::model::TreeBuilder) and never change afterwards;
//! searching is implemented in [crate::search].

use crate::model::node::{Child, LeafId, Node, NodeIndex};

// =$========================================================================$=
// TREE
// =$========================================================================$=
/// A binary decision tree using the arena pattern on [Node].
///
/// # Structure
/// - All internal nodes are stored in the arena, terminals are stored inline
///   as [Child::Leaf] in their parent.
/// - The root is the node with id `0`, stored at index `0`.
/// - A tree without node lines has no root; searching it yields no leaf.
/// - A node may be the child of several parents (shared subtree), but the
///   node graph is acyclic.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// HMM state this tree belongs to
    state: usize,

    /// Nodes of this tree (arena pattern)
    nodes: Vec<Node>,

    /// Index of the root, `None` for an empty tree
    root: Option<NodeIndex>,
}

// ============================================================================
// New, Getters / Accessors, etc. (pub)
// ============================================================================
impl Tree {
    /// Creates a tree without nodes.
    pub fn empty(state: usize) -> Self {
        Tree {
            state,
            nodes: Vec::new(),
            root: None,
        }
    }

    pub(crate) fn from_parts(state: usize, nodes: Vec<Node>, root: NodeIndex) -> Self {
        Tree {
            state,
            nodes,
            root: Some(root),
        }
    }

    /// HMM state of this tree, as given by its `{*}[state]` header.
    pub fn state(&self) -> usize {
        self.state
    }

    /// Returns whether the tree has no root.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the root node, or `None` for an empty tree.
    pub fn root(&self) -> Option<&Node> {
        self.root.map(|index| &self.nodes[index])
    }

    pub fn root_index(&self) -> Option<NodeIndex> {
        self.root
    }

    /// Returns a reference to the node at the given arena index.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self[index]
    }

    /// All nodes in arena order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of internal (question-bearing) nodes.
    pub fn num_internal(&self) -> usize {
        self.nodes.len()
    }

    /// Number of terminal child slots.
    ///
    /// For a tree without shared subtrees this is `num_internal() + 1`.
    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.no().is_leaf() as usize + n.yes().is_leaf() as usize)
            .sum()
    }

    /// Returns all leaf ids of this tree, sorted and without duplicates.
    pub fn leaf_ids(&self) -> Vec<LeafId> {
        let mut ids: Vec<LeafId> = self
            .nodes
            .iter()
            .flat_map(|n| [n.no(), n.yes()])
            .filter_map(|c| match c {
                Child::Leaf(id) => Some(id),
                Child::Branch(_) => None,
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Number of tests on the longest path from the root to a leaf,
    /// `0` for an empty tree.
    pub fn depth(&self) -> usize {
        // Longest path per node, computed children first
        let mut longest = vec![0usize; self.nodes.len()];
        let Some(root) = self.root else {
            return 0;
        };
        let mut stack = vec![(root, false)];
        while let Some((index, children_done)) = stack.pop() {
            let node = &self.nodes[index];
            let (no, yes) = node.children();
            if children_done {
                let depth_of = |c: Child| match c {
                    Child::Branch(i) => longest[i],
                    Child::Leaf(_) => 0,
                };
                let depth = 1 + depth_of(no).max(depth_of(yes));
                longest[index] = depth;
            } else {
                stack.push((index, true));
                for child in [yes, no] {
                    if let Child::Branch(i) = child {
                        stack.push((i, false));
                    }
                }
            }
        }
        longest[root]
    }
}

impl std::ops::Index<NodeIndex> for Tree {
    type Output = Node;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index]
    }
}

// ============================================================================
// Printing (pub)
// ============================================================================
impl Tree {
    /// Renders the tree as indented text, one line per node or leaf.
    ///
    /// # Example Output
    /// ```text
    /// State 2 (2 nodes, 3 leaves):
    ///   [0] Feature 4 == 1
    ///     ├─ no:  [1] Feature 7 == 0
    ///     │   ├─ no:  Leaf 1
    ///     │   └─ yes: Leaf 2
    ///     └─ yes: Leaf 3
    /// ```
    pub fn to_pretty_string(&self) -> String {
        let mut out = format!(
            "State {} ({} nodes, {} leaves):\n",
            self.state,
            self.num_internal(),
            self.num_leaves()
        );
        match self.root {
            Some(root) => {
                out.push_str(&format!("  {}\n", describe(&self.nodes[root])));
                self.write_children(&mut out, root, "  ");
            }
            None => out.push_str("  (empty)\n"),
        }
        out
    }

    fn write_children(&self, out: &mut String, index: NodeIndex, prefix: &str) {
        let node = &self.nodes[index];
        let child_prefix = format!("{prefix}  ");
        for (label, child, is_last) in [("no: ", node.no(), false), ("yes:", node.yes(), true)] {
            let connector = if is_last { "└─" } else { "├─" };
            match child {
                Child::Leaf(id) => {
                    out.push_str(&format!("{child_prefix}{connector} {label} Leaf {id}\n"))
                }
                Child::Branch(i) => {
                    out.push_str(&format!(
                        "{child_prefix}{connector} {label} {}\n",
                        describe(&self.nodes[i])
                    ));
                    let nested = format!("{child_prefix}{}", if is_last { "  " } else { "│ " });
                    self.write_children(out, i, &nested);
                }
            }
        }
    }
}

fn describe(node: &Node) -> String {
    use crate::model::node::NodeTest;
    match node.test() {
        NodeTest::Feature(t) => format!("[{}] Feature {} == {}", node.id(), t.feature_index, t.value),
        NodeTest::Question(q) => format!("[{}] Question #{}", node.id(), q),
    }
}

// =$========================================================================$=
// ITERATORS
// =$========================================================================$=
impl Tree {
    /// Returns an iterator over the nodes reachable from the root in
    /// pre-order (parents before children, `no` before `yes`).
    ///
    /// A shared node is visited once per parent.
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self)
    }
}

/// Iterator for pre-order traversal (parents before children).
///
/// This iterator uses a stack-based approach to traverse the tree without recursion.
pub struct PreOrderIter<'a> {
    tree: &'a Tree,
    stack: Vec<NodeIndex>,
}

impl<'a> PreOrderIter<'a> {
    fn new(tree: &'a Tree) -> Self {
        PreOrderIter {
            tree,
            stack: tree.root.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let node = &self.tree[index];

        // Push yes first, so no is processed first
        for child in [node.yes(), node.no()] {
            if let Child::Branch(i) = child {
                self.stack.push(i);
            }
        }

        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{FeatureTest, LeafId, NodeTest, Target, TreeBuilder};

    fn leaf(id: u32) -> Target {
        Target::Leaf(LeafId::new(id).unwrap())
    }

    fn test(feature_index: usize) -> NodeTest {
        NodeTest::Feature(FeatureTest {
            feature_index,
            value: 1,
        })
    }

    fn small_tree() -> super::Tree {
        let mut builder = TreeBuilder::new(2);
        builder.define(0, test(4), Target::Branch(1), leaf(3)).unwrap();
        builder.define(1, test(7), leaf(1), leaf(2)).unwrap();
        builder.finish().unwrap()
    }

    #[test]
    fn test_counts() {
        let tree = small_tree();
        assert_eq!(tree.num_internal(), 2);
        assert_eq!(tree.num_leaves(), 3);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.root().unwrap().id(), 0);
        let ids: Vec<u32> = tree.leaf_ids().into_iter().map(LeafId::get).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_pre_order() {
        let tree = small_tree();
        let ids: Vec<_> = tree.pre_order_iter().map(|n| n.id()).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_empty_tree() {
        let tree = super::Tree::empty(3);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.num_leaves(), 0);
        assert!(tree.root().is_none());
        assert_eq!(tree.pre_order_iter().count(), 0);
    }

    #[test]
    fn test_pretty_string() {
        let text = small_tree().to_pretty_string();
        assert!(text.starts_with("State 2 (2 nodes, 3 leaves):\n  [0] Feature 4 == 1\n"));
        assert!(text.contains("├─ no:  [1] Feature 7 == 1"));
        assert!(text.contains("└─ yes: Leaf 3"));
    }
}
