//! Decision nodes of a clustering tree.
//!
//! A [Node] holds a [NodeTest] and two [Child] references, one per answer.
//! A child is either another node of the same tree ([Child::Branch]) or a
//! terminal [LeafId] ([Child::Leaf]).

use crate::model::question::QuestionIndex;
use std::fmt;

/// Id of a node as written in the tree file (with any leading `-` stripped).
pub type NodeId = u32;

/// Index of a node in the arena of its [Tree](crate::model::Tree).
pub type NodeIndex = usize;

/// Id of the root node of every tree.
pub const ROOT_NODE_ID: NodeId = 0;

// =#========================================================================#=
// LEAF ID
// =#========================================================================$=
/// Id of a leaf model (PDF), the result of a tree search.
///
/// Leaf ids are always at least `1` and fit into an `i32`, so the search
/// sentinel `-1` can never be mistaken for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(u32);

impl LeafId {
    /// Creates a leaf id, or `None` if `id` is `0` or exceeds `i32::MAX`.
    pub fn new(id: u32) -> Option<Self> {
        (1..=i32::MAX as u32).contains(&id).then_some(LeafId(id))
    }

    /// Returns the leaf id as an integer (always ≥ 1).
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =#========================================================================#=
// CHILD / BRANCH
// =#========================================================================$=
/// Resolved child of a [Node].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    /// Another node of the same tree, by arena index
    Branch(NodeIndex),
    /// A terminal leaf model
    Leaf(LeafId),
}

impl Child {
    /// Returns whether this child is a terminal leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Child::Leaf(_))
    }
}

/// Answer of a node test, selecting one of the two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    No,
    Yes,
}

impl From<bool> for Branch {
    fn from(matched: bool) -> Self {
        if matched { Branch::Yes } else { Branch::No }
    }
}

// =#========================================================================#=
// NODE TEST
// =#========================================================================$=
/// Byte-valued feature test: "is feature `feature_index` equal to `value`?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureTest {
    pub feature_index: usize,
    pub value: u8,
}

/// Test carried by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTest {
    /// Inline feature/value test of the byte-feature scheme
    Feature(FeatureTest),
    /// Reference into the question list of the model type (legacy scheme)
    Question(QuestionIndex),
}

// =#========================================================================#=
// NODE
// =#========================================================================$=
/// A binary decision point of a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    test: NodeTest,
    no: Child,
    yes: Child,
}

impl Node {
    pub(crate) fn new(id: NodeId, test: NodeTest, no: Child, yes: Child) -> Self {
        Node { id, test, no, yes }
    }

    /// Id of this node in the tree file.
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn test(&self) -> &NodeTest {
        &self.test
    }

    pub fn no(&self) -> Child {
        self.no
    }

    pub fn yes(&self) -> Child {
        self.yes
    }

    /// Returns the child selected by `branch`.
    #[inline]
    pub fn child(&self, branch: Branch) -> Child {
        match branch {
            Branch::No => self.no,
            Branch::Yes => self.yes,
        }
    }

    /// Returns both children as `(no, yes)`.
    pub fn children(&self) -> (Child, Child) {
        (self.no, self.yes)
    }
}
