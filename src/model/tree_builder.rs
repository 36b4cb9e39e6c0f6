//! Construction of a [Tree] from node definitions in file order.
//!
//! The parser feeds one [TreeBuilder::define] call per node line. Node ids
//! are resolved through a registration map:
//! - the root (id `0`) is registered when the builder is created,
//! - every [Target::Branch] registers its id (once) when its parent is defined,
//! - a definition must name an id that is already registered.
//!
//! Several parents may name the same id and then share that node.
//! [TreeBuilder::finish] checks that every registered node got defined and
//! that there are no reference cycles, so a finished [Tree] can always be
//! searched to a leaf.

use crate::model::node::{Child, LeafId, Node, NodeId, NodeIndex, NodeTest, ROOT_NODE_ID};
use crate::model::tree::Tree;
use crate::parser::ParsingErrorType;
use std::collections::HashMap;

/// Unresolved child of a node definition, as written in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Reference to another node of the same tree by id
    Branch(NodeId),
    /// Terminal leaf model
    Leaf(LeafId),
}

#[derive(Debug, Clone)]
struct Definition {
    test: NodeTest,
    no: Child,
    yes: Child,
}

// =#========================================================================#=
// TREE BUILDER
// =#========================================================================$=
/// Builds the tree of one HMM state.
///
/// # Example
/// ```
/// use htstree::model::{FeatureTest, LeafId, NodeTest, Target, TreeBuilder};
///
/// let test = NodeTest::Feature(FeatureTest { feature_index: 0, value: 1 });
/// let leaf = |id| Target::Leaf(LeafId::new(id).unwrap());
///
/// let mut builder = TreeBuilder::new(2);
/// builder.define(0, test, Target::Branch(1), leaf(3)).unwrap();
/// builder.define(1, test, leaf(1), leaf(2)).unwrap();
/// let tree = builder.finish().unwrap();
///
/// assert_eq!(tree.num_internal(), 2);
/// assert_eq!(tree.num_leaves(), 3);
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    state: usize,
    registry: HashMap<NodeId, NodeIndex>,
    ids: Vec<NodeId>,
    definitions: Vec<Option<Definition>>,
}

impl TreeBuilder {
    /// Creates a builder for the tree of HMM state `state`, with the root registered.
    pub fn new(state: usize) -> Self {
        let mut builder = TreeBuilder {
            state,
            registry: HashMap::new(),
            ids: Vec::new(),
            definitions: Vec::new(),
        };
        builder.register(ROOT_NODE_ID);
        builder
    }

    /// State this tree belongs to.
    pub fn state(&self) -> usize {
        self.state
    }

    /// Returns whether a node with this id has been registered so far.
    pub fn is_registered(&self, id: NodeId) -> bool {
        self.registry.contains_key(&id)
    }

    /// Number of registered nodes (defined or not yet defined).
    pub fn num_registered(&self) -> usize {
        self.ids.len()
    }

    /// Defines the test and the two children of the registered node `id`.
    ///
    /// # Errors
    /// * [ParsingErrorType::UnresolvedNode] if `id` has not been registered
    /// * [ParsingErrorType::DuplicateNode] if `id` was already defined
    pub fn define(
        &mut self,
        id: NodeId,
        test: NodeTest,
        no: Target,
        yes: Target,
    ) -> Result<(), ParsingErrorType> {
        let index = *self
            .registry
            .get(&id)
            .ok_or(ParsingErrorType::UnresolvedNode(id))?;
        if self.definitions[index].is_some() {
            return Err(ParsingErrorType::DuplicateNode(id));
        }

        let no = self.link(no);
        let yes = self.link(yes);
        self.definitions[index] = Some(Definition { test, no, yes });
        Ok(())
    }

    /// Consumes the builder and returns the finished tree.
    ///
    /// A builder without any definition yields an empty tree (no root).
    ///
    /// # Errors
    /// * [ParsingErrorType::UndefinedNode] if a referenced node was never defined
    /// * [ParsingErrorType::CyclicReference] if a node can reach itself
    pub fn finish(self) -> Result<Tree, ParsingErrorType> {
        if self.definitions.iter().all(Option::is_none) {
            return Ok(Tree::empty(self.state));
        }

        let mut nodes = Vec::with_capacity(self.ids.len());
        for (id, definition) in self.ids.iter().zip(self.definitions) {
            let Definition { test, no, yes } =
                definition.ok_or(ParsingErrorType::UndefinedNode(*id))?;
            nodes.push(Node::new(*id, test, no, yes));
        }

        check_acyclic(&nodes)?;
        Ok(Tree::from_parts(self.state, nodes, 0))
    }

    fn link(&mut self, target: Target) -> Child {
        match target {
            Target::Branch(id) => Child::Branch(self.register(id)),
            Target::Leaf(leaf) => Child::Leaf(leaf),
        }
    }

    fn register(&mut self, id: NodeId) -> NodeIndex {
        if let Some(&index) = self.registry.get(&id) {
            return index;
        }
        let index = self.ids.len();
        self.ids.push(id);
        self.definitions.push(None);
        self.registry.insert(id, index);
        index
    }
}

/// Depth-first search from the root (index 0), failing on a back edge.
fn check_acyclic(nodes: &[Node]) -> Result<(), ParsingErrorType> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    // (node, number of children already pushed)
    let mut stack: Vec<(NodeIndex, u8)> = vec![(0, 0)];
    marks[0] = Mark::OnPath;

    while let Some((index, pushed)) = stack.pop() {
        let child = match pushed {
            0 => nodes[index].no(),
            1 => nodes[index].yes(),
            _ => {
                marks[index] = Mark::Done;
                continue;
            }
        };
        stack.push((index, pushed + 1));

        if let Child::Branch(next) = child {
            match marks[next] {
                Mark::OnPath => return Err(ParsingErrorType::CyclicReference(nodes[next].id())),
                Mark::Done => {}
                Mark::Unvisited => {
                    marks[next] = Mark::OnPath;
                    stack.push((next, 0));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::FeatureTest;

    const TEST: NodeTest = NodeTest::Feature(FeatureTest {
        feature_index: 0,
        value: 0,
    });

    fn leaf(id: u32) -> Target {
        Target::Leaf(LeafId::new(id).unwrap())
    }

    #[test]
    fn test_empty_builder_gives_empty_tree() {
        let tree = TreeBuilder::new(4).finish().unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.state(), 4);
    }

    #[test]
    fn test_unregistered_id_is_unresolved() {
        let mut builder = TreeBuilder::new(2);
        assert_eq!(
            builder.define(5, TEST, leaf(1), leaf(2)),
            Err(ParsingErrorType::UnresolvedNode(5))
        );
    }

    #[test]
    fn test_duplicate_definition() {
        let mut builder = TreeBuilder::new(2);
        builder.define(0, TEST, leaf(1), leaf(2)).unwrap();
        assert_eq!(
            builder.define(0, TEST, leaf(1), leaf(2)),
            Err(ParsingErrorType::DuplicateNode(0))
        );
    }

    #[test]
    fn test_undefined_reference() {
        let mut builder = TreeBuilder::new(2);
        builder.define(0, TEST, Target::Branch(1), Target::Branch(2)).unwrap();
        builder.define(2, TEST, leaf(1), leaf(2)).unwrap();
        assert_eq!(
            builder.finish().unwrap_err(),
            ParsingErrorType::UndefinedNode(1)
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut builder = TreeBuilder::new(2);
        builder.define(0, TEST, Target::Branch(1), leaf(1)).unwrap();
        builder.define(1, TEST, Target::Branch(2), leaf(2)).unwrap();
        builder.define(2, TEST, leaf(3), Target::Branch(1)).unwrap();
        assert_eq!(
            builder.finish().unwrap_err(),
            ParsingErrorType::CyclicReference(1)
        );
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let mut builder = TreeBuilder::new(2);
        builder.define(0, TEST, Target::Branch(0), leaf(1)).unwrap();
        assert_eq!(
            builder.finish().unwrap_err(),
            ParsingErrorType::CyclicReference(0)
        );
    }

    #[test]
    fn test_shared_subtree_is_not_a_cycle() {
        let mut builder = TreeBuilder::new(2);
        builder.define(0, TEST, Target::Branch(1), Target::Branch(2)).unwrap();
        builder.define(1, TEST, Target::Branch(3), leaf(1)).unwrap();
        builder.define(2, TEST, Target::Branch(3), leaf(2)).unwrap();
        builder.define(3, TEST, leaf(3), leaf(4)).unwrap();
        assert!(builder.is_registered(3));
        assert_eq!(builder.num_registered(), 4);

        let tree = builder.finish().unwrap();
        assert_eq!(tree.num_internal(), 4);
        assert_eq!(tree.node(1).no(), tree.node(2).no());
    }
}
