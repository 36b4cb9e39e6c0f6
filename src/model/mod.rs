//! Data model of decision trees and tree sets.
//!
//! Trees use the arena pattern: the nodes of a [Tree] live in one `Vec` and
//! children refer to other nodes by arena index ([Child::Branch]) or end in
//! a leaf id ([Child::Leaf]). Node ids from the tree file are only used
//! while building, through the id registry of the [TreeBuilder].

/// Collaborator traits for feature lookup and value unescaping
pub mod feature;
/// Nodes, node tests and children
pub mod node;
/// Named pattern questions (legacy scheme)
pub mod question;
/// Decision tree of one state
pub mod tree;
/// Building trees from node definitions with forward references
pub mod tree_builder;
/// Tree families per model type
pub mod tree_set;

pub use feature::{
    EscapeTables, FeatureClass, FeatureDefinition, FeatureRegistry, FeatureVector, SymbolTable,
    ValueNormalizer, Verbatim,
};
pub use node::{Branch, Child, FeatureTest, LeafId, Node, NodeId, NodeIndex, NodeTest, ROOT_NODE_ID};
pub use question::{Question, QuestionIndex};
pub use tree::Tree;
pub use tree_builder::{Target, TreeBuilder};
pub use tree_set::{ModelType, TreeFamily, TreeSet};
