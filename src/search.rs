//! Tree search: from the root of a tree to the leaf selected by a unit.
//!
//! There is one traversal, [Tree::find_leaf], parameterized by a [Decide]
//! implementation choosing the branch at every node:
//! * [ByteFeatureMatch] - equality of a byte feature with the node value
//! * [PatternMatch] - containment of any question pattern in a unit name
//!
//! [search_tree_general] and [search_tree] wrap the traversal and return
//! the leaf id as an `i32`, [NO_LEAF] if no leaf is reached.

use crate::model::feature::FeatureVector;
use crate::model::{Branch, Child, LeafId, Node, NodeTest, Question, Tree};

/// Returned by the search functions if no leaf is reached, e.g. for an empty tree.
pub const NO_LEAF: i32 = -1;

// =#========================================================================#=
// DECIDE (Trait)
// =#========================================================================T=
/// Chooses the branch to follow at a node.
pub trait Decide {
    /// Returns the branch to take at `node`, or `None` if the node's test
    /// cannot be evaluated by this decider.
    fn decide(&self, node: &Node) -> Option<Branch>;
}

/// Takes `yes` if the feature vector holds the node's byte value.
pub struct ByteFeatureMatch<'a, V: FeatureVector + ?Sized> {
    vector: &'a V,
}

impl<'a, V: FeatureVector + ?Sized> ByteFeatureMatch<'a, V> {
    pub fn new(vector: &'a V) -> Self {
        ByteFeatureMatch { vector }
    }
}

impl<V: FeatureVector + ?Sized> Decide for ByteFeatureMatch<'_, V> {
    #[inline]
    fn decide(&self, node: &Node) -> Option<Branch> {
        match node.test() {
            NodeTest::Feature(test) => {
                let value = self.vector.byte_feature(test.feature_index)?;
                Some(Branch::from(value == test.value))
            }
            NodeTest::Question(_) => None,
        }
    }
}

/// Takes `yes` if any pattern of the node's question occurs in the unit name.
pub struct PatternMatch<'a> {
    questions: &'a [Question],
    name: &'a str,
}

impl<'a> PatternMatch<'a> {
    pub fn new(questions: &'a [Question], name: &'a str) -> Self {
        PatternMatch { questions, name }
    }
}

impl Decide for PatternMatch<'_> {
    fn decide(&self, node: &Node) -> Option<Branch> {
        match node.test() {
            NodeTest::Question(index) => self
                .questions
                .get(*index)
                .map(|question| Branch::from(question.matches(self.name))),
            NodeTest::Feature(_) => None,
        }
    }
}

// =#========================================================================#=
// TRAVERSAL
// =#========================================================================$=
impl Tree {
    /// Walks from the root, following the branch chosen by `decider`,
    /// until a leaf is reached.
    ///
    /// # Returns
    /// * `Some(LeafId)` - The leaf reached
    /// * `None` - If the tree is empty, the decider cannot evaluate a node,
    ///   or the walk visits more nodes than the tree has
    pub fn find_leaf<D: Decide + ?Sized>(&self, decider: &D) -> Option<LeafId> {
        let mut index = self.root_index()?;
        for _ in 0..self.num_internal() {
            let node = self.node(index);
            match node.child(decider.decide(node)?) {
                Child::Leaf(leaf) => return Some(leaf),
                Child::Branch(next) => index = next,
            }
        }
        None
    }
}

fn to_leaf_number(leaf: Option<LeafId>) -> i32 {
    leaf.map_or(NO_LEAF, |leaf| leaf.get() as i32)
}

/// Searches `tree` with the byte features of a unit.
///
/// # Returns
/// The leaf id reached, or [NO_LEAF]. A vector too short for a feature
/// index tested on the path also gives [NO_LEAF].
///
/// # Example
/// ```
/// use htstree::model::{FeatureDefinition, Verbatim};
/// use htstree::search::search_tree_general;
/// use htstree::tree_file::parse_str;
///
/// let features = FeatureDefinition::new().with_byte_feature("gender", &["female", "male"]);
/// let trees = parse_str(
///     "{*}[2]\n{\n0 gender=male \"dur_s2_12\" \"dur_s2_7\"\n}\n",
///     &features,
///     &Verbatim,
/// ).unwrap();
///
/// let male = features.encode(&[("gender", "male")]).unwrap();
/// assert_eq!(search_tree_general(&trees[0], &male), 7);
/// ```
pub fn search_tree_general<V: FeatureVector + ?Sized>(tree: &Tree, vector: &V) -> i32 {
    to_leaf_number(tree.find_leaf(&ByteFeatureMatch::new(vector)))
}

/// Searches `tree` with the name of a unit, matched against question patterns.
///
/// # Returns
/// The leaf id reached, or [NO_LEAF].
pub fn search_tree(tree: &Tree, questions: &[Question], name: &str) -> i32 {
    to_leaf_number(tree.find_leaf(&PatternMatch::new(questions, name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatureDefinition, FeatureTest, Target, TreeBuilder, Verbatim};
    use crate::tree_file::{parse_legacy_str, parse_str};
    use rstest::rstest;

    fn leaf(id: u32) -> Target {
        Target::Leaf(LeafId::new(id).unwrap())
    }

    fn feature(feature_index: usize, value: u8) -> NodeTest {
        NodeTest::Feature(FeatureTest {
            feature_index,
            value,
        })
    }

    #[rstest]
    #[case("male", 7)]
    #[case("female", 12)]
    fn test_gender_tree(#[case] gender: &str, #[case] expected: i32) {
        let features = FeatureDefinition::new().with_byte_feature("gender", &["female", "male"]);
        let trees = parse_str(
            "{*}[2]\n{\n 0 gender=male \"dur_s2_12\" \"dur_s2_7\"\n}\n",
            &features,
            &Verbatim,
        )
        .unwrap();
        let vector = features.encode(&[("gender", gender)]).unwrap();
        assert_eq!(search_tree_general(&trees[0], &vector), expected);
    }

    #[test]
    fn test_short_vector_reaches_no_leaf() {
        let features = FeatureDefinition::new()
            .with_byte_feature("phone", &["0", "a"])
            .with_byte_feature("gender", &["female", "male"]);
        let trees = parse_str(
            "{*}[2]\n{\n 0 gender=male \"dur_s2_12\" \"dur_s2_7\"\n}\n",
            &features,
            &Verbatim,
        )
        .unwrap();
        assert_eq!(search_tree_general(&trees[0], &[1u8][..]), NO_LEAF);
        assert_eq!(search_tree_general(&trees[0], &Vec::<u8>::new()), NO_LEAF);
        assert_eq!(search_tree_general(&trees[0], &[1u8, 1][..]), 7);
    }

    #[rstest]
    #[case("m_1", 7)]
    #[case("female_1", 7)]
    #[case("f_1", 12)]
    fn test_question_tree(#[case] name: &str, #[case] expected: i32) {
        let (trees, questions) = parse_legacy_str(
            "QS Q-gender { \"m_\",\"male_\" }\n{*}[2]\n{\n 0 Q-gender \"dur_s2_12\" \"dur_s2_7\"\n}\n",
        )
        .unwrap();
        assert_eq!(search_tree(&trees[0], &questions, name), expected);
    }

    #[test]
    fn test_empty_tree_returns_no_leaf() {
        let tree = Tree::empty(2);
        assert_eq!(search_tree_general(&tree, &[0u8][..]), NO_LEAF);
        assert_eq!(search_tree(&tree, &[], "a"), NO_LEAF);
    }

    #[test]
    fn test_mismatched_decider_returns_no_leaf() {
        let mut builder = TreeBuilder::new(2);
        builder.define(0, NodeTest::Question(0), leaf(1), leaf(2)).unwrap();
        let tree = builder.finish().unwrap();

        assert_eq!(search_tree_general(&tree, &[1u8][..]), NO_LEAF);
        // question index out of range
        assert_eq!(search_tree(&tree, &[], "a"), NO_LEAF);
    }

    #[test]
    fn test_deep_chain() {
        // node i tests feature i == 1, yes continues, no ends in leaf 100 + i
        let depth = 25;
        let mut builder = TreeBuilder::new(3);
        for i in 0..depth {
            let yes = if i + 1 < depth {
                Target::Branch(i as u32 + 1)
            } else {
                leaf(1)
            };
            builder
                .define(i as u32, feature(i, 1), leaf(100 + i as u32), yes)
                .unwrap();
        }
        let tree = builder.finish().unwrap();
        assert_eq!(tree.depth(), depth);

        let all_yes = vec![1u8; depth];
        assert_eq!(search_tree_general(&tree, &all_yes), 1);

        let mut stop_at_ten = all_yes.clone();
        stop_at_ten[10] = 0;
        assert_eq!(search_tree_general(&tree, &stop_at_ten), 110);
    }

    #[test]
    fn test_concurrent_search() {
        let features = FeatureDefinition::new().with_byte_feature("gender", &["female", "male"]);
        let trees = parse_str(
            "{*}[2]\n{\n 0 gender=male \"dur_s2_12\" \"dur_s2_7\"\n}\n",
            &features,
            &Verbatim,
        )
        .unwrap();
        let tree = &trees[0];

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8u8)
                .map(|i| {
                    scope.spawn(move || {
                        let vector = vec![i % 2];
                        (0..1000)
                            .map(|_| search_tree_general(tree, &vector))
                            .all(|leaf| leaf == if i % 2 == 1 { 7 } else { 12 })
                    })
                })
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap());
            }
        });
    }
}
