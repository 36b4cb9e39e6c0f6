//! Tree description format constants.

/// Marker of a state header line, e.g. `{*}[2]`
pub(crate) const STATE_MARKER: &str = "{*}";

/// Opening bracket of the state number in a header line
pub(crate) const STATE_OPEN: char = '[';

/// Closing bracket of the state number in a header line
pub(crate) const STATE_CLOSE: char = ']';

/// Keyword starting a question declaration line
pub(crate) const QUESTION_KEYWORD: &str = "QS";

/// Line opening the node list of a tree
pub(crate) const TREE_OPEN: char = '{';

/// Line closing the node list of a tree
pub(crate) const TREE_CLOSE: char = '}';

/// Prefix of internal branch targets (and optional prefix of node ids)
pub(crate) const BRANCH_PREFIX: char = '-';

/// Separator in front of the leaf number in terminal targets, e.g. `"dur_s2_12"`
pub(crate) const LEAF_SEPARATOR: char = '_';

/// Separator of feature name and value in a feature test
pub(crate) const TEST_SEPARATOR: char = '=';
