//! Node lookup and leaf expansion.

use std::collections::HashSet;

use tracing::warn;

use super::{TestCase, TreeNode};

/// Exact-match depth-first search for the node with `id`.
///
/// No prefix matching: `ut_str` does not find `ut_string`.
pub fn find_by_id<'a>(node: &'a TreeNode, id: &str) -> Option<&'a TreeNode> {
    if node.id() == id {
        return Some(node);
    }
    node.children()
        .iter()
        .find_map(|child| find_by_id(child, id))
}

/// All leaf tests below `node`, depth-first and left-to-right.
///
/// A test node yields itself.
pub fn flatten_leaves(node: &TreeNode) -> Vec<&TestCase> {
    let mut leaves = Vec::new();
    collect_leaves(node, &mut leaves);
    leaves
}

fn collect_leaves<'a>(node: &'a TreeNode, leaves: &mut Vec<&'a TestCase>) {
    match node {
        TreeNode::Test(test) => leaves.push(test),
        TreeNode::Suite(suite) => {
            for child in &suite.children {
                collect_leaves(child, leaves);
            }
        }
    }
}

/// The leaf tests a list of requested ids expands to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Leaf tests in request order, then flatten order within each request.
    pub tests: Vec<TestCase>,
    /// Requested ids that are not part of the tree.
    pub unknown: Vec<String>,
}

impl Resolution {
    pub fn test_ids(&self) -> Vec<String> {
        self.tests.iter().map(|t| t.id.clone()).collect()
    }

    pub fn has_unknown(&self) -> bool {
        !self.unknown.is_empty()
    }
}

/// Expand requested suite or test ids into leaf tests.
///
/// Unknown ids are skipped and reported in [`Resolution::unknown`]; they never
/// abort the remaining ids. A test reached through several requested ids is
/// only included the first time. Without a tree every id is unknown.
pub fn resolve<S: AsRef<str>>(root: Option<&TreeNode>, ids: &[S]) -> Resolution {
    let mut resolution = Resolution::default();
    let mut seen = HashSet::new();

    for id in ids {
        let id = id.as_ref();
        match root.and_then(|root| find_by_id(root, id)) {
            Some(node) => {
                for test in flatten_leaves(node) {
                    if seen.insert(test.id.as_str()) {
                        resolution.tests.push(test.clone());
                    }
                }
            }
            None => {
                warn!(id = %id, "Requested test id is not part of the loaded tests, skipping");
                resolution.unknown.push(id.to_string());
            }
        }
    }

    resolution
}
