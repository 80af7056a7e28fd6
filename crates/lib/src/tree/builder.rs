//! Builds a [`TreeNode`] hierarchy from flat label entries.
//!
//! Labels are folded in one at a time, walking (and creating) one level per
//! segment. Children keep the order in which their segment was first seen,
//! so `["b.x", "a.y", "a.z"]` yields root children `[b, a]` and `a` children
//! `[y, z]`.
//!
//! A label that is a strict prefix of another label cannot be both a test and
//! a suite. Whichever shape needs children wins: a leaf that later gains a
//! child is turned into a suite, and a prefix label inserted after its suite
//! exists is absorbed by that suite.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{LabelEntry, SourceLocation, TestCase, TestSuite, TreeNode, child_id};
use crate::constants::{ROOT_SUITE_ID, ROOT_SUITE_LABEL};

/// Builds a tree with the default root label.
///
/// Returns `None` when there are no (non-empty) labels, which callers report
/// as "no tests" rather than as a failure.
pub fn build_tree(entries: &[LabelEntry]) -> Option<TreeNode> {
    TreeBuilder::new().build(entries)
}

/// Configurable label tree builder.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    root_label: String,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            root_label: ROOT_SUITE_LABEL.to_string(),
        }
    }

    /// Set the display label of the root suite.
    pub fn root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = label.into();
        self
    }

    /// Build a fresh tree from `entries`.
    ///
    /// The result is always a [`TreeNode::Suite`] root with the empty id, or
    /// `None` if nothing could be inserted.
    pub fn build(&self, entries: &[LabelEntry]) -> Option<TreeNode> {
        let mut children = Vec::new();
        for entry in entries {
            if entry.label.is_empty() {
                warn!("Skipping unit test entry with an empty label");
                continue;
            }
            let segments: Vec<&str> = entry.segments().collect();
            if segments[0].is_empty() {
                // Its suite would take the root's empty id
                warn!(label = %entry.label, "Skipping unit test label with a leading separator");
                continue;
            }
            insert(&mut children, ROOT_SUITE_ID, &segments);
        }

        if children.is_empty() {
            return None;
        }

        let mut root = TreeNode::Suite(TestSuite {
            id: ROOT_SUITE_ID.to_string(),
            label: self.root_label.clone(),
            children,
        });

        // Later entries overwrite earlier ones for the same label
        let locations: HashMap<&str, SourceLocation> = entries
            .iter()
            .filter_map(|entry| entry.location().map(|loc| (entry.label.as_str(), loc)))
            .collect();
        attach_locations(&mut root, &locations);

        Some(root)
    }
}

fn insert(children: &mut Vec<TreeNode>, parent_id: &str, segments: &[&str]) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    let id = child_id(parent_id, segment);

    let index = match children.iter().position(|c| c.label() == *segment) {
        Some(index) => index,
        None => {
            let node = if rest.is_empty() {
                TreeNode::Test(TestCase {
                    id: id.clone(),
                    label: segment.to_string(),
                    location: None,
                })
            } else {
                TreeNode::Suite(TestSuite {
                    id: id.clone(),
                    label: segment.to_string(),
                    children: Vec::new(),
                })
            };
            children.push(node);
            children.len() - 1
        }
    };

    if rest.is_empty() {
        return;
    }

    let node = &mut children[index];
    if node.is_test() {
        debug!(id = %id, "Test label is a prefix of another label, turning it into a suite");
        *node = TreeNode::Suite(TestSuite {
            id: id.clone(),
            label: segment.to_string(),
            children: Vec::new(),
        });
    }
    if let TreeNode::Suite(suite) = node {
        insert(&mut suite.children, &id, rest);
    }
}

fn attach_locations(node: &mut TreeNode, locations: &HashMap<&str, SourceLocation>) {
    match node {
        TreeNode::Test(test) => {
            if let Some(location) = locations.get(test.id.as_str()) {
                test.location = Some(location.clone());
            }
        }
        TreeNode::Suite(suite) => {
            for child in &mut suite.children {
                attach_locations(child, locations);
            }
        }
    }
}
