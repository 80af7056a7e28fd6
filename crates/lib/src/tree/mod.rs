//! Suite/test tree built from engine-reported labels.
//!
//! The engine reports unit tests as flat, dot-qualified labels such as
//! `ut_string.UTT_byte_to_string`. This module turns them into a hierarchy:
//! every label segment but the last becomes a [`TestSuite`], the last one a
//! [`TestCase`] leaf.
//!
//! # Core Types
//!
//! - [`TreeNode`] - Tagged suite/test node
//! - [`LabelEntry`] - One label as reported by the engine, with its source location
//!
//! # Usage
//!
//! ```rust
//! use z80unit::tree::{LabelEntry, builder::build_tree, lookup::flatten_leaves};
//!
//! let entries = vec![
//!     LabelEntry::new("ut_string.UTT_byte_to_string"),
//!     LabelEntry::new("ut_math.UTT_add"),
//! ];
//! let root = build_tree(&entries).expect("labels present");
//! let ids: Vec<&str> = flatten_leaves(&root).into_iter().map(|t| t.id.as_str()).collect();
//! assert_eq!(ids, vec!["ut_string.UTT_byte_to_string", "ut_math.UTT_add"]);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::LABEL_SEPARATOR;

pub mod builder;
pub mod lookup;


pub use builder::{TreeBuilder, build_tree};
pub use lookup::{Resolution, find_by_id, flatten_leaves, resolve};

/// File and line of a test case label in the assembler sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
}

/// A unit test label as reported by the engine.
///
/// `file` and `line` are optional; a [`SourceLocation`] is only attached to the
/// resulting leaf when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEntry {
    /// The full label of the test case, e.g. `ut_string.UTT_byte_to_string`
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl LabelEntry {
    /// Create an entry without a source location.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            file: None,
            line: None,
        }
    }

    /// Create an entry with a source location.
    pub fn with_location(label: impl Into<String>, file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            label: label.into(),
            file: Some(file.into()),
            line: Some(line),
        }
    }

    /// The source location, when the engine reported both file and line.
    pub fn location(&self) -> Option<SourceLocation> {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => Some(SourceLocation {
                file: file.clone(),
                line,
            }),
            _ => None,
        }
    }

    /// Iterate over the dot-separated segments of the label.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.label.split(LABEL_SEPARATOR)
    }
}

/// An internal node grouping child suites and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    pub id: String,
    pub label: String,
    pub children: Vec<TreeNode>,
}

/// A single executable unit test. Its id is the full label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

/// A node of the test tree.
///
/// Serialized with a `type` tag (`"suite"` / `"test"`) so the tree can be handed
/// to a UI as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Suite(TestSuite),
    Test(TestCase),
}

impl TreeNode {
    /// The dot-joined path identifying this node.
    pub fn id(&self) -> &str {
        match self {
            TreeNode::Suite(suite) => &suite.id,
            TreeNode::Test(test) => &test.id,
        }
    }

    /// The display label (last path segment).
    pub fn label(&self) -> &str {
        match self {
            TreeNode::Suite(suite) => &suite.label,
            TreeNode::Test(test) => &test.label,
        }
    }

    /// Child nodes; empty for a test.
    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Suite(suite) => &suite.children,
            TreeNode::Test(_) => &[],
        }
    }

    pub fn is_suite(&self) -> bool {
        matches!(self, TreeNode::Suite(_))
    }

    pub fn is_test(&self) -> bool {
        matches!(self, TreeNode::Test(_))
    }

    /// Returns the test case if this node is a leaf.
    pub fn as_test(&self) -> Option<&TestCase> {
        match self {
            TreeNode::Test(test) => Some(test),
            TreeNode::Suite(_) => None,
        }
    }

    /// Number of leaf tests in this subtree.
    pub fn test_count(&self) -> usize {
        match self {
            TreeNode::Suite(suite) => suite.children.iter().map(TreeNode::test_count).sum(),
            TreeNode::Test(_) => 1,
        }
    }
}

/// Joins a parent id and a segment into a child id. Children of the root
/// (empty id) use the bare segment.
pub(crate) fn child_id(parent_id: &str, segment: &str) -> String {
    if parent_id.is_empty() {
        segment.to_string()
    } else {
        format!("{parent_id}{LABEL_SEPARATOR}{segment}")
    }
}
