//! Output formatting helpers for human-readable and JSON output.

use z80unit::{TestState, TreeNode};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", format_row(headers.to_vec()));
    for row in rows {
        println!(
            "{}",
            format_row(row.iter().take(col_count).map(String::as_str).collect())
        );
    }
}

/// Print a suite tree, one node per line, indented by depth.
pub fn print_tree(node: &TreeNode) {
    print_node(node, 0);
}

fn print_node(node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        TreeNode::Suite(suite) => {
            println!("{indent}{} ({} tests)", suite.label, node.test_count());
            for child in &suite.children {
                print_node(child, depth + 1);
            }
        }
        TreeNode::Test(test) => println!("{indent}{}", test.label),
    }
}

/// Short tag for a test state.
pub fn state_tag(state: TestState) -> &'static str {
    match state {
        TestState::Running => "RUN ",
        TestState::Passed => "PASS",
        TestState::Failed => "FAIL",
        TestState::Errored => "ERR ",
    }
}
