//! List command - loads and prints the unit tests of a project.

use z80unit::tree::flatten_leaves;

use crate::cli::ListArgs;
use crate::output::{OutputFormat, print_table, print_tree};

/// Run the list command
pub async fn run(args: &ListArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let (adapter, _events) = super::connect(&args.project)?;
    let tree = adapter.load().await?;

    match format {
        OutputFormat::Human => {
            let Some(tree) = tree else {
                println!("No unit tests found in {}", adapter.root().display());
                return Ok(());
            };
            print_tree(&tree);
            println!();

            let rows: Vec<Vec<String>> = flatten_leaves(&tree)
                .into_iter()
                .map(|test| {
                    let (file, line) = match &test.location {
                        Some(location) => {
                            (location.file.display().to_string(), location.line.to_string())
                        }
                        None => (String::new(), String::new()),
                    };
                    vec![test.id.clone(), file, line]
                })
                .collect();
            print_table(&["TEST", "FILE", "LINE"], &rows);
        }
        OutputFormat::Json => {
            let value = match tree {
                Some(tree) => serde_json::to_value(tree.as_ref())?,
                None => serde_json::Value::Null,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
