use std::path::Path;

use pdflocate::{ExtractOptions, Navigation, OutlineEntry, StructureNode};

use crate::cli::OutputFormat;
use crate::shared::{open_session, print_json};

pub fn run(file: &Path, format: OutputFormat, options: ExtractOptions) -> Result<(), i32> {
    let session = open_session(file, options)?;
    let navigation = session.navigation();

    match format {
        OutputFormat::Json => print_json(&navigation),
        OutputFormat::Text => {
            match &navigation {
                Navigation::Tags { nodes } => {
                    println!("depth\tpage\ttag\ttitle\tmcids");
                    for node in nodes {
                        write_node(node, 0);
                    }
                }
                Navigation::Outline { notice, entries } => {
                    println!("{notice}");
                    write_outline(entries);
                }
            }
            Ok(())
        }
    }
}

fn write_node(node: &StructureNode, depth: usize) {
    let page = match node.page_index() {
        Some(p) => (p + 1).to_string(),
        None => "-".to_string(),
    };
    let mcids: Vec<String> = node.marked_content_ids.iter().map(i64::to_string).collect();
    println!(
        "{}\t{}\t{}{}\t{}\t{}",
        depth,
        page,
        "  ".repeat(depth),
        node.tag,
        node.title,
        mcids.join(",")
    );
    for child in &node.children {
        write_node(child, depth + 1);
    }
}

fn write_outline(entries: &[OutlineEntry]) {
    if entries.is_empty() {
        println!("No bookmarks found.");
        return;
    }
    println!("level\tpage\ttitle");
    for entry in entries {
        let page = match entry.page {
            Some(p) => (p + 1).to_string(),
            None => "-".to_string(),
        };
        println!(
            "{}\t{}\t{}{}",
            entry.level,
            page,
            "  ".repeat(entry.level),
            entry.title
        );
    }
}
