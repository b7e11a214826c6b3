use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::tree::ForkChoiceNode;

const CANONICAL_FILL_COLOR: &str = "#fdfd96";

// "0x" followed by 32 bytes in hex.
const FULL_ROOT_LENGTH: usize = 66;

/// Shortens a full block root to its first and last 2 bytes, e.g. `ca97..48bb`.
#[must_use]
pub fn humanize_root(root: &str) -> String {
    match (root.get(2..6), root.get(FULL_ROOT_LENGTH - 4..)) {
        (Some(prefix), Some(suffix)) if root.len() == FULL_ROOT_LENGTH => {
            format!("{prefix}..{suffix}")
        }
        _ => root.to_owned(),
    }
}

#[must_use]
pub fn to_dot(tree: &ForkChoiceNode) -> String {
    Dot(tree).to_string()
}

/// Renders a tree in the Graphviz DOT language.
///
/// Every edge points from a child to its parent.
pub struct Dot<'tree>(pub &'tree ForkChoiceNode);

impl Display for Dot<'_> {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        writeln!(formatter, "digraph {{")?;

        let mut next_id = 0_usize;
        let mut stack = vec![(self.0, None)];

        while let Some((node, parent_id)) = stack.pop() {
            let id = next_id;
            next_id += 1;

            let label = format!(
                "({},{}) ({})",
                node.slot,
                humanize_root(&node.root),
                node.count_collapsed_blocks,
            );

            write!(formatter, "\tn{id} [label=\"{}\"", escape(&label))?;

            if node.is_canonical {
                write!(formatter, ", fillcolor=\"{CANONICAL_FILL_COLOR}\", style=\"filled\"")?;
            }

            writeln!(formatter, "];")?;

            if let Some(parent_id) = parent_id {
                writeln!(formatter, "\tn{id} -> n{parent_id};")?;
            }

            stack.extend(node.children.iter().rev().map(|child| (child, Some(id))));
        }

        writeln!(formatter, "}}")
    }
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
