use std::io::{Result, Write};

use crate::tree::ForkChoiceNode;

enum Step<'tree> {
    Open(&'tree ForkChoiceNode),
    Close(&'tree ForkChoiceNode),
    Separator,
}

/// Writes `tree` as JSON in the same format as its `Serialize` implementation.
///
/// The derived implementation recurses once per block. A chain thousands of blocks long
/// would overflow the stack of an async worker, so the served tree is written with this.
pub fn write_json(tree: &ForkChoiceNode, mut writer: impl Write) -> Result<()> {
    let mut steps = vec![Step::Open(tree)];

    while let Some(step) = steps.pop() {
        match step {
            Step::Open(node) => {
                writer.write_all(br#"{"children":["#)?;

                steps.push(Step::Close(node));

                for (position, child) in node.children.iter().enumerate().rev() {
                    steps.push(Step::Open(child));

                    if position > 0 {
                        steps.push(Step::Separator);
                    }
                }
            }
            Step::Close(node) => {
                writer.write_all(br#"],"slot":"#)?;
                serde_json::to_writer(&mut writer, &node.slot)?;
                writer.write_all(br#","root":"#)?;
                serde_json::to_writer(&mut writer, &node.root)?;
                writer.write_all(br#","weight":"#)?;
                serde_json::to_writer(&mut writer, &node.weight)?;
                writer.write_all(br#","is_canonical":"#)?;
                serde_json::to_writer(&mut writer, &node.is_canonical)?;

                if node.count_collapsed_blocks > 0 {
                    writer.write_all(br#","count_collapsed_blocks":"#)?;
                    serde_json::to_writer(&mut writer, &node.count_collapsed_blocks)?;
                }

                writer.write_all(b"}")?;
            }
            Step::Separator => writer.write_all(b",")?,
        }
    }

    Ok(())
}
