use sha2::{Digest as _, Sha256};

use crate::{proto_array::ProtoArrayNode, tree::ForkChoiceNode};

pub fn hash(input: &str) -> String {
    hex::encode(Sha256::digest(input))
}

pub fn root_of(slot: &str) -> String {
    format!("0x{}", hash(slot))
}

pub fn proto_node(
    slot: &str,
    parent: Option<usize>,
    best_descendant: Option<usize>,
) -> ProtoArrayNode {
    ProtoArrayNode {
        slot: slot.to_owned(),
        root: root_of(slot),
        parent,
        weight: 0.0,
        best_descendant,
    }
}

pub fn node(slot: &str, children: impl IntoIterator<Item = ForkChoiceNode>) -> ForkChoiceNode {
    ForkChoiceNode {
        children: children.into_iter().collect(),
        slot: slot.to_owned(),
        root: root_of(slot),
        weight: 0.0,
        is_canonical: false,
        count_collapsed_blocks: 0,
    }
}

pub fn leaf(slot: &str) -> ForkChoiceNode {
    node(slot, [])
}

pub fn collapsed(mut node: ForkChoiceNode, count_collapsed_blocks: usize) -> ForkChoiceNode {
    node.count_collapsed_blocks = count_collapsed_blocks;
    node
}

pub fn canonical(mut node: ForkChoiceNode) -> ForkChoiceNode {
    node.is_canonical = true;
    node
}

/// A single chain of `length` blocks starting at slot 0, all canonical.
pub fn canonical_chain(length: usize) -> ForkChoiceNode {
    (0..length)
        .rev()
        .fold(None, |child: Option<ForkChoiceNode>, slot| {
            Some(canonical(node(&slot.to_string(), child)))
        })
        .unwrap_or_default()
}
