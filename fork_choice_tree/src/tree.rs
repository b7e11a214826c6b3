use serde::{Deserialize, Serialize};
use std_ext::DefaultExt;

use crate::{
    error::Error,
    proto_array::{self, ProtoArrayNode},
};

/// A block in the reconstructed fork choice tree.
///
/// Field order matches the JSON served to the dashboard.
#[derive(Clone, PartialEq, Default, Debug, Deserialize, Serialize)]
pub struct ForkChoiceNode {
    #[serde(default)]
    pub children: Vec<ForkChoiceNode>,
    pub slot: String,
    pub root: String,
    pub weight: f64,
    pub is_canonical: bool,
    /// Number of single-child blocks elided between this node and its only child.
    #[serde(default, skip_serializing_if = "DefaultExt::is_default")]
    pub count_collapsed_blocks: usize,
}

// Long chains would otherwise overflow the stack when dropped recursively.
impl Drop for ForkChoiceNode {
    fn drop(&mut self) {
        let mut stack = core::mem::take(&mut self.children);

        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

impl ForkChoiceNode {
    fn from_proto_node(proto_node: &ProtoArrayNode, is_canonical: bool) -> Self {
        Self {
            children: vec![],
            slot: proto_node.slot.clone(),
            root: proto_node.root.clone(),
            weight: proto_node.weight,
            is_canonical,
            count_collapsed_blocks: 0,
        }
    }

    /// Iterates over the subtree rooted at `self` in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];

        core::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn collapsed_block_count(&self) -> usize {
        self.iter().map(|node| node.count_collapsed_blocks).sum()
    }

    /// Follows canonical children starting at `self`, which is always included.
    #[must_use]
    pub fn canonical_path(&self) -> Vec<&Self> {
        core::iter::successors(Some(self), |node| {
            node.children.iter().find(|child| child.is_canonical)
        })
        .collect()
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Turns a flat proto array into a nested block tree rooted at its anchor.
///
/// A node is provisionally canonical if its best descendant is the head or if it is the head
/// itself. After that, every child that is the only child of a canonical node becomes canonical.
/// The proto array marks only nodes whose `best_descendant` matches, so single-child
/// extensions below them would otherwise be left out of the canonical chain.
///
/// Children appear in the order they occur in `nodes`.
pub fn roll_proto_array(
    nodes: &[ProtoArrayNode],
    canonical_head_index: usize,
) -> Result<ForkChoiceNode, Error> {
    let anchor = proto_array::validate(nodes)?;

    let mut children_index = vec![vec![]; nodes.len()];

    for (index, node) in nodes.iter().enumerate() {
        if let Some(parent) = node.parent {
            children_index[parent].push(index);
        }
    }

    // Pre-order traversal from the anchor. Nodes unreachable from it are ignored.
    let mut pre_order = Vec::with_capacity(nodes.len());
    let mut stack = vec![anchor];

    while let Some(index) = stack.pop() {
        pre_order.push(index);
        stack.extend(children_index[index].iter().rev());
    }

    let mut is_canonical = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            index == canonical_head_index || node.best_descendant == Some(canonical_head_index)
        })
        .collect::<Vec<_>>();

    for index in pre_order.iter().copied() {
        if let [only_child] = children_index[index].as_slice() {
            if is_canonical[index] {
                is_canonical[*only_child] = true;
            }
        }
    }

    // Children always come after their parent in pre-order,
    // so walking it backwards materializes every subtree before it is attached.
    let mut materialized = core::iter::repeat_with(|| None)
        .take(nodes.len())
        .collect::<Vec<Option<ForkChoiceNode>>>();

    for index in pre_order.iter().rev().copied() {
        let mut node = ForkChoiceNode::from_proto_node(&nodes[index], is_canonical[index]);

        node.children = children_index[index]
            .iter()
            .filter_map(|child| materialized[*child].take())
            .collect();

        materialized[index] = Some(node);
    }

    materialized[anchor].take().ok_or(Error::MissingAnchor)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use itertools::Itertools as _;
    use serde_json::json;
    use test_case::test_case;

    use crate::test_utils::{proto_node, root_of};

    use super::*;

    fn slots<'tree>(nodes: impl IntoIterator<Item = &'tree ForkChoiceNode>) -> Vec<&'tree str> {
        nodes.into_iter().map(|node| node.slot.as_str()).collect()
    }

    fn canonical_slots(tree: &ForkChoiceNode) -> Vec<&str> {
        slots(tree.iter().filter(|node| node.is_canonical))
    }

    #[test]
    fn builds_tree_with_fork() -> Result<()> {
        let nodes = [
            proto_node("0", None, Some(2)),
            proto_node("1", Some(0), Some(2)),
            proto_node("2", Some(1), None),
            proto_node("3", Some(0), None),
        ];

        let tree = roll_proto_array(&nodes, 2)?;

        let expected = ForkChoiceNode {
            children: vec![
                ForkChoiceNode {
                    children: vec![ForkChoiceNode {
                        children: vec![],
                        slot: "2".to_owned(),
                        root: root_of("2"),
                        weight: 0.0,
                        is_canonical: true,
                        count_collapsed_blocks: 0,
                    }],
                    slot: "1".to_owned(),
                    root: root_of("1"),
                    weight: 0.0,
                    is_canonical: true,
                    count_collapsed_blocks: 0,
                },
                ForkChoiceNode {
                    children: vec![],
                    slot: "3".to_owned(),
                    root: root_of("3"),
                    weight: 0.0,
                    is_canonical: false,
                    count_collapsed_blocks: 0,
                },
            ],
            slot: "0".to_owned(),
            root: root_of("0"),
            weight: 0.0,
            is_canonical: true,
            count_collapsed_blocks: 0,
        };

        assert_eq!(tree, expected);

        Ok(())
    }

    #[test]
    fn unmarked_nodes_stay_non_canonical() -> Result<()> {
        // Nothing points at the head, and the head is not reachable through single children.
        let nodes = [
            proto_node("0", None, None),
            proto_node("1", Some(0), None),
            proto_node("2", Some(1), None),
            proto_node("3", Some(0), None),
        ];

        let tree = roll_proto_array(&nodes, 7)?;

        assert!(canonical_slots(&tree).is_empty());
        assert_eq!(slots(&tree.children), ["1", "3"]);

        Ok(())
    }

    #[test]
    fn propagates_canonical_flag_down_single_children() -> Result<()> {
        // Only the anchor is marked. Everything below it is a single chain.
        let nodes = [
            proto_node("10", None, Some(99)),
            proto_node("11", Some(0), None),
            proto_node("12", Some(1), None),
            proto_node("13", Some(2), None),
        ];

        let tree = roll_proto_array(&nodes, 99)?;

        assert_eq!(canonical_slots(&tree), ["10", "11", "12", "13"]);

        Ok(())
    }

    #[test]
    fn does_not_propagate_past_fork() -> Result<()> {
        let nodes = [
            proto_node("0", None, Some(99)),
            proto_node("1", Some(0), None),
            proto_node("1", Some(0), None),
        ];

        let tree = roll_proto_array(&nodes, 99)?;

        assert_eq!(canonical_slots(&tree), ["0"]);

        Ok(())
    }

    #[test]
    fn keeps_children_in_array_order() -> Result<()> {
        let nodes = [
            proto_node("0", None, None),
            proto_node("5", Some(0), None),
            proto_node("2", Some(0), None),
            proto_node("9", Some(0), None),
            proto_node("3", Some(0), None),
        ];

        let tree = roll_proto_array(&nodes, 0)?;

        assert_eq!(slots(&tree.children), ["5", "2", "9", "3"]);

        Ok(())
    }

    #[test]
    fn roots_tree_at_parentless_entry() -> Result<()> {
        let nodes = [
            proto_node("1", Some(1), Some(0)),
            proto_node("0", None, Some(0)),
        ];

        let tree = roll_proto_array(&nodes, 0)?;

        assert_eq!(tree.slot, "0");
        assert_eq!(slots(&tree.children), ["1"]);
        assert_eq!(canonical_slots(&tree), ["0", "1"]);

        Ok(())
    }

    #[test]
    fn rejects_empty_proto_array() {
        assert_eq!(roll_proto_array(&[], 0), Err(Error::EmptyProtoArray));
    }

    #[test]
    fn builds_deep_chain_without_recursion() -> Result<()> {
        let length = 100_000_usize;

        let nodes = (0..length)
            .map(|index| {
                let parent = index.checked_sub(1);
                proto_node(&index.to_string(), parent, Some(length - 1))
            })
            .collect_vec();

        let tree = roll_proto_array(&nodes, length - 1)?;

        assert_eq!(tree.node_count(), length);
        assert_eq!(tree.canonical_path().len(), length);

        Ok(())
    }

    // Sizes of every subtree must add up to the input length,
    // and every non-anchor node must be some node's child exactly once.
    #[test_case(&[None]; "anchor only")]
    #[test_case(&[None, Some(0), Some(1), Some(0)]; "fork at anchor")]
    #[test_case(&[None, Some(0), Some(0), Some(1), Some(1), Some(2), Some(5), Some(6)]; "nested forks")]
    #[test_case(&[Some(3), Some(0), Some(3), None, Some(2)]; "parents after children")]
    fn conserves_node_count(parents: &[Option<usize>]) -> Result<()> {
        let nodes = parents
            .iter()
            .enumerate()
            .map(|(index, parent)| proto_node(&index.to_string(), *parent, None))
            .collect_vec();

        let tree = roll_proto_array(&nodes, 0)?;
        let child_count = tree.iter().map(|node| node.children.len()).sum::<usize>();

        assert_eq!(tree.node_count(), nodes.len());
        assert_eq!(child_count, nodes.len() - 1);

        let mut roots = tree.iter().map(|node| node.root.as_str()).collect_vec();
        roots.sort_unstable();
        roots.dedup();

        assert_eq!(roots.len(), nodes.len());

        Ok(())
    }

    // The canonical nodes form one contiguous path from the anchor to the head,
    // and no canonical node has a canonical sibling.
    #[test_case(&[None, Some(0), Some(1), Some(0)], 2)]
    #[test_case(&[None, Some(0), Some(0), Some(1), Some(1), Some(2), Some(5), Some(6)], 7)]
    #[test_case(&[None, Some(0), Some(0), Some(1), Some(1), Some(2), Some(5), Some(6)], 4)]
    #[test_case(&[None, Some(0), Some(1), Some(2)], 3)]
    fn canonical_path_is_contiguous(parents: &[Option<usize>], head: usize) -> Result<()> {
        let ancestors = core::iter::successors(Some(head), |index| parents[*index]).collect_vec();

        let nodes = parents
            .iter()
            .enumerate()
            .map(|(index, parent)| {
                let best_descendant = (ancestors.contains(&index) && index != head).then_some(head);
                proto_node(&index.to_string(), *parent, best_descendant)
            })
            .collect_vec();

        let tree = roll_proto_array(&nodes, head)?;
        let path = tree.canonical_path();

        assert_eq!(path.len(), ancestors.len());
        assert_eq!(path.last().map(|node| &node.root), Some(&nodes[head].root));
        assert_eq!(canonical_slots(&tree).len(), path.len());

        for node in tree.iter() {
            assert!(node.children.iter().filter(|child| child.is_canonical).count() <= 1);
        }

        Ok(())
    }

    #[test]
    fn omits_zero_collapsed_block_count() -> Result<()> {
        let mut node = ForkChoiceNode {
            children: vec![],
            slot: "3".to_owned(),
            root: "0x03".to_owned(),
            weight: 12.0,
            is_canonical: true,
            count_collapsed_blocks: 0,
        };

        assert_eq!(
            serde_json::to_value(&node)?,
            json!({
                "children": [],
                "slot": "3",
                "root": "0x03",
                "weight": 12.0,
                "is_canonical": true,
            }),
        );

        node.count_collapsed_blocks = 5;

        assert_eq!(serde_json::to_value(&node)?["count_collapsed_blocks"], json!(5));

        Ok(())
    }
}
