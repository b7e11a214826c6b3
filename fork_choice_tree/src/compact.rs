use crate::tree::ForkChoiceNode;

/// Collapses chains of single-child blocks so that only the root, fork points, and leaves remain.
///
/// A node with exactly one child is linked directly to the first descendant that is a leaf or
/// a fork point. The number of blocks skipped is added to its `count_collapsed_blocks`.
/// The input is left untouched.
#[must_use]
pub fn compact_single_children(node: &ForkChoiceNode) -> ForkChoiceNode {
    let mut count_collapsed_blocks = node.count_collapsed_blocks;

    let children = match node.children.as_slice() {
        [only_child] => {
            let mut child = only_child;

            while let [grandchild] = child.children.as_slice() {
                child = grandchild;
                count_collapsed_blocks += 1;
            }

            vec![compact_single_children(child)]
        }
        children => children.iter().map(compact_single_children).collect(),
    };

    ForkChoiceNode {
        children,
        slot: node.slot.clone(),
        root: node.root.clone(),
        weight: node.weight,
        is_canonical: node.is_canonical,
        count_collapsed_blocks,
    }
}
