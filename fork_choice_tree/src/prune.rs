use clock::{Epoch, Slot, SlotClock, UnixSeconds};
use log::warn;

use crate::tree::ForkChoiceNode;

pub const EPOCHS_TO_SEND: Epoch = 4;

/// The span of recent history kept by [`prune_for_browser`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PruneWindow {
    pub clock: SlotClock,
    pub epochs_to_send: Epoch,
}

impl PruneWindow {
    #[must_use]
    pub const fn new(clock: SlotClock) -> Self {
        Self {
            clock,
            epochs_to_send: EPOCHS_TO_SEND,
        }
    }

    /// First slot of the oldest epoch still inside the window at `now`.
    #[must_use]
    pub const fn target_slot(self, now: UnixSeconds) -> Slot {
        let target_epoch = self
            .clock
            .epoch_at(now)
            .saturating_sub(self.epochs_to_send);

        self.clock.start_of_epoch(target_epoch)
    }
}

/// Walks down the canonical chain from `tree` and returns the first block inside the window.
///
/// The walk stops early at a leaf, at a node without a canonical child,
/// or at a node whose slot cannot be parsed. In each of those cases the node reached so far
/// is returned. The returned node is always reachable from `tree` through canonical children.
#[must_use]
pub fn prune_for_browser(
    tree: &ForkChoiceNode,
    window: PruneWindow,
    now: UnixSeconds,
) -> &ForkChoiceNode {
    let target_slot = window.target_slot(now);
    let mut node = tree;

    loop {
        let slot = match node.slot.parse::<Slot>() {
            Ok(slot) => slot,
            Err(error) => {
                warn!("stopped pruning at block with invalid slot {:?}: {error}", node.slot);
                return node;
            }
        };

        if slot >= target_slot || node.is_leaf() {
            return node;
        }

        match node.children.iter().find(|child| child.is_canonical) {
            Some(child) => node = child,
            None => {
                warn!(
                    "stopped pruning at block {} in slot {slot} with no canonical child",
                    node.root,
                );

                return node;
            }
        }
    }
}
