use beacon_api::{Checkpoint, ParticipationPair};
use fork_choice_tree::ForkChoiceNode;

/// Everything the fork choice endpoints serve, published atomically after each rebuild.
///
/// The default snapshot has an empty tree and is served until the first rebuild succeeds,
/// or forever if no node can provide a proto array.
#[derive(Clone, PartialEq, Default, Debug)]
pub struct ForkChoiceSnapshot {
    pub block_tree: ForkChoiceNode,
    pub total_weight: f64,
    pub justified_checkpoint: Option<Checkpoint>,
    pub finalized_checkpoint: Option<Checkpoint>,
    pub participation: Option<ParticipationPair>,
}
