//! Typed view of the `/lighthouse/proto_array` response.
//!
//! Indices in a proto array are only meaningful within a single response.
//! They must not be stored across poll cycles.

use clock::Slot;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct ProtoArrayNode {
    pub slot: String,
    pub root: String,
    #[serde(default)]
    pub parent: Option<usize>,
    pub weight: f64,
    #[serde(default)]
    pub best_descendant: Option<usize>,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct ProtoArrayResponse {
    pub data: ProtoArrayData,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct ProtoArrayData {
    pub nodes: Vec<ProtoArrayNode>,
}

impl ProtoArrayResponse {
    #[must_use]
    pub fn into_nodes(self) -> Vec<ProtoArrayNode> {
        self.data.nodes
    }
}

/// Checks the structural invariants of a proto array and returns the index of its anchor.
///
/// The anchor is the first node without a parent.
pub fn validate(nodes: &[ProtoArrayNode]) -> Result<usize, Error> {
    if nodes.is_empty() {
        return Err(Error::EmptyProtoArray);
    }

    let length = nodes.len();
    let mut anchor = None;

    for (index, node) in nodes.iter().enumerate() {
        if node.slot.parse::<Slot>().is_err() {
            return Err(Error::InvalidSlot {
                index,
                slot: node.slot.clone(),
            });
        }

        match node.parent {
            Some(parent) if parent >= length => {
                return Err(Error::ParentIndexOutOfBounds {
                    index,
                    parent,
                    length,
                })
            }
            Some(parent) if parent == index => return Err(Error::SelfParent { index }),
            Some(_) => {}
            None => {
                anchor.get_or_insert(index);
            }
        }
    }

    anchor.ok_or(Error::MissingAnchor)
}

/// Index of the block the anchor currently considers the head.
///
/// Lighthouse leaves `best_descendant` unset when a node is its own best descendant,
/// which is only possible for the anchor when it is the only block in the array.
pub fn head_index(nodes: &[ProtoArrayNode]) -> Result<usize, Error> {
    let anchor = nodes.first().ok_or(Error::EmptyProtoArray)?;
    Ok(anchor.best_descendant.unwrap_or(0))
}

/// Weight of the anchor, which accumulates every vote in the tracked window.
pub fn total_weight(nodes: &[ProtoArrayNode]) -> Result<f64, Error> {
    nodes
        .first()
        .map(|anchor| anchor.weight)
        .ok_or(Error::EmptyProtoArray)
}
