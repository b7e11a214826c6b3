//! Reconstruction of a fork choice block tree from a flat proto array.
//!
//! The data flows through the modules in this order:
//! [`roll_proto_array`] → [`compact_single_children`] (optional) → [`prune_for_browser`].
//! Every function here is pure and synchronous. None of them talk to the network or touch shared state.

pub use crate::{
    compact::compact_single_children,
    dot::{humanize_root, to_dot, Dot},
    error::Error,
    json::write_json,
    proto_array::{ProtoArrayNode, ProtoArrayResponse},
    prune::{prune_for_browser, PruneWindow, EPOCHS_TO_SEND},
    tree::{roll_proto_array, ForkChoiceNode},
};

pub mod proto_array;

mod compact;
mod dot;
mod error;
mod json;
mod prune;
mod tree;

#[cfg(test)]
mod test_utils;
