//! HTTP client for the beacon nodes watched by the fork monitor.
//!
//! Most endpoints are part of the standard Beacon Node API.
//! Fork choice data and participation rates come from Lighthouse-specific endpoints.
//! Heads and versions are fetched through [`NodeApi`], which has one implementation per
//! client flavor because older Prysm and Nimbus releases do not serve the standard endpoints.

pub use crate::{
    beacon_api::{BeaconApi, Checkpoint, FinalityCheckpoints, Participation, ParticipationPair},
    error::Error,
    node_api::{decode_prysm_root, Flavor, HeadRef, NimbusApi, NodeApi, PrysmApi, StandardApi},
    registration::{id_hash_of, register, Registration},
};

mod beacon_api;
mod error;
mod node_api;
mod registration;
