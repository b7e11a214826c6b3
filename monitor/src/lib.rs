//! Polls a set of beacon nodes and maintains the fork choice snapshot served by the HTTP API.

pub use crate::{
    config::{Eth2Config, MonitorConfig, DEFAULT_POLLING_INTERVAL},
    monitor::Monitor,
    node::{Node, NodeHead},
    snapshot::ForkChoiceSnapshot,
};

mod config;
mod monitor;
mod node;
mod snapshot;
