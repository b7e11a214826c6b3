//! Logging macros that prefix every message with how many monitored nodes are responding.

use core::sync::atomic::{AtomicUsize, Ordering};

use derive_more::Display;

pub static NODE_LOG_METRICS: NodeLogMetrics = NodeLogMetrics::new();

#[derive(Display, Debug)]
#[display("nodes: {healthy_node_count:?}/{node_count:?}")]
pub struct NodeLogMetrics {
    healthy_node_count: AtomicUsize,
    node_count: AtomicUsize,
}

impl NodeLogMetrics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            healthy_node_count: AtomicUsize::new(0),
            node_count: AtomicUsize::new(0),
        }
    }

    pub fn set_healthy_node_count(&self, healthy_node_count: usize) {
        self.healthy_node_count
            .store(healthy_node_count, Ordering::Relaxed)
    }

    pub fn set_node_count(&self, node_count: usize) {
        self.node_count.store(node_count, Ordering::Relaxed)
    }
}

impl Default for NodeLogMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[macro_export]
macro_rules! info_with_nodes {
    ($($arg:tt)*) => {
        ::tracing::info!("[{}] {}", $crate::NODE_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! debug_with_nodes {
    ($($arg:tt)*) => {
        ::tracing::debug!("[{}] {}", $crate::NODE_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! warn_with_nodes {
    ($($arg:tt)*) => {
        ::tracing::warn!("[{}] {}", $crate::NODE_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! error_with_nodes {
    ($($arg:tt)*) => {
        ::tracing::error!("[{}] {}", $crate::NODE_LOG_METRICS, format_args!($($arg)*));
    };
}
