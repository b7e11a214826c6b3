use core::time::Duration;

use clock::{SlotClock, UnixSeconds};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(1);

/// Chain parameters of the monitored network.
///
/// Served unchanged by the `/spec` endpoint.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct Eth2Config {
    pub seconds_per_slot: u64,
    pub genesis_time: UnixSeconds,
    pub slots_per_epoch: u64,
    pub network: String,
}

impl Eth2Config {
    pub fn slot_clock(&self) -> Result<SlotClock, clock::Error> {
        SlotClock::new(
            self.genesis_time,
            self.seconds_per_slot,
            self.slots_per_epoch,
        )
    }
}

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub endpoints: Vec<Url>,
    pub clock: SlotClock,
    pub polling_interval: Duration,
    pub compact_fork_choice: bool,
}

impl MonitorConfig {
    #[must_use]
    pub const fn new(endpoints: Vec<Url>, clock: SlotClock) -> Self {
        Self {
            endpoints,
            clock,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            compact_fork_choice: false,
        }
    }
}
