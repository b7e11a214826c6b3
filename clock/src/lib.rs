//! Slot and epoch arithmetic for a beacon chain, measured against wall clock time.
//!
//! Slots are counted from `genesis_time` in whole multiples of `seconds_per_slot`.
//! Times before genesis belong to slot 0.
//!
//! The current time is read through [`SystemTimeLike`] so that tests can substitute a fake clock.
//! Waiting is done with [`tokio::time::sleep`], which lets tests run with paused time.

use core::{error::Error as StdError, num::NonZeroU64, time::Duration};
use std::time::{SystemTime, SystemTimeError};

use anyhow::Result;
use thiserror::Error;

#[cfg(test)]
mod fake_time;

pub type UnixSeconds = u64;
pub type Slot = u64;
pub type Epoch = u64;

pub trait SystemTimeLike: Copy {
    type Error: StdError + Send + Sync + 'static;

    const UNIX_EPOCH: Self;

    fn duration_since(self, earlier: Self) -> Result<Duration, Self::Error>;
}

impl SystemTimeLike for SystemTime {
    type Error = SystemTimeError;

    const UNIX_EPOCH: Self = Self::UNIX_EPOCH;

    fn duration_since(self, earlier: Self) -> Result<Duration, Self::Error> {
        Self::duration_since(&self, earlier)
    }
}

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum Error {
    #[error("seconds_per_slot must be greater than zero")]
    ZeroSecondsPerSlot,
    #[error("slots_per_epoch must be greater than zero")]
    ZeroSlotsPerEpoch,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SlotClock {
    genesis_time: UnixSeconds,
    seconds_per_slot: NonZeroU64,
    slots_per_epoch: NonZeroU64,
}

impl SlotClock {
    pub fn new(
        genesis_time: UnixSeconds,
        seconds_per_slot: u64,
        slots_per_epoch: u64,
    ) -> Result<Self, Error> {
        let seconds_per_slot = NonZeroU64::new(seconds_per_slot).ok_or(Error::ZeroSecondsPerSlot)?;
        let slots_per_epoch = NonZeroU64::new(slots_per_epoch).ok_or(Error::ZeroSlotsPerEpoch)?;

        Ok(Self {
            genesis_time,
            seconds_per_slot,
            slots_per_epoch,
        })
    }

    #[must_use]
    pub const fn genesis_time(self) -> UnixSeconds {
        self.genesis_time
    }

    #[must_use]
    pub const fn seconds_per_slot(self) -> NonZeroU64 {
        self.seconds_per_slot
    }

    #[must_use]
    pub const fn slots_per_epoch(self) -> NonZeroU64 {
        self.slots_per_epoch
    }

    #[must_use]
    pub const fn slot_at(self, time: UnixSeconds) -> Slot {
        time.saturating_sub(self.genesis_time) / self.seconds_per_slot.get()
    }

    #[must_use]
    pub const fn epoch_at_slot(self, slot: Slot) -> Epoch {
        slot / self.slots_per_epoch.get()
    }

    #[must_use]
    pub const fn epoch_at(self, time: UnixSeconds) -> Epoch {
        self.epoch_at_slot(self.slot_at(time))
    }

    #[must_use]
    pub const fn start_of_epoch(self, epoch: Epoch) -> Slot {
        epoch.saturating_mul(self.slots_per_epoch.get())
    }

    #[must_use]
    pub fn duration_until_next_slot(self, since_unix_epoch: Duration) -> Duration {
        let genesis = Duration::from_secs(self.genesis_time);

        if since_unix_epoch < genesis {
            return genesis - since_unix_epoch;
        }

        let next_slot = self.slot_at(since_unix_epoch.as_secs()).saturating_add(1);

        let next_slot_start = next_slot
            .saturating_mul(self.seconds_per_slot.get())
            .saturating_add(self.genesis_time);

        Duration::from_secs(next_slot_start).saturating_sub(since_unix_epoch)
    }

    pub fn current_slot(self) -> Result<Slot> {
        unix_time_now().map(|now| self.slot_at(now))
    }

    pub fn current_epoch(self) -> Result<Epoch> {
        unix_time_now().map(|now| self.epoch_at(now))
    }

    pub async fn wait_until_next_slot(self) -> Result<()> {
        self.wait_until_next_slot_from(SystemTime::now()).await
    }

    async fn wait_until_next_slot_from<T: SystemTimeLike>(self, now: T) -> Result<()> {
        let delay = self.duration_until_next_slot(duration_since_unix_epoch(now)?);
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

pub fn duration_since_unix_epoch<T: SystemTimeLike>(time: T) -> Result<Duration> {
    time.duration_since(T::UNIX_EPOCH).map_err(Into::into)
}

pub fn unix_time_now() -> Result<UnixSeconds> {
    duration_since_unix_epoch(SystemTime::now()).map(|duration| duration.as_secs())
}
