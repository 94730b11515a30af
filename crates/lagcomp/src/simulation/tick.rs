use std::time::Duration;

use crate::error::{Error, Result};

/// Gate that lets an owner's update run at most `tick_rate` times per second.
///
/// Unlike an accumulator it never runs catch-up ticks: a late poll runs one
/// update and schedules the next one a full interval after it.
#[derive(Debug, Clone)]
pub struct TickSchedule {
    tick_rate: u32,
    interval: Duration,
    next_due: Duration,
}

impl TickSchedule {
    pub fn new(tick_rate: u32) -> Result<Self> {
        if tick_rate == 0 {
            return Err(Error::InvalidTickRate { rate: tick_rate });
        }
        Ok(Self {
            tick_rate,
            interval: Duration::from_nanos(1_000_000_000 / u64::from(tick_rate)),
            next_due: Duration::ZERO,
        })
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn poll(&mut self, now: Duration) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = now + self.interval;
        true
    }
}
