use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::clock::SharedClock;
use crate::error::Result;

use super::protocol::Payload;

#[derive(Debug)]
struct DelayedMessage {
    deliver_at: Duration,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub sent: u64,
    pub delivered: u64,
}

/// One direction of a simulated connection. Messages become readable once
/// their delay has elapsed and are handed out in the order they were sent.
///
/// Payloads travel as encoded bytes, so every receiver decodes its own copy.
pub struct LagNetwork {
    clock: SharedClock,
    messages: VecDeque<DelayedMessage>,
    stats: NetworkStats,
}

impl LagNetwork {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            messages: VecDeque::new(),
            stats: NetworkStats::default(),
        }
    }

    pub fn send(&mut self, delay: Duration, payload: impl Into<Payload>) -> Result<()> {
        let bytes = payload.into().encode()?;
        let deliver_at = self.clock.now() + delay;
        self.messages.push_back(DelayedMessage { deliver_at, bytes });
        self.stats.sent += 1;
        Ok(())
    }

    /// First message in send order whose delivery time has passed.
    ///
    /// With a constant delay per link this is the same as delivery order. Under
    /// variable delay a later message with a shorter delay can overtake an
    /// earlier one that is not ready yet.
    ///
    /// A message that fails to decode is still consumed.
    pub fn receive(&mut self) -> Result<Option<Payload>> {
        let now = self.clock.now();
        let Some(index) = self.messages.iter().position(|m| m.deliver_at <= now) else {
            return Ok(None);
        };
        let Some(message) = self.messages.remove(index) else {
            return Ok(None);
        };
        self.stats.delivered += 1;
        Payload::decode(&message.bytes).map(Some)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn stats(&self) -> NetworkStats {
        self.stats
    }
}

/// Shared handle to a [`LagNetwork`]. Clones refer to the same queue.
#[derive(Clone)]
pub struct LinkHandle(Rc<RefCell<LagNetwork>>);

impl LinkHandle {
    pub fn new(clock: SharedClock) -> Self {
        Self(Rc::new(RefCell::new(LagNetwork::new(clock))))
    }

    pub fn send(&self, delay: Duration, payload: impl Into<Payload>) -> Result<()> {
        self.0.borrow_mut().send(delay, payload)
    }

    pub fn receive(&self) -> Result<Option<Payload>> {
        self.0.borrow_mut().receive()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn stats(&self) -> NetworkStats {
        self.0.borrow().stats()
    }
}
