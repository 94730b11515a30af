use std::cell::Cell;
use std::rc::Rc;

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct MoveKeys: u8 {
        const NEGATIVE = 1 << 0;
        const POSITIVE = 1 << 1;
    }
}

impl MoveKeys {
    /// Direction to move in, positive winning when both keys are held.
    pub fn direction(self) -> Option<f32> {
        if self.contains(MoveKeys::POSITIVE) {
            Some(1.0)
        } else if self.contains(MoveKeys::NEGATIVE) {
            Some(-1.0)
        } else {
            None
        }
    }
}

pub trait InputSource {
    fn sample(&self) -> MoveKeys;
}

/// Key state written by the host and sampled by a client.
#[derive(Debug, Clone, Default)]
pub struct HeldKeys(Rc<Cell<MoveKeys>>);

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, keys: MoveKeys) {
        self.0.set(keys);
    }

    pub fn press(&self, keys: MoveKeys) {
        self.0.set(self.0.get() | keys);
    }

    pub fn release(&self, keys: MoveKeys) {
        self.0.set(self.0.get() - keys);
    }

    pub fn get(&self) -> MoveKeys {
        self.0.get()
    }
}

impl InputSource for HeldKeys {
    fn sample(&self) -> MoveKeys {
        self.0.get()
    }
}
