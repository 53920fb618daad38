//! Bit-mask output sink.
//!
//! The LED port is one word; each handler owns a disjoint set of bits and
//! only ever touches those, so a write from one handler carries the other
//! handlers' bits through unchanged.

/// Shadow of the output port value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedMask {
    bits: u32,
}

impl LedMask {
    pub fn new(bits: u32) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn assert(&mut self, mask: u32) {
        self.bits |= mask;
    }

    pub fn deassert(&mut self, mask: u32) {
        self.bits &= !mask;
    }

    /// Drive every bit of `mask` high when `on`, low otherwise.
    pub fn update(&mut self, on: bool, mask: u32) {
        if on {
            self.assert(mask);
        } else {
            self.deassert(mask);
        }
    }

    /// Flip every bit of `mask`; returns whether they are now high.
    pub fn toggle(&mut self, mask: u32) -> bool {
        self.bits ^= mask;
        self.bits & mask == mask
    }

    /// Bits of `mask` that are currently high.
    pub fn owned(&self, mask: u32) -> u32 {
        self.bits & mask
    }
}
