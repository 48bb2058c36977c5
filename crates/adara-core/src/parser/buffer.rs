//! Byte arena backing the parser.
//!
//! Layout of the arena:
//!
//! ```text
//! 0          consumed          filled          capacity     max_capacity
//! |  parsed  |   unconsumed    |    writable    |
//! ```
//!
//! `compact` and `grow` are the only operations that move bytes.

use super::error::ParserError;

#[derive(Debug)]
pub(crate) struct RawBuffer {
    data: Vec<u8>,
    consumed: usize,
    filled: usize,
    max_capacity: usize,
}

impl RawBuffer {
    pub(crate) fn new(initial_capacity: usize, max_capacity: usize) -> Self {
        Self {
            data: vec![0; initial_capacity.min(max_capacity)],
            consumed: 0,
            filled: 0,
            max_capacity,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    #[cfg(test)]
    pub(crate) fn consumed(&self) -> usize {
        self.consumed
    }

    pub(crate) fn available(&self) -> usize {
        self.filled - self.consumed
    }

    pub(crate) fn unconsumed(&self) -> &[u8] {
        &self.data[self.consumed..self.filled]
    }

    pub(crate) fn writable(&self) -> usize {
        self.capacity() - self.filled
    }

    /// Writable tail; empty only when the arena is full and cannot grow.
    pub(crate) fn tail_mut(&mut self) -> &mut [u8] {
        if self.writable() == 0 {
            if self.consumed > 0 {
                self.compact();
            } else if self.capacity() < self.max_capacity {
                let target = self.capacity().saturating_mul(2).min(self.max_capacity);
                self.resize(target);
            }
        }
        &mut self.data[self.filled..]
    }

    pub(crate) fn commit(&mut self, n: usize) -> Result<(), ParserError> {
        let available = self.writable();
        if n > available {
            return Err(ParserError::Overflow {
                requested: n,
                available,
            });
        }
        self.filled += n;
        Ok(())
    }

    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.available());
        self.consumed = (self.consumed + n).min(self.filled);
    }

    /// Shifts unconsumed bytes to offset 0.
    pub(crate) fn compact(&mut self) {
        if self.consumed == 0 {
            return;
        }
        self.data.copy_within(self.consumed..self.filled, 0);
        self.filled -= self.consumed;
        self.consumed = 0;
    }

    /// Compacts, then grows so at least `needed` bytes fit from offset 0.
    pub(crate) fn grow(&mut self, needed: usize) -> Result<(), ParserError> {
        if needed > self.max_capacity {
            return Err(ParserError::InvariantViolated(
                "growth requested beyond max capacity",
            ));
        }
        self.compact();
        if needed > self.capacity() {
            let target = needed
                .max(self.capacity().saturating_mul(2))
                .min(self.max_capacity);
            tracing::debug!(
                from = self.capacity(),
                to = target,
                "growing parser buffer"
            );
            self.resize(target);
        }
        Ok(())
    }

    fn resize(&mut self, capacity: usize) {
        self.data.resize(capacity, 0);
    }

    pub(crate) fn clear(&mut self) {
        self.consumed = 0;
        self.filled = 0;
    }

    pub(crate) fn check(&self) -> Result<(), ParserError> {
        if self.consumed > self.filled {
            return Err(ParserError::InvariantViolated("consumed exceeds filled"));
        }
        if self.filled > self.capacity() {
            return Err(ParserError::InvariantViolated("filled exceeds capacity"));
        }
        if self.capacity() > self.max_capacity {
            return Err(ParserError::InvariantViolated(
                "capacity exceeds max capacity",
            ));
        }
        Ok(())
    }
}
