// SPDX-License-Identifier: Apache-2.0

//! The circular buffer: length `before + 1`, each entry a
//! snapshot of every scalar channel's value plus sample coordinates.

use std::collections::VecDeque;

use daq_core::SourceTimestamp;

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub tick: u64,
    pub time: SourceTimestamp,
    pub values: Vec<f64>,
}

#[derive(Debug)]
pub struct CircularBuffer {
    capacity: usize,
    entries: VecDeque<Sample>,
}

impl CircularBuffer {
    /// `before` is the number of pre-trigger samples retained; the
    /// buffer holds `before + 1` entries so the trigger sample itself
    /// is always included.
    pub fn new(before: usize) -> Self {
        Self {
            capacity: before + 1,
            entries: VecDeque::with_capacity(before + 1),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.entries.iter()
    }

    /// Drops all buffered samples, per the inhibit-entry reset policy
    /// so a later resumption does not fire spuriously.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(tick: u64, value: f64) -> Sample {
        Sample {
            tick,
            time: SourceTimestamp::default(),
            values: vec![value],
        }
    }

    #[test]
    fn buffer_drops_oldest_once_full() {
        let mut buf = CircularBuffer::new(2); // capacity 3
        buf.push(sample(0, 1.0));
        buf.push(sample(1, 2.0));
        buf.push(sample(2, 3.0));
        buf.push(sample(3, 4.0));

        let ticks: Vec<u64> = buf.iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![1, 2, 3]);
    }

    #[test]
    fn clear_empties_the_buffer() {
        let mut buf = CircularBuffer::new(1);
        buf.push(sample(0, 1.0));
        buf.clear();
        assert!(buf.is_empty());
    }
}
