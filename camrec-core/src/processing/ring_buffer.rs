use std::collections::VecDeque;

/// Bounded FIFO of mixed mono samples.
///
/// The gain stage writes into it from the device's audio thread and the
/// encoder drains it once per timeslice; share it as
/// `Arc<parking_lot::Mutex<RingBuffer>>`. When full, the oldest samples are
/// evicted and counted in [`RingBuffer::dropped`].
#[derive(Debug)]
pub struct RingBuffer {
    samples: VecDeque<f32>,
    capacity: usize,
    dropped: u64,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append samples, evicting the oldest ones if the buffer is full.
    pub fn write(&mut self, samples: &[f32]) {
        let skip = samples.len().saturating_sub(self.capacity);
        let incoming = &samples[skip..];

        let evict = (self.samples.len() + incoming.len()).saturating_sub(self.capacity);
        self.samples.drain(..evict);
        self.dropped += (skip + evict) as u64;

        self.samples.extend(incoming.iter().copied());
    }

    /// Remove and return everything buffered, oldest first.
    pub fn drain(&mut self) -> Vec<f32> {
        self.samples.drain(..).collect()
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples evicted by overflow since creation or the last reset.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.dropped = 0;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_drain() {
        let mut buf = RingBuffer::new(10);
        buf.write(&[0.1, 0.2, 0.3]);

        assert_eq!(buf.count(), 3);
        assert_eq!(buf.drain(), vec![0.1, 0.2, 0.3]);
        assert!(buf.is_empty());
    }

    #[test]
    fn successive_writes_drain_in_order() {
        let mut buf = RingBuffer::new(10);
        buf.write(&[1.0, 2.0]);
        buf.write(&[3.0]);

        assert_eq!(buf.drain(), vec![1.0, 2.0, 3.0]);
        assert!(buf.drain().is_empty());
    }

    #[test]
    fn overflow_evicts_oldest_and_counts_them() {
        let mut buf = RingBuffer::new(4);
        buf.write(&[1.0, 2.0, 3.0, 4.0]);
        buf.write(&[5.0, 6.0]);

        assert_eq!(buf.dropped(), 2);
        assert_eq!(buf.drain(), vec![3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn oversized_write_keeps_tail() {
        let mut buf = RingBuffer::new(3);
        buf.write(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(buf.dropped(), 2);
        assert_eq!(buf.drain(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn refills_after_drain() {
        let mut buf = RingBuffer::new(4);
        buf.write(&[1.0, 2.0, 3.0]);
        buf.drain();
        buf.write(&[4.0, 5.0, 6.0, 7.0]);

        assert_eq!(buf.drain(), vec![4.0, 5.0, 6.0, 7.0]);
        assert_eq!(buf.dropped(), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut buf = RingBuffer::new(2);
        buf.write(&[1.0, 2.0, 3.0]);
        buf.reset();

        assert!(buf.is_empty());
        assert_eq!(buf.dropped(), 0);
        assert!(buf.drain().is_empty());
    }

    #[test]
    fn zero_capacity_is_promoted() {
        let mut buf = RingBuffer::new(0);
        buf.write(&[7.0]);
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.drain(), vec![7.0]);
    }
}
