//! Per-topic message position allocation.

/// Allocates strictly increasing `(timestamp_millis, sequence_id)` positions
/// for one topic generation.
///
/// One allocator exists per topic, protected by the topic's writer lock. The
/// wall clock is only trusted when it is ahead of the last issued position;
/// on a stall or regression the allocator keeps the last timestamp and bumps
/// the sequence instead, overflowing into the next millisecond when the
/// sequence space is exhausted.
#[derive(Debug)]
pub struct SequenceAllocator {
    generation: i32,
    last_timestamp_millis: i64,
    last_sequence_id: u16,
}

impl SequenceAllocator {
    /// Allocator for a generation with no persisted positions.
    pub fn new(generation: i32) -> Self {
        Self::seeded(generation, None)
    }

    /// Allocator seeded from the highest position already persisted for the
    /// generation, so a restart can never re-issue a used position.
    pub fn seeded(generation: i32, last: Option<(i64, u16)>) -> Self {
        let (last_timestamp_millis, last_sequence_id) = last.unwrap_or((i64::MIN, u16::MAX));
        Self {
            generation,
            last_timestamp_millis,
            last_sequence_id,
        }
    }

    pub fn generation(&self) -> i32 {
        self.generation
    }

    /// Issues the next position given the current wall-clock reading.
    pub fn next(&mut self, now_millis: i64) -> (i64, u16) {
        if now_millis > self.last_timestamp_millis {
            self.last_timestamp_millis = now_millis;
            self.last_sequence_id = 0;
        } else if self.last_sequence_id == u16::MAX {
            // Sequence space exhausted within this millisecond; borrow the
            // next one. The clock will catch up.
            self.last_timestamp_millis += 1;
            self.last_sequence_id = 0;
        } else {
            self.last_sequence_id += 1;
        }
        (self.last_timestamp_millis, self.last_sequence_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advancing_clock_resets_sequence() {
        let mut alloc = SequenceAllocator::new(1);
        assert_eq!(alloc.next(100), (100, 0));
        assert_eq!(alloc.next(100), (100, 1));
        assert_eq!(alloc.next(250), (250, 0));
    }

    #[test]
    fn test_clock_regression_keeps_positions_increasing() {
        let mut alloc = SequenceAllocator::new(1);
        assert_eq!(alloc.next(200), (200, 0));
        assert_eq!(alloc.next(150), (200, 1));
        assert_eq!(alloc.next(199), (200, 2));
    }

    #[test]
    fn test_sequence_overflow_borrows_next_millisecond() {
        let mut alloc = SequenceAllocator::seeded(1, Some((100, u16::MAX)));
        assert_eq!(alloc.next(100), (101, 0));
        assert_eq!(alloc.next(100), (101, 1));
    }

    #[test]
    fn test_seeded_allocator_continues_after_persisted_position() {
        let mut alloc = SequenceAllocator::seeded(3, Some((500, 7)));
        assert_eq!(alloc.next(500), (500, 8));

        let mut alloc = SequenceAllocator::seeded(3, Some((500, 7)));
        assert_eq!(alloc.next(600), (600, 0));
    }

    #[test]
    fn test_fresh_allocator_uses_wall_clock() {
        let mut alloc = SequenceAllocator::new(1);
        assert_eq!(alloc.next(42), (42, 0));
    }
}
