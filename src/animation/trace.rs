//! Bounded history of a tracked body's positions.

use std::collections::VecDeque;

use crate::geometry::Point2;

/// Fixed-capacity FIFO of recent points.
///
/// Once full, each push evicts the oldest point, so the buffer always holds
/// the most recent `min(pushed, capacity)` points in chronological order.
#[derive(Debug, Clone)]
pub struct TraceBuffer {
    capacity: usize,
    points: VecDeque<Point2>,
}

impl TraceBuffer {
    /// Capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, point: Point2) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn points(&self) -> impl ExactSizeIterator<Item = &Point2> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<Point2> {
        self.points.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
