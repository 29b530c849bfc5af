//! Splitting an image list into fixed-size export batches.

use std::ops::Range;


/// Half-open index range `[low, high)` over the flattened image list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    pub low: usize,
    pub high: usize,
}

impl IndexRange {
    pub fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }

    /// Number of indices in the range.
    pub fn len(&self) -> usize {
        self.high - self.low
    }

    pub fn is_empty(&self) -> bool {
        self.low == self.high
    }

    /// The range as a slice index.
    pub fn as_range(&self) -> Range<usize> {
        self.low..self.high
    }
}

/// Lazy, ordered sequence of [`IndexRange`]s covering `[0, total)`.
///
/// Created by [`partition`].
#[derive(Debug, Clone)]
pub struct Partitions {
    total: usize,
    size: usize,
    next_low: usize,
}

impl Iterator for Partitions {
    type Item = IndexRange;

    fn next(&mut self) -> Option<IndexRange> {
        if self.size == 0 || self.next_low >= self.total {
            return None;
        }

        let low = self.next_low;
        let high = low.saturating_add(self.size).min(self.total);
        self.next_low = high;
        Some(IndexRange { low, high })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.size == 0 {
            0
        } else {
            (self.total - self.next_low.min(self.total)).div_ceil(self.size)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Partitions {}

/// Splits `total` items into contiguous ranges of at most `size` items.
///
/// Yields `total / size` full ranges in ascending order, then one trailing
/// range with the remaining `total % size` items if that is non-zero. A
/// `size` of zero yields nothing.
///
/// # Examples
///
/// ```
/// use libharbex::partition::{IndexRange, partition};
///
/// let ranges: Vec<_> = partition(32, 15).collect();
/// assert_eq!(
///     ranges,
///     vec![IndexRange::new(0, 15), IndexRange::new(15, 30), IndexRange::new(30, 32)]
/// );
/// ```
pub fn partition(total: usize, size: usize) -> Partitions {
    Partitions {
        total,
        size,
        next_low: 0,
    }
}
