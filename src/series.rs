/// Bounded per-field sample history
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Fixed-capacity FIFO of the most recent samples of one field
///
/// Samples are kept oldest-first. Once full, every push evicts the oldest
/// sample so the window always holds the last `capacity` values.
#[derive(Debug, Clone)]
pub struct WindowedSeries {
    capacity: usize,
    values: VecDeque<f64>,
}

impl WindowedSeries {
    /// Create an empty window
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn window(capacity: usize) -> WindowedSeries {
        WindowedSeries::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[test]
    fn grows_until_capacity() {
        let mut series = window(3);
        assert!(series.is_empty());
        series.push(1.0);
        series.push(2.0);
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest(), Some(2.0));
    }

    #[test]
    fn evicts_oldest_first() {
        let mut series = window(3);
        for v in 1..=5 {
            series.push(v as f64);
        }
        assert_eq!(series.len(), 3);
        assert_eq!(series.values().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn single_slot_keeps_latest_sample() {
        let mut series = window(1);
        series.push(7.0);
        series.push(8.0);
        assert_eq!(series.capacity(), 1);
        assert_eq!(series.values().collect::<Vec<_>>(), vec![8.0]);
    }

    proptest! {
        #[test]
        fn retains_exactly_the_last_capacity_pushes(
            capacity in 1usize..32,
            pushes in proptest::collection::vec(-1000i32..1000, 0..100),
        ) {
            let mut series = window(capacity);
            for &v in &pushes {
                series.push(v as f64);
            }

            let expected: Vec<f64> = pushes
                .iter()
                .skip(pushes.len().saturating_sub(capacity))
                .map(|&v| v as f64)
                .collect();

            prop_assert_eq!(series.len(), pushes.len().min(capacity));
            prop_assert_eq!(series.values().collect::<Vec<_>>(), expected);
        }
    }
}
