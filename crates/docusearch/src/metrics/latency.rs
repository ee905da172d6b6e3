use std::collections::VecDeque;

/// Fixed-capacity FIFO of durations in seconds. Pushing into a full buffer
/// evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct LatencyBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl LatencyBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Builds a buffer from persisted samples, keeping only the newest
    /// `capacity` of them.
    pub fn from_samples<I: IntoIterator<Item = f64>>(capacity: usize, samples: I) -> Self {
        let mut buffer = Self::new(capacity);
        for sample in samples {
            buffer.push(sample);
        }
        buffer
    }

    pub fn push(&mut self, sample: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Samples oldest first.
    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn percentile(&self, p: f64) -> f64 {
        percentile(&self.to_vec(), p)
    }

    /// Arithmetic mean, 0.0 when empty.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }
}

/// Nearest-rank percentile without interpolation: the sample at
/// `floor(p / 100 * len)` of the sorted data, clamped to the last index.
/// Returns 0.0 for no data.
pub fn percentile(data: &[f64], p: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);

    let index = ((p / 100.0) * sorted.len() as f64).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}
