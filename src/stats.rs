use std::time::Duration;

/// Running min/max/mean over polling cycle durations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleStats {
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub count: u64,
    total: Duration,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Duration) {
        if self.count == 0 {
            self.min = sample;
            self.max = sample;
        } else {
            self.min = self.min.min(sample);
            self.max = self.max.max(sample);
        }

        self.count += 1;
        self.total += sample;
        self.mean = Duration::from_secs_f64(self.total.as_secs_f64() / self.count as f64);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
