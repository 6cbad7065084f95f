#[derive(Debug, Clone)]
pub struct BroadcastTimer {
    rate: u32,
    period: f64,
    accumulator: f64,
}

impl BroadcastTimer {
    pub fn new(rate: u32) -> Self {
        let rate = rate.max(1);
        Self {
            rate,
            period: 1.0 / f64::from(rate),
            accumulator: 0.0,
        }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn accumulate(&mut self, delta: f64) {
        self.accumulator += delta.max(0.0);
    }

    pub fn should_broadcast(&self) -> bool {
        self.accumulator >= self.period
    }

    /// Consumes one period. Time beyond a single period is dropped so a long
    /// frame yields one broadcast instead of a burst.
    pub fn consume(&mut self) -> bool {
        if self.accumulator >= self.period {
            self.accumulator = (self.accumulator - self.period).min(self.period);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
