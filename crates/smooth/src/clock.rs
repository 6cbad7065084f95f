use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::net::{NETWORK_TIME_PRECISION, network_time, network_to_local_time};

pub trait ClockDelta {
    fn delta(&self) -> f64;
}

impl ClockDelta for f64 {
    fn delta(&self) -> f64 {
        *self
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedClockDelta(Arc<AtomicU64>);

impl SharedClockDelta {
    pub fn new(delta: f64) -> Self {
        Self(Arc::new(AtomicU64::new(delta.to_bits())))
    }

    pub fn set(&self, delta: f64) {
        self.0.store(delta.to_bits(), Ordering::Relaxed);
    }
}

impl ClockDelta for SharedClockDelta {
    fn delta(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

pub trait RealTimeClock {
    fn real_time(&self) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl RealTimeClock for SystemClock {
    fn real_time(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn new(time: f64) -> Self {
        Self(Arc::new(AtomicU64::new(time.to_bits())))
    }

    pub fn set(&self, time: f64) {
        self.0.store(time.to_bits(), Ordering::Relaxed);
    }

    pub fn advance(&self, seconds: f64) {
        self.set(self.real_time() + seconds);
    }
}

impl RealTimeClock for ManualClock {
    fn real_time(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

#[derive(Clone)]
pub struct NetworkClock {
    real_time: Arc<dyn RealTimeClock + Send + Sync>,
    delta: Arc<dyn ClockDelta + Send + Sync>,
    precision: f64,
}

impl std::fmt::Debug for NetworkClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkClock")
            .field("real_time", &self.real_time.real_time())
            .field("delta", &self.delta.delta())
            .field("precision", &self.precision)
            .finish()
    }
}

impl Default for NetworkClock {
    fn default() -> Self {
        Self::new(SystemClock::new(), 0.0)
    }
}

impl NetworkClock {
    pub fn new(
        real_time: impl RealTimeClock + Send + Sync + 'static,
        delta: impl ClockDelta + Send + Sync + 'static,
    ) -> Self {
        Self {
            real_time: Arc::new(real_time),
            delta: Arc::new(delta),
            precision: NETWORK_TIME_PRECISION,
        }
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn local_time(&self) -> f64 {
        self.real_time.real_time()
    }

    pub fn delta(&self) -> f64 {
        self.delta.delta()
    }

    pub fn now(&self) -> i32 {
        network_time(self.local_time(), self.delta(), self.precision)
    }

    pub fn to_local_time(&self, timestamp: i32) -> f64 {
        network_to_local_time(timestamp, self.local_time(), self.delta(), self.precision)
    }
}
