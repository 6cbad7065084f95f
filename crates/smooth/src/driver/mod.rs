mod broadcaster;
mod timer;

pub use broadcaster::{BroadcastReport, SmoothBroadcaster};
pub use timer::BroadcastTimer;
