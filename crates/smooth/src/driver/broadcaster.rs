use super::timer::BroadcastTimer;
use crate::encoder::{SmoothError, SmoothNodeEncoder};
use crate::net::Transport;
use crate::node::PoseSource;
use crate::pose::BroadcastVariant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub suppressed: usize,
    pub failed: usize,
}

impl BroadcastReport {
    fn record(&mut self, result: &Result<bool, SmoothError>) {
        match result {
            Ok(true) => self.sent += 1,
            Ok(false) => self.suppressed += 1,
            Err(_) => self.failed += 1,
        }
    }
}

pub struct SmoothBroadcaster<P, T> {
    encoders: Vec<SmoothNodeEncoder<P>>,
    transport: T,
    timer: BroadcastTimer,
    variant: BroadcastVariant,
}

impl<P: PoseSource, T: Transport> SmoothBroadcaster<P, T> {
    pub fn new(transport: T, rate: u32, variant: BroadcastVariant) -> Self {
        Self {
            encoders: Vec::new(),
            transport,
            timer: BroadcastTimer::new(rate),
            variant,
        }
    }

    pub fn add(&mut self, encoder: SmoothNodeEncoder<P>) {
        self.encoders.push(encoder);
    }

    pub fn remove(&mut self, do_id: u32) -> Option<SmoothNodeEncoder<P>> {
        let index = self.encoders.iter().position(|e| e.do_id() == do_id)?;
        Some(self.encoders.remove(index))
    }

    pub fn encoder(&self, do_id: u32) -> Option<&SmoothNodeEncoder<P>> {
        self.encoders.iter().find(|e| e.do_id() == do_id)
    }

    pub fn encoder_mut(&mut self, do_id: u32) -> Option<&mut SmoothNodeEncoder<P>> {
        self.encoders.iter_mut().find(|e| e.do_id() == do_id)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn timer(&self) -> &BroadcastTimer {
        &self.timer
    }

    pub fn variant(&self) -> BroadcastVariant {
        self.variant
    }

    pub fn update(&mut self, delta: f64) -> Option<BroadcastReport> {
        self.timer.accumulate(delta);
        self.timer.consume().then(|| self.broadcast_now())
    }

    pub fn broadcast_now(&mut self) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for encoder in &mut self.encoders {
            let result = encoder
                .broadcast(self.variant, &mut self.transport)
                .map(|sent| sent.is_some());
            if let Err(err) = &result {
                log::warn!("Broadcast for object {} failed: {}", encoder.do_id(), err);
            }
            report.record(&result);
        }
        report
    }

    pub fn send_everything(&mut self) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for encoder in &mut self.encoders {
            let result = encoder
                .send_everything(&mut self.transport)
                .map(|_| true);
            if let Err(err) = &result {
                log::warn!("Resync for object {} failed: {}", encoder.do_id(), err);
            }
            report.record(&result);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use super::*;
    use crate::clock::{ManualClock, NetworkClock};
    use crate::encoder::EncoderContext;
    use crate::net::{FieldRegistry, RecordingTransport, RoutingMode};
    use crate::node::SceneNode;

    fn broadcaster() -> (SmoothBroadcaster<SceneNode, RecordingTransport>, Vec<SceneNode>) {
        let context = EncoderContext::new(
            Arc::new(FieldRegistry::smooth_node(0)),
            RoutingMode::Client,
            NetworkClock::new(ManualClock::new(0.0), 0.0),
        );
        let mut broadcaster =
            SmoothBroadcaster::new(RecordingTransport::new(), 10, BroadcastVariant::Full);
        let nodes: Vec<SceneNode> = (0..3).map(|i| SceneNode::new(&format!("node{i}"))).collect();
        for (do_id, node) in (100u32..).zip(&nodes) {
            broadcaster.add(SmoothNodeEncoder::initialize(node.clone(), do_id, context.clone()));
        }
        (broadcaster, nodes)
    }

    #[test]
    fn broadcasts_on_period() {
        let (mut broadcaster, nodes) = broadcaster();

        assert_eq!(broadcaster.update(0.05), None);
        let report = broadcaster.update(0.05).unwrap();
        assert_eq!(report, BroadcastReport { sent: 3, suppressed: 0, failed: 0 });

        nodes[1].set_pos(Vec3::new(0.0, 0.0, 2.0));
        let report = broadcaster.update(0.1).unwrap();
        assert_eq!(report, BroadcastReport { sent: 1, suppressed: 2, failed: 0 });
        assert_eq!(broadcaster.transport().len(), 4);
    }

    #[test]
    fn failures_do_not_stop_other_objects() {
        let (mut broadcaster, nodes) = broadcaster();

        nodes[0].set_pos(Vec3::new(9000.0, 0.0, 0.0));
        nodes[2].set_hpr(Vec3::new(15.0, 0.0, 0.0));
        let report = broadcaster.broadcast_now();
        assert_eq!(report, BroadcastReport { sent: 2, suppressed: 0, failed: 1 });

        let report = broadcaster.send_everything();
        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 2);
    }

    #[test]
    fn add_and_remove() {
        let (mut broadcaster, _nodes) = broadcaster();
        broadcaster.encoder_mut(101).unwrap().set_location(5);
        assert_eq!(broadcaster.encoder(101).unwrap().locations(), (0, 5));

        assert!(broadcaster.remove(101).is_some());
        assert!(broadcaster.remove(101).is_none());
        assert_eq!(broadcaster.len(), 2);
    }
}
