use std::collections::HashMap;

use crate::net::{DecodeError, FieldSchema, FieldUpdate, HeaderKind, network_elapsed};
use crate::pose::{MessageShape, Pose};

#[derive(Debug, Clone, Default)]
pub struct RemoteNode {
    pub pose: Pose,
    pub location: Option<u64>,
    pub stopped: bool,
    pub last_timestamp: Option<i32>,
    pub updates: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedUpdate {
    pub do_id: u32,
    pub shape: MessageShape,
    pub pose: Pose,
    pub location: Option<u64>,
    pub timestamp: i32,
    pub elapsed_ticks: Option<i32>,
}

#[derive(Debug, Default)]
pub struct SmoothReceiver {
    nodes: HashMap<u32, RemoteNode>,
}

impl SmoothReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&mut self, do_id: u32, pose: Pose, location: Option<u64>) {
        self.nodes.insert(
            do_id,
            RemoteNode {
                pose,
                location,
                ..RemoteNode::default()
            },
        );
    }

    pub fn node(&self, do_id: u32) -> Option<&RemoteNode> {
        self.nodes.get(&do_id)
    }

    pub fn remove(&mut self, do_id: u32) -> Option<RemoteNode> {
        self.nodes.remove(&do_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn receive_datagram(
        &mut self,
        data: &[u8],
        kind: HeaderKind,
        schema: &dyn FieldSchema,
    ) -> Result<ReceivedUpdate, DecodeError> {
        let update = FieldUpdate::decode(data, kind, schema)?;
        Ok(self.apply(&update))
    }

    pub fn apply(&mut self, update: &FieldUpdate) -> ReceivedUpdate {
        let node = self.nodes.entry(update.do_id).or_default();
        let message = &update.message;

        if message.shape == MessageShape::Stop {
            node.stopped = true;
        } else {
            node.stopped = false;
            message.apply_to(&mut node.pose);
        }
        if let Some(location) = message.location {
            node.location = Some(location);
        }

        let elapsed_ticks = node
            .last_timestamp
            .map(|previous| network_elapsed(previous, update.timestamp));
        node.last_timestamp = Some(update.timestamp);
        node.updates += 1;

        ReceivedUpdate {
            do_id: update.do_id,
            shape: message.shape,
            pose: node.pose,
            location: node.location,
            timestamp: update.timestamp,
            elapsed_ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::net::SmoothMessage;

    fn update(do_id: u32, message: SmoothMessage, timestamp: i32) -> FieldUpdate {
        FieldUpdate {
            channels: None,
            do_id,
            field_number: 0,
            message,
            timestamp,
        }
    }

    #[test]
    fn partial_updates_keep_unsent_components() {
        let mut receiver = SmoothReceiver::new();
        receiver.seed(
            1,
            Pose::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(10.0, 0.0, 0.0)),
            Some(4),
        );

        let sent = Pose::new(Vec3::new(9.0, 9.0, 9.0), Vec3::new(90.0, 9.0, 9.0));
        let message = SmoothMessage::new(MessageShape::Xyh, sent, 0);
        let received = receiver.apply(&update(1, message, 100));

        assert_eq!(received.pose.pos, Vec3::new(9.0, 9.0, 3.0));
        assert_eq!(received.pose.hpr, Vec3::new(90.0, 0.0, 0.0));
        assert_eq!(received.location, Some(4));
        assert_eq!(received.elapsed_ticks, None);
    }

    #[test]
    fn stop_and_wrapping_elapsed() {
        let mut receiver = SmoothReceiver::new();
        receiver.apply(&update(2, SmoothMessage::new(MessageShape::Z, Pose::ZERO, 0), 32760));
        let received = receiver.apply(&update(2, SmoothMessage::stop(), -32766));

        assert_eq!(received.elapsed_ticks, Some(10));
        let node = receiver.node(2).unwrap();
        assert!(node.stopped);
        assert_eq!(node.updates, 2);
    }

    #[test]
    fn location_updates_from_full_message() {
        let mut receiver = SmoothReceiver::new();
        let pose = Pose::new(Vec3::ONE, Vec3::ONE);
        let message = SmoothMessage::new(MessageShape::PosHprL, pose, 8);
        let received = receiver.apply(&update(3, message, 0));

        assert_eq!(received.pose, pose);
        assert_eq!(received.location, Some(8));
        assert_eq!(receiver.len(), 1);
        assert!(receiver.remove(3).is_some());
        assert!(receiver.is_empty());
    }
}
