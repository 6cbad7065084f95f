use std::io;
use std::sync::Arc;

use crate::clock::NetworkClock;
use crate::config::SmoothConfig;
use crate::net::{
    FieldDef, FieldRegistry, FieldSchema, PackError, Packer, RoutingMode, SmoothMessage, Transport,
};
use crate::node::PoseSource;
use crate::pose::{BroadcastVariant, MessageShape, SMOOTH_NODE_EPSILON, TrackedPose};

#[derive(Debug, thiserror::Error)]
pub enum SmoothError {
    #[error("schema has no field named {0}")]
    UnknownField(&'static str),
    #[error("failed to pack update for object {do_id}: {source}")]
    Pack {
        do_id: u32,
        #[source]
        source: PackError,
    },
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

impl SmoothError {
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Pack { source, .. } if source.is_range())
    }
}

#[derive(Clone)]
pub struct EncoderContext {
    pub schema: Arc<dyn FieldSchema + Send + Sync>,
    pub routing: RoutingMode,
    pub clock: NetworkClock,
    pub epsilon: f32,
}

impl EncoderContext {
    pub fn new(
        schema: Arc<dyn FieldSchema + Send + Sync>,
        routing: RoutingMode,
        clock: NetworkClock,
    ) -> Self {
        Self {
            schema,
            routing,
            clock,
            epsilon: SMOOTH_NODE_EPSILON,
        }
    }

    pub fn from_config(config: &SmoothConfig, clock: NetworkClock) -> Self {
        Self {
            schema: Arc::new(FieldRegistry::smooth_node(config.first_field_number)),
            routing: config.routing,
            clock: clock.with_precision(config.network_time_precision),
            epsilon: config.epsilon,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }
}

/// Replicates one object's pose as minimal smooth-node updates.
///
/// Each broadcast compares the node's current pose with the last one sent,
/// picks the smallest message that describes the change and hands the framed
/// datagram to the transport.
///
/// Changed components are cached before the datagram is packed. If packing
/// fails (for example a position outside the field's range) the update is
/// dropped but the value stays cached as sent, so an unchanged out-of-range
/// pose is reported once rather than on every tick.
pub struct SmoothNodeEncoder<P> {
    node: P,
    do_id: u32,
    tracked: TrackedPose,
    context: EncoderContext,
}

impl<P: PoseSource> SmoothNodeEncoder<P> {
    pub fn initialize(node: P, do_id: u32, context: EncoderContext) -> Self {
        let tracked = TrackedPose::with_epsilon(node.pose(), context.epsilon);
        Self {
            node,
            do_id,
            tracked,
            context,
        }
    }

    pub fn node(&self) -> &P {
        &self.node
    }

    pub fn do_id(&self) -> u32 {
        self.do_id
    }

    pub fn tracked(&self) -> &TrackedPose {
        &self.tracked
    }

    pub fn is_stopped(&self) -> bool {
        self.tracked.is_stopped()
    }

    pub fn context(&self) -> &EncoderContext {
        &self.context
    }

    pub fn set_location(&mut self, location: u64) {
        self.tracked.set_location(location);
    }

    /// `(sent, pending)` location ids.
    pub fn locations(&self) -> (u64, u64) {
        (self.tracked.sent_location(), self.tracked.pending_location())
    }

    pub fn log_locations(&self) {
        let (sent, pending) = self.locations();
        log::debug!(
            "{} ({}): sent location {}, last set location {}",
            self.node.name(),
            self.do_id,
            sent,
            pending
        );
    }

    pub fn broadcast_pos_hpr_full<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<Option<SmoothMessage>, SmoothError> {
        self.broadcast(BroadcastVariant::Full, transport)
    }

    pub fn broadcast_pos_hpr_xyh<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<Option<SmoothMessage>, SmoothError> {
        self.broadcast(BroadcastVariant::Xyh, transport)
    }

    pub fn broadcast_pos_hpr_xy<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<Option<SmoothMessage>, SmoothError> {
        self.broadcast(BroadcastVariant::Xy, transport)
    }

    /// Returns the message handed to the transport, or `None` when the
    /// object is still and its stop sentinel already went out.
    pub fn broadcast<T: Transport + ?Sized>(
        &mut self,
        variant: BroadcastVariant,
        transport: &mut T,
    ) -> Result<Option<SmoothMessage>, SmoothError> {
        let current = self.node.pose();
        let plan = self.tracked.plan(&current, variant);
        let Some(shape) = plan.shape else {
            return Ok(None);
        };

        let schema = Arc::clone(&self.context.schema);
        let field = lookup(schema.as_ref(), shape)?;

        self.tracked.commit(&current, &plan);
        let message = SmoothMessage::new(shape, *self.tracked.pose(), self.tracked.sent_location());
        log::debug!("{} ({}): {:?} dirty={:?}", self.node.name(), self.do_id, shape, plan.dirty);

        self.send(field, &message, transport)?;
        Ok(Some(message))
    }

    pub fn send_everything<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<SmoothMessage, SmoothError> {
        let schema = Arc::clone(&self.context.schema);
        let field = lookup(schema.as_ref(), MessageShape::PosHprL)?;

        let location = self.tracked.mark_location_sent();
        let message = SmoothMessage::new(MessageShape::PosHprL, *self.tracked.pose(), location);

        self.send(field, &message, transport)?;
        Ok(message)
    }

    fn send<T: Transport + ?Sized>(
        &self,
        field: &FieldDef,
        message: &SmoothMessage,
        transport: &mut T,
    ) -> Result<(), SmoothError> {
        let mut packer = Packer::new();
        self.context
            .routing
            .write_header(&mut packer, self.do_id, field.number);

        packer.begin(field);
        for value in message.components() {
            packer.push_f64(f64::from(value));
        }
        if let Some(location) = message.location {
            packer.push_u64(location);
        }
        packer.push_i64(i64::from(self.context.clock.now()));

        match packer.end() {
            Ok(datagram) => transport.send_datagram(&datagram).map_err(SmoothError::from),
            Err(source) => {
                let pose = self.tracked.pose();
                if source.is_range() {
                    log::warn!(
                        "Out of range for {}: {} ({}) pos = {} hpr = {} location = {}",
                        field.name,
                        self.node.name(),
                        self.do_id,
                        pose.pos,
                        pose.hpr,
                        self.tracked.sent_location()
                    );
                } else {
                    log::warn!(
                        "Unexpected pack error for {} ({}): {}",
                        self.node.name(),
                        self.do_id,
                        source
                    );
                }
                Err(SmoothError::Pack {
                    do_id: self.do_id,
                    source,
                })
            }
        }
    }
}

fn lookup(
    schema: &(dyn FieldSchema + Send + Sync),
    shape: MessageShape,
) -> Result<&FieldDef, SmoothError> {
    schema
        .field_by_name(shape.field_name())
        .ok_or(SmoothError::UnknownField(shape.field_name()))
}
