pub mod clock;
pub mod config;
pub mod driver;
pub mod encoder;
pub mod net;
pub mod node;
pub mod pose;
pub mod receiver;

pub use clock::{
    ClockDelta, ManualClock, NetworkClock, RealTimeClock, SharedClockDelta, SystemClock,
};
pub use config::{ConfigError, SmoothConfig};
pub use driver::{BroadcastReport, BroadcastTimer, SmoothBroadcaster};
pub use encoder::{EncoderContext, SmoothError, SmoothNodeEncoder};
pub use net::{
    DecodeError, FieldDef, FieldRegistry, FieldSchema, FieldUpdate, HeaderKind, PackError,
    RecordingTransport, RoutingMode, SmoothMessage, Transport, UdpTransport,
};
pub use node::{PoseSource, SceneNode};
pub use pose::{BroadcastVariant, DirtyFields, MessageShape, Pose, TrackedPose};
pub use receiver::{ReceivedUpdate, RemoteNode, SmoothReceiver};
