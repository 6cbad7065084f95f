mod decode;
mod packer;
mod protocol;
mod schema;
mod timestamp;
mod transport;

pub use decode::{DecodeError, FieldUpdate};
pub use packer::{PackError, PackValue, Packer, Unpacker};
pub use protocol::{
    AUTHORITATIVE_HEADER_LEN, AUTHORITATIVE_RECIPIENT_COUNT, CLIENT_HEADER_LEN,
    CLIENT_OBJECT_UPDATE_FIELD, HeaderKind, RoutingMode, STATESERVER_OBJECT_UPDATE_FIELD,
    SmoothMessage,
};
pub use schema::{FieldDef, FieldRegistry, FieldSchema, Param, ParamType};
pub use timestamp::{
    NETWORK_TIME_BITS, NETWORK_TIME_PRECISION, network_elapsed, network_time,
    network_to_local_time, wrap_network_time,
};
pub use transport::{
    MAX_DATAGRAM_SIZE, RecordingTransport, Transport, TransportStats, UdpTransport,
};
