// The wire core: the SECS-II item codec, the ten-byte message header, the
// immutable data message, and HSMS frame assembly/reassembly.

pub(crate) mod frame;
mod item_format;
mod message;
mod message_header;
mod secs_value;
mod stream_function;

pub use self::{
    item_format::ItemFormat,
    message::{DataMessage, MessageBuilder},
    message_header::{
        DeselectStatus, MessageHeader, RejectReason, SelectStatus, SessionType, PTYPE_SECS_II,
        SESSION_ID_ALL,
    },
    secs_value::SecsValue,
    stream_function::StreamFunction,
};
