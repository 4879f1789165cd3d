use crate::{protocol::StreamFunction, SecsError, SecsResult};
use byteorder::{BigEndian, ByteOrder};

/// The only presentation type valid on data messages.
pub const PTYPE_SECS_II: u8 = 0;

/// Session id carried by linktest frames and by HSMS-SS data messages.
pub const SESSION_ID_ALL: u16 = 0xFFFF;

/// The ten-byte message header preceding every HSMS frame payload.
///
/// Plain data, laid out big-endian on the wire:
/// bytes 0-1 session id, byte 2 W bit and stream, byte 3 function,
/// byte 4 presentation type, byte 5 session type, bytes 6-9 system bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageHeader {
    /// Session id (HSMS) or device id (SECS-I).
    pub session_id: u16,
    /// Reply-expected bit.
    pub w_bit: bool,
    /// Stream, low seven bits of byte 2.
    pub stream: u8,
    /// Function. Odd functions are primaries; a reply is function + 1;
    /// function 0 is the transaction abort.
    pub function: u8,
    /// Presentation type; only [`PTYPE_SECS_II`] is valid on data messages.
    pub p_type: u8,
    /// Frame kind.
    pub s_type: SessionType,
    /// Per-transaction identifier, matches replies to primaries.
    pub system_bytes: u32,
}

impl MessageHeader {
    /// Header for an outgoing data message.
    pub fn for_data(sf: StreamFunction, session_id: u16, system_bytes: u32) -> Self {
        Self {
            session_id,
            w_bit: sf.wants_reply,
            stream: sf.stream,
            function: sf.function,
            p_type: PTYPE_SECS_II,
            s_type: SessionType::DataMessage,
            system_bytes,
        }
    }

    fn control(s_type: SessionType, session_id: u16, system_bytes: u32) -> Self {
        Self {
            session_id,
            w_bit: false,
            stream: 0,
            function: 0,
            p_type: PTYPE_SECS_II,
            s_type,
            system_bytes,
        }
    }

    /// Select request carrying the configured session id.
    pub fn select_req(session_id: u16, system_bytes: u32) -> Self {
        Self::control(SessionType::SelectReq, session_id, system_bytes)
    }

    /// Select response to `req`; the status code travels in the function
    /// byte.
    pub fn select_rsp(req: &MessageHeader, status: u8) -> Self {
        let mut header = Self::control(SessionType::SelectRsp, req.session_id, req.system_bytes);
        header.function = status;
        header
    }

    /// Deselect request.
    pub fn deselect_req(session_id: u16, system_bytes: u32) -> Self {
        Self::control(SessionType::DeselectReq, session_id, system_bytes)
    }

    /// Deselect response to `req`.
    pub fn deselect_rsp(req: &MessageHeader, status: u8) -> Self {
        let mut header =
            Self::control(SessionType::DeselectRsp, req.session_id, req.system_bytes);
        header.function = status;
        header
    }

    /// Linktest request; linktest frames always use session id 0xFFFF.
    pub fn linktest_req(system_bytes: u32) -> Self {
        Self::control(SessionType::LinktestReq, SESSION_ID_ALL, system_bytes)
    }

    /// Linktest response to `req`.
    pub fn linktest_rsp(req: &MessageHeader) -> Self {
        Self::control(SessionType::LinktestRsp, SESSION_ID_ALL, req.system_bytes)
    }

    /// Separate request; ends the session without a response.
    pub fn separate_req(session_id: u16, system_bytes: u32) -> Self {
        Self::control(SessionType::SeparateReq, session_id, system_bytes)
    }

    /// Reject of the offending frame; the reason code travels in the
    /// function byte.
    pub fn reject_req(offending: &MessageHeader, reason: RejectReason) -> Self {
        let mut header = Self::control(
            SessionType::RejectReq,
            offending.session_id,
            offending.system_bytes,
        );
        header.function = reason as u8;
        header
    }

    /// The header of the reply that answers this primary: function + 1,
    /// W cleared, same session id and system bytes.
    pub fn reply_header(&self) -> Self {
        Self {
            session_id: self.session_id,
            w_bit: false,
            stream: self.stream,
            function: self.function.wrapping_add(1),
            p_type: PTYPE_SECS_II,
            s_type: SessionType::DataMessage,
            system_bytes: self.system_bytes,
        }
    }

    /// The generic transaction-abort reply: function 0, W cleared.
    pub fn abort_reply_header(&self) -> Self {
        Self {
            session_id: self.session_id,
            w_bit: false,
            stream: self.stream,
            function: 0,
            p_type: PTYPE_SECS_II,
            s_type: SessionType::DataMessage,
            system_bytes: self.system_bytes,
        }
    }

    /// True for data messages with an odd function.
    pub fn is_primary(&self) -> bool {
        self.function & 1 != 0
    }

    /// True if the sender expects a reply.
    pub fn expects_reply(&self) -> bool {
        self.w_bit
    }

    /// True if this header answers the given primary.
    pub fn is_reply_of(&self, primary: &MessageHeader) -> bool {
        self.stream == primary.stream
            && self.function == primary.function.wrapping_add(1)
            && !self.w_bit
    }

    /// The stream/function of this header.
    pub fn sf(&self) -> StreamFunction {
        StreamFunction {
            stream: self.stream,
            function: self.function,
            wants_reply: self.w_bit,
        }
    }

    /// Packs the header into its wire form.
    pub fn encode_into(&self, target: &mut [u8; 10]) {
        BigEndian::write_u16(&mut target[0..2], self.session_id);
        target[2] = (u8::from(self.w_bit) << 7) | (self.stream & 0x7F);
        target[3] = self.function;
        target[4] = self.p_type;
        target[5] = self.s_type as u8;
        BigEndian::write_u32(&mut target[6..10], self.system_bytes);
    }

    /// Unpacks a header from its wire form.
    pub fn decode_from(bytes: &[u8; 10]) -> SecsResult<Self> {
        Ok(Self {
            session_id: BigEndian::read_u16(&bytes[0..2]),
            w_bit: bytes[2] & 0x80 != 0,
            stream: bytes[2] & 0x7F,
            function: bytes[3],
            p_type: bytes[4],
            s_type: SessionType::try_new(bytes[5])?,
            system_bytes: BigEndian::read_u32(&bytes[6..10]),
        })
    }
}

impl std::fmt::Display for MessageHeader {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.s_type {
            SessionType::DataMessage => write!(
                fmt,
                "{} session {} system {}",
                self.sf(),
                self.session_id,
                self.system_bytes
            ),
            s_type => write!(fmt, "{s_type} system {}", self.system_bytes),
        }
    }
}

/// Frame kind, byte 5 of the message header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionType {
    /// SECS-II data message.
    DataMessage = 0,
    /// Select request.
    SelectReq = 1,
    /// Select response.
    SelectRsp = 2,
    /// Deselect request.
    DeselectReq = 3,
    /// Deselect response.
    DeselectRsp = 4,
    /// Linktest request.
    LinktestReq = 5,
    /// Linktest response.
    LinktestRsp = 6,
    /// Reject of an unsupported or out-of-place frame.
    RejectReq = 7,
    /// Immediate session end, no response.
    SeparateReq = 9,
}

impl SessionType {
    /// Decodes the wire byte.
    pub fn try_new(code: u8) -> SecsResult<Self> {
        Ok(match code {
            0 => Self::DataMessage,
            1 => Self::SelectReq,
            2 => Self::SelectRsp,
            3 => Self::DeselectReq,
            4 => Self::DeselectRsp,
            5 => Self::LinktestReq,
            6 => Self::LinktestRsp,
            7 => Self::RejectReq,
            // 8: not defined
            9 => Self::SeparateReq,
            code => {
                return Err(SecsError::protocol(format!("unknown session type {code}")));
            }
        })
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            fmt,
            "{}",
            match self {
                Self::DataMessage => "DataMessage",
                Self::SelectReq => "Select.req",
                Self::SelectRsp => "Select.rsp",
                Self::DeselectReq => "Deselect.req",
                Self::DeselectRsp => "Deselect.rsp",
                Self::LinktestReq => "Linktest.req",
                Self::LinktestRsp => "Linktest.rsp",
                Self::RejectReq => "Reject.req",
                Self::SeparateReq => "Separate.req",
            }
        )
    }
}

/// Status byte of a select response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectStatus {
    /// Select accepted, session established.
    Established = 0,
    /// A session is already active on this connection.
    AlreadyActive = 1,
    /// The entity is not ready to be selected.
    NotReady = 2,
    /// No more sessions can be established.
    Exhaust = 3,
}

/// Status byte of a deselect response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeselectStatus {
    /// Deselect accepted, session ended.
    Ended = 0,
    /// No session was established.
    NotEstablished = 1,
    /// The entity is busy and cannot deselect now.
    Busy = 2,
}

/// Reason byte of a reject request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RejectReason {
    /// The received session type is not supported.
    STypeNotSupported = 1,
    /// The received presentation type is not supported.
    PTypeNotSupported = 2,
    /// A response was received for a transaction that is not open.
    TransactionNotOpen = 3,
    /// A data message was received while not selected.
    EntityNotSelected = 4,
}

#[cfg(test)]
mod test {
    use super::{MessageHeader, SessionType, SESSION_ID_ALL};
    use crate::protocol::StreamFunction;

    #[test]
    fn pack_unpack_round_trip() {
        let header = MessageHeader::for_data(
            StreamFunction::new(1, 13, true),
            SESSION_ID_ALL,
            0x0102_0304,
        );
        let mut bytes = [0_u8; 10];
        header.encode_into(&mut bytes);
        assert_eq!(
            bytes,
            [0xFF, 0xFF, 0x81, 0x0D, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04]
        );
        assert_eq!(MessageHeader::decode_from(&bytes).unwrap(), header);
    }

    #[test]
    fn reply_header_pairs_with_primary() {
        let primary =
            MessageHeader::for_data(StreamFunction::new(6, 11, true), SESSION_ID_ALL, 77);
        let reply = primary.reply_header();
        assert!(reply.is_reply_of(&primary));
        assert_eq!(reply.stream, 6);
        assert_eq!(reply.function, 12);
        assert!(!reply.w_bit);
        assert_eq!(reply.system_bytes, 77);

        let abort = primary.abort_reply_header();
        assert_eq!(abort.function, 0);
        assert!(!abort.w_bit);
    }

    #[test]
    fn linktest_uses_broadcast_session() {
        let req = MessageHeader::linktest_req(9);
        assert_eq!(req.session_id, SESSION_ID_ALL);
        assert_eq!(req.s_type, SessionType::LinktestReq);
        let rsp = MessageHeader::linktest_rsp(&req);
        assert_eq!(rsp.system_bytes, 9);
        assert_eq!(rsp.s_type, SessionType::LinktestRsp);
    }

    #[test]
    fn undefined_session_type_fails() {
        let bytes = [0, 0, 0, 0, 0, 8, 0, 0, 0, 1];
        assert!(MessageHeader::decode_from(&bytes).is_err());
    }
}
