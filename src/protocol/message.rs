use crate::{
    protocol::{MessageHeader, SecsValue, StreamFunction, SESSION_ID_ALL},
    SecsResult,
};
use debug_ignore::DebugIgnore;

/// An immutable SECS-II data message: a ten-byte header plus the encoded
/// body.
///
/// Messages are built once, through [`MessageBuilder`] or the reply
/// constructors, and never mutated afterwards. Reply pairing is the session
/// engine's business; a message carries no back-pointers.
#[derive(Clone, Debug, PartialEq)]
pub struct DataMessage {
    header: MessageHeader,
    body: DebugIgnore<Vec<u8>>,
}

impl DataMessage {
    /// Starts building a data message.
    pub fn builder() -> MessageBuilder {
        MessageBuilder::default()
    }

    /// A primary message with the given stream/function and body value.
    pub fn data(sf: StreamFunction, value: &SecsValue) -> SecsResult<Self> {
        Self::builder().sf(sf).body(value).build()
    }

    /// The reply answering `primary`: function + 1, W cleared, the
    /// primary's session id and system bytes.
    pub fn reply_to(primary: &DataMessage, value: &SecsValue) -> SecsResult<Self> {
        Ok(Self {
            header: primary.header.reply_header(),
            body: DebugIgnore(value.to_bytes()?),
        })
    }

    /// The generic transaction-abort reply (`S<n>F0`) to `primary`.
    pub fn abort_reply(primary: &DataMessage) -> Self {
        Self {
            header: primary.header.abort_reply_header(),
            body: DebugIgnore(Vec::new()),
        }
    }

    pub(crate) fn from_wire(header: MessageHeader, body: Vec<u8>) -> Self {
        Self {
            header,
            body: DebugIgnore(body),
        }
    }

    // The engine assigns system bytes at send-post time; the caller's
    // message stays untouched.
    pub(crate) fn with_system_bytes(&self, system_bytes: u32) -> Self {
        let mut header = self.header;
        header.system_bytes = system_bytes;
        Self {
            header,
            body: self.body.clone(),
        }
    }

    /// The message header.
    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// The stream/function of this message.
    pub fn sf(&self) -> StreamFunction {
        self.header.sf()
    }

    /// The encoded body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decodes the body into a value tree.
    pub fn value(&self) -> SecsResult<SecsValue> {
        SecsValue::parse(&self.body)
    }

    /// True if this is a primary (odd-function) message.
    pub fn is_primary(&self) -> bool {
        self.header.is_primary()
    }

    /// True if this message is a transaction abort (`S<n>F0`).
    pub fn is_abort(&self) -> bool {
        self.header.function == 0
    }
}

impl std::fmt::Display for DataMessage {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{} ({} body bytes)", self.header, self.body.len())
    }
}

/// Builder producing an immutable [`DataMessage`] exactly once.
///
/// Codec failures from [`body`](Self::body) are deferred and surface at
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct MessageBuilder {
    stream: u8,
    function: u8,
    wants_reply: bool,
    session_id: Option<u16>,
    body: Option<SecsResult<Vec<u8>>>,
}

impl MessageBuilder {
    /// Sets the stream.
    #[must_use]
    pub fn stream(mut self, stream: u8) -> Self {
        self.stream = stream;
        self
    }

    /// Sets the function.
    #[must_use]
    pub fn function(mut self, function: u8) -> Self {
        self.function = function;
        self
    }

    /// Sets the reply-expected bit.
    #[must_use]
    pub fn wants_reply(mut self, wants_reply: bool) -> Self {
        self.wants_reply = wants_reply;
        self
    }

    /// Sets stream, function and W in one go.
    #[must_use]
    pub fn sf(mut self, sf: StreamFunction) -> Self {
        self.stream = sf.stream;
        self.function = sf.function;
        self.wants_reply = sf.wants_reply;
        self
    }

    /// Overrides the session id; defaults to 0xFFFF as used on single-session
    /// data messages.
    #[must_use]
    pub fn session_id(mut self, session_id: u16) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Encodes `value` as the message body.
    #[must_use]
    pub fn body(mut self, value: &SecsValue) -> Self {
        self.body = Some(value.to_bytes());
        self
    }

    /// Uses already-encoded bytes as the message body.
    #[must_use]
    pub fn body_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(Ok(bytes));
        self
    }

    /// Builds the message. Fails if a body value failed to encode.
    pub fn build(self) -> SecsResult<DataMessage> {
        let body = self.body.transpose()?.unwrap_or_default();
        let sf = StreamFunction::new(self.stream, self.function, self.wants_reply);
        let header =
            MessageHeader::for_data(sf, self.session_id.unwrap_or(SESSION_ID_ALL), 0);
        Ok(DataMessage {
            header,
            body: DebugIgnore(body),
        })
    }
}

#[cfg(test)]
mod test {
    use super::DataMessage;
    use crate::protocol::{SecsValue, StreamFunction, SESSION_ID_ALL};

    #[test]
    fn builder_produces_an_immutable_message() {
        let value = SecsValue::List(vec![]);
        let message = DataMessage::builder()
            .stream(1)
            .function(13)
            .wants_reply(true)
            .body(&value)
            .build()
            .unwrap();
        assert_eq!(message.sf(), StreamFunction::new(1, 13, true));
        assert_eq!(message.header().session_id, SESSION_ID_ALL);
        assert_eq!(message.value().unwrap(), value);
    }

    #[test]
    fn reply_carries_the_primary_transaction() {
        let primary = DataMessage::builder()
            .sf(StreamFunction::new(2, 41, true))
            .build()
            .unwrap()
            .with_system_bytes(4711);
        let reply = DataMessage::reply_to(&primary, &SecsValue::U1(0)).unwrap();
        assert!(reply.header().is_reply_of(primary.header()));
        assert_eq!(reply.header().system_bytes, 4711);

        let abort = DataMessage::abort_reply(&primary);
        assert!(abort.is_abort());
        assert_eq!(abort.header().system_bytes, 4711);
        assert!(abort.body().is_empty());
    }

    #[test]
    fn empty_body_decodes_to_the_absent_value() {
        let message = DataMessage::builder()
            .sf(StreamFunction::new(1, 17, true))
            .build()
            .unwrap();
        assert!(message.body().is_empty());
        assert_eq!(message.value().unwrap(), SecsValue::Empty);
    }
}
