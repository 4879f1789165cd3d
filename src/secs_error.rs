use thiserror::Error;

/// A list specifying categories of [`SecsError`](crate::SecsError).
///
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SecsError {
    /// An item header byte carried the length-byte count 0, which the wire
    /// format declares invalid.
    #[error("Item header is invalid: {}", _0)]
    HeaderInvalid(&'static str),

    /// An item's declared byte count does not fit its format code.
    #[error("Item length is invalid: {}", _0)]
    LengthInvalid(String),

    /// The input ended before the declared item content was complete.
    #[error("Item data is truncated")]
    Truncated,

    /// Bytes remained after the outermost item was decoded.
    #[error("Trailing bytes after the outermost item")]
    TrailingBytes,

    /// A format code that is not transmittable or not recognized.
    #[error("Unsupported item format code {}", _0)]
    UnsupportedIfc(u8),

    /// Opening the TCP connection failed.
    #[error("TCP connect failed")]
    ConnectFailed {
        /// The causing Error.
        source: std::io::Error,
    },

    /// The TCP connection was not established within `ConnectTimeLimit`.
    #[error("TCP connect timed out")]
    ConnectTimeout,

    /// The peer answered the select request with a non-zero status.
    #[error("Select failed with status {}", _0)]
    SelectFailed(u8),

    /// No select response arrived within T6.
    #[error("Select timed out (T6)")]
    SelectTimeout,

    /// No deselect response arrived within T6.
    #[error("Deselect timed out (T6)")]
    DeselectTimeout,

    /// No linktest response arrived within T6.
    #[error("Linktest timed out (T6)")]
    LinktestTimeout,

    /// The reply to a primary message did not arrive within T3.
    #[error("Reply timed out (T3)")]
    ReplyTimeout,

    /// A passive connection was not selected within T7.
    #[error("Connection not selected within T7")]
    NotSelectedTimeout,

    /// A started frame was not completed within T8.
    #[error("Frame stalled mid-transfer (T8)")]
    InterCharTimeout,

    /// The peer violated the framing or session protocol; the connection is
    /// closed.
    #[error("Protocol violation: {}", _0)]
    ProtocolViolation(String),

    /// The peer closed the TCP connection.
    #[error("Peer closed the connection")]
    PeerClosed,

    /// The peer sent a Reject control frame; the contained byte is the
    /// reject reason code.
    #[error("Peer rejected the transaction (reason code {})", _0)]
    Rejected(u8),

    /// The send was canceled because the session went down or the port was
    /// taken offline.
    #[error("Transaction canceled")]
    Canceled,

    /// The send was refused before anything was written to the wire;
    /// the session is unaffected.
    #[error("Send rejected: {}", _0)]
    SendRejected(SendRejectReason),

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    Usage(&'static str),

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    UsageDetailed(String),

    /// Error occured in thread synchronization.
    #[error("Error occured in thread synchronization")]
    Poison,

    /// Error occured in communication with the peer.
    #[error(transparent)]
    Io {
        /// The causing Error.
        #[from]
        source: std::io::Error,
    },
}

/// Abbreviation of `Result<T, SecsError>`.
pub type SecsResult<T> = std::result::Result<T, SecsError>;

/// Reason for refusing a send before it touches the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SendRejectReason {
    /// The message body exceeds `MaximumMesgBodySize`.
    TooLarge,
    /// The port's connection is not in the selected state.
    NotConnected,
    /// The pending-send table is at `MaximumSendQueueSize`.
    QueueFull,
}

impl std::fmt::Display for SendRejectReason {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            fmt,
            "{}",
            match self {
                Self::TooLarge => "message body too large",
                Self::NotConnected => "port is not selected",
                Self::QueueFull => "send queue is full",
            }
        )
    }
}

impl SecsError {
    /// Returns the contained [`SendRejectReason`], if any.
    pub fn send_reject_reason(&self) -> Option<SendRejectReason> {
        match self {
            Self::SendRejected(reason) => Some(*reason),
            _ => None,
        }
    }

    /// True if the error ends the individual transaction only and leaves the
    /// session usable.
    pub fn is_transaction_local(&self) -> bool {
        matches!(
            self,
            Self::ReplyTimeout | Self::Canceled | Self::SendRejected(_)
        )
    }

    pub(crate) fn protocol(detail: impl Into<String>) -> Self {
        Self::ProtocolViolation(detail.into())
    }
}

impl<G> From<std::sync::PoisonError<G>> for SecsError {
    fn from(_error: std::sync::PoisonError<G>) -> Self {
        Self::Poison
    }
}
