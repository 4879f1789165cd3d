use crate::{
    protocol::{MessageHeader, SessionType},
    SecsError, SecsResult,
};
use byteorder::{BigEndian, ByteOrder};
use std::time::Instant;

pub(crate) const HEADER_LEN: usize = 10;
const LENGTH_PREFIX_LEN: usize = 4;

/// Assembles one frame (`u32_be length || header || payload`) into a single
/// contiguous buffer so it reaches the socket in one write.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn assemble_frame(header: &MessageHeader, body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + HEADER_LEN + body.len());
    let mut prefix = [0_u8; LENGTH_PREFIX_LEN];
    BigEndian::write_u32(&mut prefix, (HEADER_LEN + body.len()) as u32);
    frame.extend_from_slice(&prefix);
    let mut header_bytes = [0_u8; HEADER_LEN];
    header.encode_into(&mut header_bytes);
    frame.extend_from_slice(&header_bytes);
    frame.extend_from_slice(body);
    frame
}

/// Sliding buffer over the inbound byte stream.
///
/// Bytes are appended as they arrive; complete frames are taken off the
/// front. The age of an incomplete frame drives the T8 inter-character
/// timeout.
#[derive(Debug)]
pub(crate) struct FrameBuffer {
    buf: Vec<u8>,
    start: usize,
    partial_since: Option<Instant>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(16 * 1024),
            start: 0,
            partial_since: None,
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if self.available() == 0 {
            self.partial_since = Some(Instant::now());
        }
        self.buf.extend_from_slice(bytes);
    }

    /// How long the oldest incomplete frame has been waiting, if any bytes
    /// of one are present.
    pub fn partial_since(&self) -> Option<Instant> {
        if self.available() == 0 {
            None
        } else {
            self.partial_since
        }
    }

    fn available(&self) -> usize {
        self.buf.len() - self.start
    }

    /// Takes the next complete frame off the buffer.
    ///
    /// Returns `Ok(None)` while the frame is still incomplete. A declared
    /// length outside `[10, max_body + 10]`, or a payload on a control
    /// frame, is a protocol violation.
    pub fn try_take_frame(
        &mut self,
        max_body: usize,
    ) -> SecsResult<Option<(MessageHeader, Vec<u8>)>> {
        if self.available() < LENGTH_PREFIX_LEN {
            return Ok(None);
        }
        let length = BigEndian::read_u32(&self.buf[self.start..self.start + LENGTH_PREFIX_LEN])
            as usize;
        if !(HEADER_LEN..=max_body + HEADER_LEN).contains(&length) {
            return Err(SecsError::protocol(format!(
                "frame length {length} outside [{HEADER_LEN}, {}]",
                max_body + HEADER_LEN
            )));
        }
        if self.available() < LENGTH_PREFIX_LEN + length {
            return Ok(None);
        }

        let header_start = self.start + LENGTH_PREFIX_LEN;
        let mut header_bytes = [0_u8; HEADER_LEN];
        header_bytes.copy_from_slice(&self.buf[header_start..header_start + HEADER_LEN]);
        let header = MessageHeader::decode_from(&header_bytes)?;
        let body =
            self.buf[header_start + HEADER_LEN..header_start + length].to_vec();
        self.start += LENGTH_PREFIX_LEN + length;

        if header.s_type != SessionType::DataMessage && !body.is_empty() {
            return Err(SecsError::protocol(format!(
                "{} frame with a {}-byte payload",
                header.s_type,
                body.len()
            )));
        }

        // restart the T8 clock for whatever follows
        self.partial_since = if self.available() == 0 {
            None
        } else {
            Some(Instant::now())
        };
        self.compact();
        Ok(Some((header, body)))
    }

    fn compact(&mut self) {
        if self.start > 64 * 1024 || self.start == self.buf.len() {
            self.buf.drain(..self.start);
            self.start = 0;
        }
    }
}

#[cfg(test)]
mod test {
    use super::{assemble_frame, FrameBuffer};
    use crate::protocol::{MessageHeader, SessionType, StreamFunction};
    use crate::SecsError;

    fn data_header() -> MessageHeader {
        MessageHeader::for_data(StreamFunction::new(1, 13, true), 0xFFFF, 42)
    }

    #[test]
    fn frame_layout() {
        let frame = assemble_frame(&data_header(), &[0x01, 0x00]);
        assert_eq!(frame.len(), 16);
        assert_eq!(&frame[..4], &[0, 0, 0, 12]);
        assert_eq!(&frame[14..], &[0x01, 0x00]);
    }

    #[test]
    fn reassembles_frames_from_arbitrary_chunks() {
        let mut wire = assemble_frame(&data_header(), &[0x01, 0x00]);
        wire.extend_from_slice(&assemble_frame(&MessageHeader::linktest_req(7), &[]));

        let mut buffer = FrameBuffer::new();
        for chunk in wire.chunks(3) {
            buffer.extend(chunk);
        }

        let (header, body) = buffer.try_take_frame(1024).unwrap().unwrap();
        assert_eq!(header.sf(), StreamFunction::new(1, 13, true));
        assert_eq!(body, vec![0x01, 0x00]);

        let (header, body) = buffer.try_take_frame(1024).unwrap().unwrap();
        assert_eq!(header.s_type, SessionType::LinktestReq);
        assert!(body.is_empty());

        assert!(buffer.try_take_frame(1024).unwrap().is_none());
        assert!(buffer.partial_since().is_none());
    }

    #[test]
    fn partial_frame_reports_its_age() {
        let wire = assemble_frame(&data_header(), &[0xAA; 20]);
        let mut buffer = FrameBuffer::new();
        buffer.extend(&wire[..10]);
        assert!(buffer.try_take_frame(1024).unwrap().is_none());
        assert!(buffer.partial_since().is_some());
        buffer.extend(&wire[10..]);
        assert!(buffer.try_take_frame(1024).unwrap().is_some());
        assert!(buffer.partial_since().is_none());
    }

    #[test]
    fn undersized_length_is_a_protocol_violation() {
        let mut buffer = FrameBuffer::new();
        buffer.extend(&[0, 0, 0, 9]);
        assert!(matches!(
            buffer.try_take_frame(1024),
            Err(SecsError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn oversized_length_is_a_protocol_violation() {
        let mut buffer = FrameBuffer::new();
        buffer.extend(&[0, 1, 0, 0]);
        assert!(matches!(
            buffer.try_take_frame(1024),
            Err(SecsError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn control_frame_with_payload_is_a_protocol_violation() {
        let frame = assemble_frame(&MessageHeader::linktest_req(1), &[0x55]);
        let mut buffer = FrameBuffer::new();
        buffer.extend(&frame);
        assert!(matches!(
            buffer.try_take_frame(1024),
            Err(SecsError::ProtocolViolation(_))
        ));
    }
}
