use bytes::Bytes;
use framelink_frame::{
    build_raw_message, parse_raw_message_with_limit, FrameError, MessageEncoder, RawMessage,
    DEFAULT_MAX_PAYLOAD,
};

use crate::error::{BoxError, ConnectionError, Result};

/// Builds outgoing messages and parses inbound reads.
///
/// `parse` receives exactly the bytes of one socket read, which may be a
/// partial logical frame. Reassembly, if the protocol needs it, belongs to
/// the codec. Errors from `parse` reach the caller of `pop_message`
/// unchanged, so implementations pick the [`ConnectionError`] variant.
pub trait MessageCodec: Send + Sync + 'static {
    /// Decoded message type handed to the consumer.
    type Message: Send;

    /// Encode `payload` into one wire message.
    fn build<P>(&self, success: bool, opcode: u32, payload: &P) -> std::result::Result<Bytes, BoxError>
    where
        P: MessageEncoder + ?Sized;

    /// Decode the bytes of one read.
    fn parse(&self, bytes: Bytes) -> Result<Self::Message>;
}

/// Codec for the `framelink-frame` wire format.
#[derive(Debug, Clone, Copy)]
pub struct RawCodec {
    max_payload: usize,
}

impl RawCodec {
    pub fn new() -> Self {
        Self {
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Reject inbound payloads declaring more than `max_payload` bytes.
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }
}

impl Default for RawCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCodec for RawCodec {
    type Message = RawMessage;

    fn build<P>(&self, success: bool, opcode: u32, payload: &P) -> std::result::Result<Bytes, BoxError>
    where
        P: MessageEncoder + ?Sized,
    {
        build_raw_message(success, opcode, payload).map_err(Into::into)
    }

    fn parse(&self, bytes: Bytes) -> Result<RawMessage> {
        parse_raw_message_with_limit(&bytes, self.max_payload).map_err(frame_to_connection_error)
    }
}

/// Codec that builds reference-format messages but hands inbound reads to
/// the consumer untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCodec;

impl MessageCodec for PassthroughCodec {
    type Message = Bytes;

    fn build<P>(&self, success: bool, opcode: u32, payload: &P) -> std::result::Result<Bytes, BoxError>
    where
        P: MessageEncoder + ?Sized,
    {
        build_raw_message(success, opcode, payload).map_err(Into::into)
    }

    fn parse(&self, bytes: Bytes) -> Result<Bytes> {
        Ok(bytes)
    }
}

fn frame_to_connection_error(err: FrameError) -> ConnectionError {
    match err {
        FrameError::MessageTooShort { len, needed } => {
            ConnectionError::MessageTooShort { len, needed }
        }
        other => ConnectionError::Decode(Box::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use framelink_frame::HEADER_SIZE;

    use super::*;

    #[test]
    fn raw_codec_roundtrip() {
        let codec = RawCodec::new();
        let wire = codec.build(true, 3, "hello").unwrap();
        let msg = codec.parse(wire).unwrap();
        assert_eq!(msg, RawMessage::new(true, 3, "hello"));
    }

    #[test]
    fn raw_codec_short_read_is_message_too_short() {
        let err = RawCodec::new()
            .parse(Bytes::from_static(&[0x01, 0x02]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::MessageTooShort { len: 2, needed: HEADER_SIZE }
        ));
    }

    #[test]
    fn raw_codec_other_failures_are_decode_errors() {
        let mut wire = RawCodec::new().build(true, 3, "hello").unwrap().to_vec();
        wire[0] = 0x09;
        let err = RawCodec::new().parse(Bytes::from(wire)).unwrap_err();
        assert!(matches!(err, ConnectionError::Decode(_)));
        assert_eq!(err.to_string(), "invalid success flag 0x09");
    }

    #[test]
    fn raw_codec_payload_limit() {
        let codec = RawCodec::new().with_max_payload(4);
        let wire = codec.build(false, 1, "too long").unwrap();
        assert!(matches!(
            codec.parse(wire),
            Err(ConnectionError::Decode(_))
        ));
    }

    #[test]
    fn passthrough_returns_read_bytes() {
        let bytes = Bytes::from_static(b"\x00partial");
        assert_eq!(PassthroughCodec.parse(bytes.clone()).unwrap(), bytes);
    }
}
