use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::encoder::MessageEncoder;
use crate::error::{FrameError, Result};

/// Message header: success (1) + opcode (4) + length (4) = 9 bytes.
pub const HEADER_SIZE: usize = 9;

/// Default maximum payload size accepted by [`parse_raw_message`]: 1 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024;

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Whether the sender reports the operation as successful.
    pub success: bool,
    /// Operation code.
    pub opcode: u32,
    /// Message payload.
    pub payload: Bytes,
}

impl RawMessage {
    /// Create a new message.
    pub fn new(success: bool, opcode: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            success,
            opcode,
            payload: payload.into(),
        }
    }

    /// The total wire size of this message (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Build a message into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────────┬────────────┬────────────┬─────────────────┐
/// │ Success(1B) │ Opcode     │ Length     │ Payload         │
/// │ 0x00 | 0x01 │ (4B LE)    │ (4B LE)    │ (Length bytes)  │
/// └─────────────┴────────────┴────────────┴─────────────────┘
/// ```
pub fn build_raw_message<P>(success: bool, opcode: u32, payload: &P) -> Result<Bytes>
where
    P: MessageEncoder + ?Sized,
{
    let mut body = BytesMut::new();
    payload.encode(&mut body)?;

    if body.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: body.len(),
            max: u32::MAX as usize,
        });
    }

    let mut dst = BytesMut::with_capacity(HEADER_SIZE + body.len());
    dst.put_u8(u8::from(success));
    dst.put_u32_le(opcode);
    dst.put_u32_le(body.len() as u32);
    dst.put_slice(&body);
    Ok(dst.freeze())
}

/// Parse one complete message using [`DEFAULT_MAX_PAYLOAD`].
pub fn parse_raw_message(src: &[u8]) -> Result<RawMessage> {
    parse_raw_message_with_limit(src, DEFAULT_MAX_PAYLOAD)
}

/// Parse one complete message.
///
/// `src` must hold exactly one message: short input is
/// [`FrameError::MessageTooShort`], extra input is [`FrameError::TrailingBytes`].
pub fn parse_raw_message_with_limit(src: &[u8], max_payload: usize) -> Result<RawMessage> {
    if src.len() < HEADER_SIZE {
        return Err(FrameError::MessageTooShort {
            len: src.len(),
            needed: HEADER_SIZE,
        });
    }

    let mut header = &src[..HEADER_SIZE];
    let success = match header.get_u8() {
        0 => false,
        1 => true,
        other => return Err(FrameError::InvalidSuccessFlag(other)),
    };
    let opcode = header.get_u32_le();
    let payload_len = header.get_u32_le() as usize;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Err(FrameError::MessageTooShort {
            len: src.len(),
            needed: total,
        });
    }
    if src.len() > total {
        return Err(FrameError::TrailingBytes(src.len() - total));
    }

    Ok(RawMessage {
        success,
        opcode,
        payload: Bytes::copy_from_slice(&src[HEADER_SIZE..]),
    })
}
