use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;

use crate::error::Result;

/// A payload that can be written into an outgoing message.
///
/// Encoding may fail (for example a JSON payload whose `Serialize` impl
/// errors); the failure aborts the message before anything reaches the socket.
pub trait MessageEncoder {
    /// Append the encoded payload to `dst`.
    fn encode(&self, dst: &mut BytesMut) -> Result<()>;
}

impl MessageEncoder for [u8] {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_slice(self);
        Ok(())
    }
}

impl<const N: usize> MessageEncoder for [u8; N] {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_slice(self);
        Ok(())
    }
}

impl MessageEncoder for Vec<u8> {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_slice(self);
        Ok(())
    }
}

impl MessageEncoder for Bytes {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_slice(self);
        Ok(())
    }
}

impl MessageEncoder for str {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        dst.put_slice(self.as_bytes());
        Ok(())
    }
}

impl MessageEncoder for String {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        self.as_str().encode(dst)
    }
}

/// Empty payload.
impl MessageEncoder for () {
    fn encode(&self, _dst: &mut BytesMut) -> Result<()> {
        Ok(())
    }
}

impl<T: MessageEncoder + ?Sized> MessageEncoder for &T {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        (**self).encode(dst)
    }
}

/// JSON-encoded payload.
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> MessageEncoder for Json<T> {
    fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        serde_json::to_writer(dst.writer(), &self.0)?;
        Ok(())
    }
}
