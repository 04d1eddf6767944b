//! Length-prefixed frames
//!
//! Each frame is an 8-byte big-endian length followed by that many bytes of
//! an encoded `ProtoPackage`.

use byteorder::{BigEndian, ByteOrder};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::Message;

use crate::error::{Error, Result};
use crate::proto::ProtoPackage;

/// Size of the length header
pub const HEADER_LEN: usize = 8;

/// Default upper bound on a frame body
pub const DEFAULT_MAX_FRAME_BYTES: u64 = 16 * 1024 * 1024;

/// Encode a package into a complete frame
pub fn encode_frame(package: &ProtoPackage, max_frame_bytes: u64) -> Result<Bytes> {
    let body_len = package.encoded_len();
    check_len(body_len as u64, max_frame_bytes)?;

    let mut header = [0u8; HEADER_LEN];
    BigEndian::write_u64(&mut header, body_len as u64);

    let mut buf = BytesMut::with_capacity(HEADER_LEN + body_len);
    buf.put_slice(&header);
    package.encode(&mut buf)?;
    Ok(buf.freeze())
}

/// Split the next complete frame body off the front of `buf`
///
/// Returns `Ok(None)` when more bytes are needed.
pub fn decode_frame(buf: &mut BytesMut, max_frame_bytes: u64) -> Result<Option<Bytes>> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }

    let body_len = BigEndian::read_u64(&buf[..HEADER_LEN]);
    check_len(body_len, max_frame_bytes)?;

    // Bounded by max_frame_bytes above, so the cast cannot truncate on 64-bit
    let body_len = body_len as usize;
    if buf.len() < HEADER_LEN + body_len {
        buf.reserve(HEADER_LEN + body_len - buf.len());
        return Ok(None);
    }

    buf.advance(HEADER_LEN);
    Ok(Some(buf.split_to(body_len).freeze()))
}

/// Decode a frame body into a package
pub fn decode_package(body: &[u8]) -> Result<ProtoPackage> {
    ProtoPackage::decode(body).map_err(|err| Error::decode("ProtoPackage", err))
}

fn check_len(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(Error::FrameTooLarge { size, limit });
    }
    Ok(())
}
