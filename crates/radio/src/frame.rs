//! Broadcast frame codec.
//!
//! Frame layout, multi-byte fields little-endian:
//!
//! ```text
//! [magic 0xF1][dst PAN: 2][addr mode: 1][dst addr: 2 | 8][src short: 2][payload]
//! ```
//!
//! Addressing mode `0x02` carries a short destination, `0x03` a long one.
//! Only frames for our PAN, addressed to broadcast and carrying at least a
//! full [`TrickleValue`] pass [`decode`].

use crate::error::FrameError;
use trickle_mesh::{TrickleValue, VALUE_WIDTH};

/// Leading byte of every Trickle frame.
pub const FRAME_MAGIC: u8 = 0xF1;

/// Short broadcast address.
pub const BROADCAST_SHORT: u16 = 0xFFFF;

const MODE_SHORT: u8 = 0x02;
const MODE_LONG: u8 = 0x03;

/// Magic, PAN and addressing mode.
const FIXED_HEADER_LEN: usize = 4;

/// Destination address of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameAddress {
    /// 16-bit short address
    Short(u16),
    /// 64-bit extended address
    Long([u8; 8]),
}

impl FrameAddress {
    /// Whether this is the short or long broadcast address
    pub fn is_broadcast(&self) -> bool {
        match self {
            FrameAddress::Short(addr) => *addr == BROADCAST_SHORT,
            FrameAddress::Long(addr) => addr.iter().all(|b| *b == 0xFF),
        }
    }

    fn mode(&self) -> u8 {
        match self {
            FrameAddress::Short(_) => MODE_SHORT,
            FrameAddress::Long(_) => MODE_LONG,
        }
    }
}

/// A frame that passed every filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundFrame {
    /// Short address of the sender
    pub src: u16,
    /// Disseminated value carried in the payload
    pub value: TrickleValue,
}

/// Encode an arbitrary frame.
pub fn encode(pan_id: u16, dst: FrameAddress, src: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FIXED_HEADER_LEN + 8 + 2 + payload.len());
    frame.push(FRAME_MAGIC);
    frame.extend_from_slice(&pan_id.to_le_bytes());
    frame.push(dst.mode());
    match dst {
        FrameAddress::Short(addr) => frame.extend_from_slice(&addr.to_le_bytes()),
        FrameAddress::Long(addr) => frame.extend_from_slice(&addr),
    }
    frame.extend_from_slice(&src.to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Encode `value` as a broadcast frame on `pan_id`.
pub fn encode_broadcast(pan_id: u16, src: u16, value: TrickleValue) -> Vec<u8> {
    encode(
        pan_id,
        FrameAddress::Short(BROADCAST_SHORT),
        src,
        &value.to_le_bytes(),
    )
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

/// Parse and filter a frame received on `pan_id`.
pub fn decode(buf: &[u8], pan_id: u16) -> Result<InboundFrame, FrameError> {
    let truncated = || FrameError::Truncated { len: buf.len() };

    let magic = *buf.first().ok_or_else(truncated)?;
    if magic != FRAME_MAGIC {
        return Err(FrameError::BadMagic(magic));
    }
    if buf.len() < FIXED_HEADER_LEN {
        return Err(truncated());
    }

    let addr_len = match buf[3] {
        MODE_SHORT => 2,
        MODE_LONG => 8,
        other => return Err(FrameError::UnknownAddressMode(other)),
    };
    let src_at = FIXED_HEADER_LEN + addr_len;
    let payload_at = src_at + 2;
    if buf.len() < payload_at {
        return Err(truncated());
    }

    let actual = read_u16(buf, 1);
    if actual != pan_id {
        return Err(FrameError::PanMismatch {
            expected: pan_id,
            actual,
        });
    }

    let dst = if addr_len == 2 {
        FrameAddress::Short(read_u16(buf, FIXED_HEADER_LEN))
    } else {
        let mut addr = [0u8; 8];
        addr.copy_from_slice(&buf[FIXED_HEADER_LEN..src_at]);
        FrameAddress::Long(addr)
    };
    if !dst.is_broadcast() {
        return Err(FrameError::NotBroadcast);
    }

    let payload = &buf[payload_at..];
    if payload.len() < VALUE_WIDTH {
        return Err(FrameError::ShortPayload { len: payload.len() });
    }
    let mut value = [0u8; VALUE_WIDTH];
    value.copy_from_slice(&payload[..VALUE_WIDTH]);

    Ok(InboundFrame {
        src: read_u16(buf, src_at),
        value: TrickleValue::from_le_bytes(value),
    })
}
