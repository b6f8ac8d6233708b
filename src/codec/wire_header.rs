//! Private wire header carried inside every Ethernet payload.
//!
//! Layout (6 bytes):
//! `version u8 | zero u8 | length_be u16 | magic_be u16`
//!
//! `length` covers the header itself plus the message content, which lets a
//! receiver strip the padding the link layer adds to short frames.

use thiserror::Error;

/// Size of the wire header in bytes.
pub const WIRE_HEADER_SIZE: usize = 6;

/// The only header version this implementation speaks.
pub const CURRENT_VERSION: u8 = 0;

/// Fixed magic value identifying the protocol.
pub const MAGIC: u16 = 0xfc00;

/// Decoded wire header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    pub version: u8,
    pub zero: u8,
    /// Content length plus [`WIRE_HEADER_SIZE`]
    pub length: u16,
    pub magic: u16,
}

/// Why an inbound frame was dropped.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    #[error("runt ({len} bytes)")]
    Runt { len: usize },

    #[error("unknown version {0}")]
    UnknownVersion(u8),

    #[error("size field is larger than frame ({declared} > {available})")]
    SizeFieldTooLarge { declared: usize, available: usize },

    #[error("bad magic {0:#06x}")]
    BadMagic(u16),
}

/// A frame payload that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded<'a> {
    pub header: WireHeader,
    /// Message content, already cut to the declared length
    pub content: &'a [u8],
    /// Trailing bytes discarded as link-layer padding
    pub padding: usize,
}

impl WireHeader {
    /// Header for a message carrying `content_len` bytes.
    ///
    /// Callers bound `content_len` by the maximum packet size, well inside
    /// the 16-bit length field.
    pub fn for_content(content_len: usize) -> Self {
        Self {
            version: CURRENT_VERSION,
            zero: 0,
            length: (content_len + WIRE_HEADER_SIZE) as u16,
            magic: MAGIC,
        }
    }

    /// Read the raw header fields without validating them.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < WIRE_HEADER_SIZE {
            return None;
        }
        Some(Self {
            version: data[0],
            zero: data[1],
            length: u16::from_be_bytes([data[2], data[3]]),
            magic: u16::from_be_bytes([data[4], data[5]]),
        })
    }

    pub fn to_bytes(&self) -> [u8; WIRE_HEADER_SIZE] {
        let length = self.length.to_be_bytes();
        let magic = self.magic.to_be_bytes();
        [self.version, self.zero, length[0], length[1], magic[0], magic[1]]
    }

    /// Validate an Ethernet payload and locate the message content.
    ///
    /// Checks run in a fixed order: size, version, length field, magic. A
    /// length field shorter than the payload is not an error; the excess is
    /// treated as padding.
    pub fn decode(payload: &[u8]) -> Result<Decoded<'_>, DropReason> {
        let header = Self::parse(payload).ok_or(DropReason::Runt { len: payload.len() })?;

        if header.version != CURRENT_VERSION {
            return Err(DropReason::UnknownVersion(header.version));
        }

        let available = &payload[WIRE_HEADER_SIZE..];
        let declared = header.length.wrapping_sub(WIRE_HEADER_SIZE as u16) as usize;
        if declared > available.len() {
            return Err(DropReason::SizeFieldTooLarge {
                declared,
                available: available.len(),
            });
        }

        if header.magic != MAGIC {
            return Err(DropReason::BadMagic(header.magic));
        }

        Ok(Decoded {
            header,
            content: &available[..declared],
            padding: available.len() - declared,
        })
    }
}
