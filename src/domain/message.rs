//! Bounds-checked message buffer with headroom.

use crate::error::MessageError;

/// A message occupying a window of a borrowed region.
///
/// Bytes in front of the window are headroom that headers can be pushed
/// into; popping moves the front of the window forward again.
#[derive(Debug)]
pub struct Message<'a> {
    region: &'a mut [u8],
    start: usize,
    end: usize,
}

impl<'a> Message<'a> {
    /// Wrap a region, reserving `headroom` bytes at the front. The rest of the
    /// region is the message content.
    pub fn new(region: &'a mut [u8], headroom: usize) -> Result<Self, MessageError> {
        if headroom > region.len() {
            return Err(MessageError::Headroom {
                needed: headroom,
                available: region.len(),
            });
        }
        let end = region.len();
        Ok(Self {
            region,
            start: headroom,
            end,
        })
    }

    /// Wrap a region the caller sized as `headroom` plus content.
    pub(crate) fn from_region(region: &'a mut [u8], headroom: usize) -> Self {
        let start = headroom.min(region.len());
        let end = region.len();
        Self { region, start, end }
    }

    /// Content length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Bytes available for [`push`](Self::push).
    pub fn headroom(&self) -> usize {
        self.start
    }

    pub fn bytes(&self) -> &[u8] {
        &self.region[self.start..self.end]
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.region[self.start..self.end]
    }

    /// Prepend `data` to the message.
    pub fn push(&mut self, data: &[u8]) -> Result<(), MessageError> {
        if data.len() > self.start {
            return Err(MessageError::Headroom {
                needed: data.len(),
                available: self.start,
            });
        }
        self.start -= data.len();
        self.region[self.start..self.start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Remove `out.len()` bytes from the front of the message into `out`.
    pub fn pop(&mut self, out: &mut [u8]) -> Result<(), MessageError> {
        let data = self.peek(out.len())?;
        out.copy_from_slice(data);
        self.start += out.len();
        Ok(())
    }

    /// Borrow the first `len` bytes without removing them.
    pub fn peek(&self, len: usize) -> Result<&[u8], MessageError> {
        if len > self.len() {
            return Err(MessageError::Underflow {
                needed: len,
                available: self.len(),
            });
        }
        Ok(&self.region[self.start..self.start + len])
    }

    /// Shorten the message to `len` bytes, discarding the tail.
    pub fn truncate(&mut self, len: usize) -> Result<(), MessageError> {
        if len > self.len() {
            return Err(MessageError::Truncate {
                len: self.len(),
                requested: len,
            });
        }
        self.end = self.start + len;
        Ok(())
    }

    /// Whether the first content byte sits on an `align`-byte boundary.
    pub fn is_aligned(&self, align: usize) -> bool {
        (self.bytes().as_ptr() as usize) % align == 0
    }
}
