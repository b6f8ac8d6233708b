//! Per-frame scratch arena.
//!
//! Each captured frame is decoded into a region handed out by an
//! [`ArenaScope`]. Dropping the scope releases every region allocated inside
//! it, so peak usage stays at one frame's worth no matter how many frames a
//! single kernel read carries.

use std::mem;
use std::slice;

use super::Message;

const WORD: usize = mem::size_of::<u64>();

/// Word-aligned bump allocator that is reset scope by scope.
#[derive(Debug, Default)]
pub struct ScratchArena {
    storage: Vec<u64>,
    used: usize,
    high_water: usize,
}

impl ScratchArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with `bytes` of storage already reserved.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            storage: vec![0; bytes.div_ceil(WORD)],
            used: 0,
            high_water: 0,
        }
    }

    /// Open a scope. Everything allocated through it is released when it is
    /// dropped.
    pub fn scope(&mut self) -> ArenaScope<'_> {
        let mark = self.used;
        ArenaScope { arena: self, mark }
    }

    /// Bytes currently allocated.
    pub fn in_use(&self) -> usize {
        self.used
    }

    /// Largest number of bytes ever allocated at once.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    pub fn capacity(&self) -> usize {
        self.storage.len() * WORD
    }

    fn alloc(&mut self, size: usize) -> &mut [u8] {
        let first = self.used / WORD;
        let words = size.div_ceil(WORD);
        if first + words > self.storage.len() {
            self.storage.resize(first + words, 0);
        }
        self.used += words * WORD;
        self.high_water = self.high_water.max(self.used);

        let region = &mut self.storage[first..first + words];
        // SAFETY: every bit pattern is a valid u8, u8 has alignment 1, and the
        // byte view covers exactly the words borrowed from `storage`.
        let bytes =
            unsafe { slice::from_raw_parts_mut(region.as_mut_ptr().cast::<u8>(), words * WORD) };
        &mut bytes[..size]
    }
}

/// An open allocation scope on a [`ScratchArena`].
#[derive(Debug)]
pub struct ArenaScope<'a> {
    arena: &'a mut ScratchArena,
    mark: usize,
}

impl ArenaScope<'_> {
    /// Allocate a message with `headroom` spare bytes in front of `len` bytes
    /// of content. The content start is word-aligned when `headroom` is.
    pub fn message(&mut self, headroom: usize, len: usize) -> Message<'_> {
        let region = self.arena.alloc(headroom + len);
        Message::from_region(region, headroom)
    }

    /// Allocate a message holding a copy of `content`.
    pub fn message_from(&mut self, headroom: usize, content: &[u8]) -> Message<'_> {
        let mut msg = self.message(headroom, content.len());
        msg.bytes_mut().copy_from_slice(content);
        msg
    }
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        self.arena.used = self.mark;
    }
}
