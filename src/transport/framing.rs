//! Receive-side line framing.
//!
//! Incoming bytes are split into lines terminated by `\r` or `\0`; `\n` is discarded.
//! Only the most recently completed line is kept: a new line overwrites one that was never taken.

use heapless::Vec;

pub struct LineFramer<const CAP: usize> {
    pending: Vec<u8, CAP>,
    pending_overflowed: bool,
    completed: Vec<u8, CAP>,
    ready: bool,
    dropped: u32,
}

impl<const CAP: usize> LineFramer<CAP> {
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
            pending_overflowed: false,
            completed: Vec::new(),
            ready: false,
            dropped: 0,
        }
    }

    /// Scan a received chunk.
    ///
    /// Bytes that do not fit into the line accumulator are dropped, and counted in `dropped_bytes`.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match byte {
                b'\n' => continue,
                b'\r' | b'\0' => self.complete_line(),
                _ => {
                    if self.pending.push(byte).is_err() {
                        self.pending_overflowed = true;
                        self.dropped = self.dropped.wrapping_add(1);
                    }
                }
            }
        }
    }

    fn complete_line(&mut self) {
        if self.pending_overflowed {
            warn!("Received line exceeded {} bytes, delivering it truncated", CAP);
            self.pending_overflowed = false;
        }
        self.completed.clone_from(&self.pending);
        self.ready = true;
        self.pending.clear();
    }

    /// Take the last completed line, if it has not been taken yet.
    pub fn take_line(&mut self) -> Option<Vec<u8, CAP>> {
        if !self.ready {
            return None;
        }
        self.ready = false;
        Some(core::mem::take(&mut self.completed))
    }

    /// Bytes currently accumulated for the next line.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Total number of bytes dropped because a line exceeded the accumulator's capacity.
    pub fn dropped_bytes(&self) -> u32 {
        self.dropped
    }

    /// Forget all partial and completed lines (on bus reset).
    pub fn reset(&mut self) {
        self.pending.clear();
        self.pending_overflowed = false;
        self.completed.clear();
        self.ready = false;
    }
}

impl<const CAP: usize> Default for LineFramer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line<const CAP: usize>(framer: &mut LineFramer<CAP>) -> Option<std::vec::Vec<u8>> {
        framer.take_line().map(|l| l.to_vec())
    }

    #[test]
    fn carriage_return_completes_line() {
        let mut framer = LineFramer::<256>::new();
        framer.feed(b"AB\r");
        assert_eq!(framer.pending(), b"");
        assert_eq!(line(&mut framer), Some(b"AB".to_vec()));
        assert_eq!(line(&mut framer), None);
    }

    #[test]
    fn newline_is_discarded() {
        let mut framer = LineFramer::<256>::new();
        framer.feed(b"A\nB\r");
        assert_eq!(line(&mut framer), Some(b"AB".to_vec()));
    }

    #[test]
    fn nul_completes_line() {
        let mut framer = LineFramer::<256>::new();
        framer.feed(b"hello\0");
        assert_eq!(line(&mut framer), Some(b"hello".to_vec()));
    }

    #[test]
    fn line_may_span_chunks() {
        let mut framer = LineFramer::<256>::new();
        framer.feed(b"sta");
        assert_eq!(line(&mut framer), None);
        assert_eq!(framer.pending(), b"sta");
        framer.feed(b"rt\r\n");
        assert_eq!(line(&mut framer), Some(b"start".to_vec()));
        assert_eq!(framer.pending(), b"");
    }

    #[test]
    fn unread_line_is_overwritten() {
        let mut framer = LineFramer::<256>::new();
        framer.feed(b"first\rsecond\r");
        assert_eq!(line(&mut framer), Some(b"second".to_vec()));
        assert_eq!(line(&mut framer), None);
    }

    #[test]
    fn overflow_is_truncated_and_counted() {
        let mut framer = LineFramer::<4>::new();
        framer.feed(b"abcdefg\r");
        assert_eq!(line(&mut framer), Some(b"abcd".to_vec()));
        assert_eq!(framer.dropped_bytes(), 3);

        framer.feed(b"xy\r");
        assert_eq!(line(&mut framer), Some(b"xy".to_vec()));
        assert_eq!(framer.dropped_bytes(), 3);
    }

    #[test]
    fn reset_discards_everything() {
        let mut framer = LineFramer::<256>::new();
        framer.feed(b"done\rpart");
        framer.reset();
        assert_eq!(line(&mut framer), None);
        assert_eq!(framer.pending(), b"");
    }
}
