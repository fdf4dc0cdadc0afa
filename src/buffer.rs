//! A small growable byte accumulator used by the Line Reader to fold
//! backslash-continued segments into one logical line.
//!
//! This mirrors the shape of a fixed-size ring buffer used for
//! framed I/O (accumulate, scan for a terminator, shift the unread
//! remainder down to offset 0) but backs onto a `Vec<u8>` instead of a
//! fixed-size slice, since a logical line has no fixed upper bound
//! known ahead of time (it is only capped, not preallocated, at
//! [`crate::limits::MAX_LOGICAL_LINE`]).

pub struct LineBuffer {
    inner: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer { inner: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.inner.extend_from_slice(data);
    }

    /// Removes the trailing byte if it equals `b`. Used to strip a
    /// continuation backslash or a CR immediately before an LF.
    pub fn strip_trailing(&mut self, b: u8) -> bool {
        if self.inner.last() == Some(&b) {
            self.inner.pop();
            true
        } else {
            false
        }
    }

    /// Drains the accumulated bytes as a `String`, resetting the
    /// buffer to empty. Invalid UTF-8 bytes are replaced, matching
    /// the reference parser's byte-oriented-but-effectively-ASCII
    /// handling of `udiprops` text.
    pub fn take(&mut self) -> String {
        let bytes = std::mem::take(&mut self.inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::LineBuffer;

    #[test]
    fn extend_accumulates() {
        let mut buf = LineBuffer::new();
        buf.extend(b"hello");
        buf.extend(b" world");
        assert_eq!(buf.len(), 11);
        assert_eq!(buf.take(), "hello world");
        assert!(buf.is_empty());
    }

    #[test]
    fn strip_trailing_only_removes_match() {
        let mut buf = LineBuffer::new();
        buf.extend(b"abc\\");
        assert!(buf.strip_trailing(b'\\'));
        assert_eq!(buf.take(), "abc");

        let mut buf = LineBuffer::new();
        buf.extend(b"abc");
        assert!(!buf.strip_trailing(b'\\'));
        assert_eq!(buf.take(), "abc");
    }

    #[test]
    fn take_resets_buffer() {
        let mut buf = LineBuffer::new();
        buf.extend(b"x");
        let _ = buf.take();
        assert!(buf.is_empty());
        buf.extend(b"y");
        assert_eq!(buf.take(), "y");
    }
}
