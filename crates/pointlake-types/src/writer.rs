//! Bounded, truncation-aware writes into caller-supplied buffers.
//!
//! The driver never reports an error for a too-small text buffer. It copies
//! what fits, terminates the copy, and reports the full logical length so
//! the caller can detect truncation by comparing the reported length against
//! the buffer capacity.

/// Outcome of a bounded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedWrite {
    /// Bytes actually copied into the buffer, excluding the terminator.
    pub bytes_written: usize,
    /// Logical length of the full value, regardless of how much fit.
    pub length: usize,
}

impl BoundedWrite {
    /// Whether the value was cut short by the buffer capacity.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.length > self.bytes_written
    }
}

/// Copy `text` into `buffer`, reserving one byte for a NUL terminator.
///
/// At most `buffer.len() - 1` bytes are copied; the byte after the copy is
/// set to zero. An empty buffer receives nothing. The returned
/// [`BoundedWrite::length`] is always the untruncated byte length of `text`.
pub fn write_text(buffer: &mut [u8], text: &str) -> BoundedWrite {
    let bytes = text.as_bytes();
    if buffer.is_empty() {
        return BoundedWrite {
            bytes_written: 0,
            length: bytes.len(),
        };
    }
    let copy_len = bytes.len().min(buffer.len() - 1);
    buffer[..copy_len].copy_from_slice(&bytes[..copy_len]);
    buffer[copy_len] = 0;
    BoundedWrite {
        bytes_written: copy_len,
        length: bytes.len(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn value_that_fits_is_copied_whole() {
        let mut buf = [0xAAu8; 8];
        let w = write_text(&mut buf, "abc");
        assert_eq!(w.bytes_written, 3);
        assert_eq!(w.length, 3);
        assert!(!w.is_truncated());
        assert_eq!(&buf[..4], b"abc\0");
    }

    #[test]
    fn truncation_reports_full_length() {
        let mut buf = [0u8; 4];
        let w = write_text(&mut buf, "marshal");
        assert_eq!(w.bytes_written, 3);
        assert_eq!(w.length, 7);
        assert!(w.is_truncated());
        assert_eq!(&buf, b"mar\0");
    }

    #[test]
    fn exact_fit_still_leaves_room_for_terminator() {
        let mut buf = [0u8; 4];
        let w = write_text(&mut buf, "abcd");
        assert_eq!(w.bytes_written, 3);
        assert!(w.is_truncated());
    }

    #[test]
    fn empty_buffer_writes_nothing() {
        let mut buf = [0u8; 0];
        let w = write_text(&mut buf, "abc");
        assert_eq!(w.bytes_written, 0);
        assert_eq!(w.length, 3);
    }

    proptest! {
        #[test]
        fn never_overruns_and_always_terminates(
            text in ".{0,64}",
            cap in 0usize..32,
        ) {
            let mut buf = vec![0xAAu8; cap];
            let w = write_text(&mut buf, &text);
            prop_assert!(w.bytes_written <= cap.saturating_sub(1));
            prop_assert_eq!(w.length, text.len());
            if cap > 0 {
                prop_assert_eq!(buf[w.bytes_written], 0);
            }
        }
    }
}
